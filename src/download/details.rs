//! Post detail fetching in bounded concurrent chunks.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::api::retry::RetryPolicy;
use crate::api::{AtprotoApi, PostView};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::media::extract_media;
use crate::post::{AuthorSummary, EnrichedPost, PostReference};

/// Result of a detail fetch, with what was dropped along the way.
#[derive(Debug, Default)]
pub struct DetailReport {
    pub posts: Vec<EnrichedPost>,
    /// References whose post no longer exists.
    pub missing: Vec<String>,
    /// References in chunks that could not be fetched.
    pub failed: Vec<String>,
}

/// Fetch post views for `references` and join them back.
///
/// See [`fetch_post_details_report`].
pub async fn fetch_post_details(
    api: &dyn AtprotoApi,
    config: &Config,
    references: &[PostReference],
) -> Vec<EnrichedPost> {
    fetch_post_details_report(api, config, references).await.posts
}

/// Fetch post views for `references` in chunks of `posts_chunk_size`.
///
/// Up to `threads` chunks are in flight at once; output keeps input order.
/// A chunk that exhausts its retries is logged and skipped. Posts absent from
/// the response were deleted and are dropped with an info line.
pub async fn fetch_post_details_report(
    api: &dyn AtprotoApi,
    config: &Config,
    references: &[PostReference],
) -> DetailReport {
    let mut report = DetailReport::default();
    if references.is_empty() {
        return report;
    }

    let policy = config.retry_policy();
    let chunk_size = config.network.posts_chunk_size.max(1);
    let workers = config.options.threads.max(1);

    let outcomes: Vec<ChunkOutcome> = stream::iter(references.chunks(chunk_size))
        .map(|chunk| fetch_chunk(api, &policy, chunk))
        .buffered(workers)
        .collect()
        .await;

    for outcome in outcomes {
        report.posts.extend(outcome.posts);
        report.missing.extend(outcome.missing);
        report.failed.extend(outcome.failed);
    }

    tracing::debug!(
        "Fetched details for {} of {} references ({} missing, {} failed)",
        report.posts.len(),
        references.len(),
        report.missing.len(),
        report.failed.len()
    );

    report
}

#[derive(Default)]
struct ChunkOutcome {
    posts: Vec<EnrichedPost>,
    missing: Vec<String>,
    failed: Vec<String>,
}

async fn fetch_chunk(
    api: &dyn AtprotoApi,
    policy: &RetryPolicy,
    chunk: &[PostReference],
) -> ChunkOutcome {
    let uris: Vec<String> = chunk.iter().map(|r| r.poster_post_uri.clone()).collect();
    let context = format!("posts [{}]", uris.join(", "));

    let response = match policy.run(&context, || api.get_posts(&uris)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                "Skipping {} post(s) after failed lookup [{}]: {}",
                uris.len(),
                uris.join(", "),
                e
            );
            return ChunkOutcome {
                failed: uris,
                ..Default::default()
            };
        }
    };

    let mut by_uri: HashMap<String, Value> = response
        .posts
        .into_iter()
        .filter_map(|post| {
            let uri = post.get("uri")?.as_str()?.to_string();
            Some((uri, post))
        })
        .collect();

    let mut outcome = ChunkOutcome::default();
    for reference in chunk {
        let Some(post) = by_uri.remove(&reference.poster_post_uri) else {
            tracing::info!("Post missing/deleted: {}", reference.poster_post_uri);
            outcome.missing.push(reference.poster_post_uri.clone());
            continue;
        };

        match enrich(reference, post) {
            Ok(enriched) => outcome.posts.push(enriched),
            Err(e) => {
                tracing::warn!(
                    "Unreadable post view for {}: {}",
                    reference.poster_post_uri,
                    e
                );
                outcome.failed.push(reference.poster_post_uri.clone());
            }
        }
    }

    outcome
}

/// Join a reference with its post view.
pub fn enrich(reference: &PostReference, post: Value) -> Result<EnrichedPost> {
    let view = PostView::deserialize(&post)?;
    let rkey = reference
        .rkey()
        .ok_or_else(|| {
            Error::Api(format!(
                "No record key in post URI {}",
                reference.poster_post_uri
            ))
        })?
        .to_string();
    let media = view.record.embed.as_ref().and_then(extract_media);

    Ok(EnrichedPost {
        reference: reference.clone(),
        response: post,
        rkey,
        text: view.record.text,
        author: AuthorSummary {
            did: view.author.did,
            handle: view.author.handle,
            display_name: view.author.display_name,
        },
        media,
    })
}
