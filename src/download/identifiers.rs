//! Record listing: turning an account's collection into post references.

use std::collections::{HashMap, HashSet};

use tokio::time::sleep;

use crate::api::AtprotoApi;
use crate::config::{Config, FeedType, MediaKind};
use crate::download::details::fetch_post_details;
use crate::error::Result;
use crate::media::extract_rkey;
use crate::post::{EnrichedPost, PostReference};

/// List every reference in `did`'s `feed_type` collection.
///
/// Pages are requested sequentially, each continuing from the record key of
/// the previous page's last record. Listing stops on an empty page, a repeated
/// cursor, or once `config.options.limit` references were collected. Retry
/// exhaustion on any page aborts the whole listing.
pub async fn list_post_references(
    api: &dyn AtprotoApi,
    config: &Config,
    did: &str,
    feed_type: FeedType,
) -> Result<Vec<PostReference>> {
    let policy = config.retry_policy();
    let page_size = config.options.page_size.max(1) as usize;
    let limit = config.options.limit;
    let context = format!("DID: {}, collection: {}", did, feed_type.collection());

    let mut cursor: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut references: Vec<PostReference> = Vec::new();

    loop {
        let request_size = match limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(references.len());
                if remaining == 0 {
                    tracing::info!("Reached limit of {} {} records", limit, feed_type);
                    break;
                }
                remaining.min(page_size)
            }
            None => page_size,
        };

        tracing::info!(
            "Fetching up to {} {} records for {}",
            request_size,
            feed_type,
            did
        );

        let page = policy
            .run(&context, || {
                api.list_records(
                    did,
                    feed_type.collection(),
                    request_size as u32,
                    cursor.as_deref(),
                )
            })
            .await?;

        let Some(last) = page.records.last() else {
            tracing::info!("No more {} records for {}", feed_type, did);
            break;
        };

        let next_cursor = extract_rkey(&last.uri)
            .map(str::to_string)
            .or_else(|| page.cursor.clone());
        if next_cursor.is_some() && next_cursor == cursor {
            tracing::debug!("Cursor {:?} repeated, stopping", cursor);
            break;
        }

        for record in &page.records {
            let poster_post_uri = match feed_type {
                FeedType::Post => Some(record.uri.as_str()),
                FeedType::Like | FeedType::Repost => record.subject_uri(),
            };
            let Some(poster_post_uri) = poster_post_uri else {
                tracing::warn!("Record {} has no subject, skipping", record.uri);
                continue;
            };
            if !seen.insert(record.uri.clone()) {
                continue;
            }

            references.push(PostReference::new(
                did,
                record.uri.clone(),
                feed_type,
                poster_post_uri,
            ));

            if limit.is_some_and(|limit| references.len() >= limit) {
                break;
            }
        }

        tracing::info!(
            "Retrieved {} {} records ({} total)",
            page.records.len(),
            feed_type,
            references.len()
        );

        if next_cursor.is_none() {
            break;
        }
        cursor = next_cursor;

        let delay = config.page_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    Ok(references)
}

/// List references and keep only those whose post carries one of `media_types`.
///
/// The listing API has no media signal, so candidates are looked up through
/// the detail fetcher in batches of `posts_chunk_size * threads`. An empty
/// `media_types` keeps everything without any lookups.
pub async fn list_references_with_media(
    api: &dyn AtprotoApi,
    config: &Config,
    did: &str,
    feed_type: FeedType,
    media_types: &[MediaKind],
) -> Result<Vec<PostReference>> {
    let references = list_post_references(api, config, did, feed_type).await?;
    if media_types.is_empty() {
        return Ok(references);
    }

    let batch_size = config.network.posts_chunk_size.max(1) * config.options.threads.max(1);
    let mut kept = Vec::new();

    for batch in references.chunks(batch_size) {
        let posts = fetch_post_details(api, config, batch).await;
        kept.extend(
            retain_media(posts, media_types)
                .into_iter()
                .map(|post| post.reference),
        );
    }

    tracing::info!(
        "{} of {} {} references carry {:?} media",
        kept.len(),
        references.len(),
        feed_type,
        media_types
    );

    Ok(kept)
}

/// Keep posts whose media kind is in `media_types`. Empty keeps all.
pub fn retain_media(posts: Vec<EnrichedPost>, media_types: &[MediaKind]) -> Vec<EnrichedPost> {
    if media_types.is_empty() {
        return posts;
    }
    posts
        .into_iter()
        .filter(|post| {
            post.media
                .as_ref()
                .is_some_and(|media| media_types.contains(&media.kind()))
        })
        .collect()
}

/// Fold references to the same post into one, keeping first-seen order.
///
/// Action URIs and feed types stay index-aligned.
pub fn merge_references(references: Vec<PostReference>) -> Vec<PostReference> {
    let mut merged: Vec<PostReference> = Vec::with_capacity(references.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for reference in references {
        match index.get(&reference.poster_post_uri).copied() {
            Some(i) => {
                let target = &mut merged[i];
                for (uri, feed_type) in reference.user_post_uri.into_iter().zip(reference.feed_type)
                {
                    let duplicate = target
                        .actions()
                        .any(|(u, f)| u == uri && f == feed_type);
                    if !duplicate {
                        target.user_post_uri.push(uri);
                        target.feed_type.push(feed_type);
                    }
                }
            }
            None => {
                index.insert(reference.poster_post_uri.clone(), merged.len());
                merged.push(reference);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::*;
    use crate::api::types::RepoRecord;
    use std::sync::atomic::Ordering;

    const DID: &str = "did:plc:u6iyyil77bqv5fknwauj3tfk";

    fn test_config() -> Config {
        let mut config = Config::default();
        config.account.did = Some(DID.into());
        config.network.page_delay_ms = 0;
        config.network.backoff_initial_ms = 0;
        config.network.max_attempts = 2;
        config
    }

    fn post_uri(rkey: &str) -> String {
        format!("at://did:plc:author/app.bsky.feed.post/{}", rkey)
    }

    fn likes(rkeys: &[&str]) -> Vec<RepoRecord> {
        rkeys
            .iter()
            .map(|rkey| like_record(DID, rkey, &post_uri(&format!("p{}", rkey))))
            .collect()
    }

    #[tokio::test]
    async fn test_likes_dereference_subject() {
        let api = ScriptedApi::with_pages(vec![likes(&["a1", "a2"]), vec![]]);
        let config = test_config();

        let refs = list_post_references(&api, &config, DID, FeedType::Like)
            .await
            .unwrap();

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].poster_post_uri, post_uri("pa1"));
        assert_eq!(
            refs[0].user_post_uri,
            vec![format!("at://{}/app.bsky.feed.like/a1", DID)]
        );
        assert_eq!(refs[0].feed_type, vec![FeedType::Like]);
        assert_eq!(refs[1].user_did, DID);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authored_posts_reference_themselves() {
        let api = ScriptedApi::with_pages(vec![vec![post_record(DID, "3lqx7wzy7c227")]]);
        let config = test_config();

        let refs = list_post_references(&api, &config, DID, FeedType::Post)
            .await
            .unwrap();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].poster_post_uri, refs[0].user_post_uri[0]);
    }

    #[tokio::test]
    async fn test_repeated_cursor_terminates() {
        let api = ScriptedApi::with_pages(vec![
            likes(&["x", "c1"]),
            likes(&["y", "c2"]),
            likes(&["z", "c2"]),
            likes(&["never"]),
        ]);
        let config = test_config();

        let refs = list_post_references(&api, &config, DID, FeedType::Like)
            .await
            .unwrap();

        assert_eq!(api.list_calls.load(Ordering::SeqCst), 3);
        assert_eq!(refs.len(), 4);
        let cursors = api.requested_cursors.lock().unwrap().clone();
        assert_eq!(
            cursors,
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_limit_caps_requests_and_results() {
        let api = ScriptedApi::with_pages(vec![likes(&["a", "b"]), likes(&["c", "d"])]);
        let mut config = test_config();
        config.options.page_size = 2;
        config.options.limit = Some(3);

        let refs = list_post_references(&api, &config, DID, FeedType::Like)
            .await
            .unwrap();

        assert_eq!(refs.len(), 3);
        assert_eq!(*api.requested_limits.lock().unwrap(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_listing_exhaustion_aborts() {
        struct DownApi;

        #[async_trait::async_trait]
        impl AtprotoApi for DownApi {
            async fn list_records(
                &self,
                _: &str,
                _: &str,
                _: u32,
                _: Option<&str>,
            ) -> Result<crate::api::ListRecordsResponse> {
                Err(crate::error::Error::Api("HTTP 503".into()))
            }
            async fn get_posts(&self, _: &[String]) -> Result<crate::api::GetPostsResponse> {
                unreachable!()
            }
            async fn get_blob(&self, _: &str, _: &str) -> Result<Vec<u8>> {
                unreachable!()
            }
            async fn resolve_handle(&self, _: &str) -> Result<String> {
                unreachable!()
            }
        }

        let err = list_post_references(&DownApi, &test_config(), DID, FeedType::Repost)
            .await
            .unwrap_err();
        assert!(err.is_retries_exhausted());
    }

    #[tokio::test]
    async fn test_media_filter_keeps_matching_posts() {
        let mut api = ScriptedApi::with_pages(vec![likes(&["1", "2", "3"])]);
        api.add_post(post_view(&post_uri("p1"), "did:plc:author", "a.test", "", Some(image_embed(&["c1"]))));
        api.add_post(post_view(&post_uri("p2"), "did:plc:author", "a.test", "text only", None));
        api.add_post(post_view(&post_uri("p3"), "did:plc:author", "a.test", "", Some(image_embed(&["c3", "c4"]))));
        let config = test_config();

        let refs = list_references_with_media(&api, &config, DID, FeedType::Like, &[MediaKind::Image])
            .await
            .unwrap();
        assert_eq!(
            refs.iter().map(|r| r.poster_post_uri.clone()).collect::<Vec<_>>(),
            vec![post_uri("p1"), post_uri("p3")]
        );
        assert_eq!(api.get_posts_count(), 1);
    }

    #[tokio::test]
    async fn test_media_filter_empty_set_skips_lookup() {
        let api = ScriptedApi::with_pages(vec![likes(&["1"])]);
        let refs = list_references_with_media(&api, &test_config(), DID, FeedType::Like, &[])
            .await
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(api.get_posts_count(), 0);
    }

    #[test]
    fn test_merge_references_aligns_actions() {
        let target = post_uri("shared");
        let merged = merge_references(vec![
            PostReference::new(DID, "at://x/app.bsky.feed.like/1", FeedType::Like, target.clone()),
            PostReference::new(DID, "at://x/app.bsky.feed.post/2", FeedType::Post, post_uri("own")),
            PostReference::new(DID, "at://x/app.bsky.feed.repost/3", FeedType::Repost, target.clone()),
            PostReference::new(DID, "at://x/app.bsky.feed.like/1", FeedType::Like, target.clone()),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].poster_post_uri, target);
        assert_eq!(merged[0].feed_type, vec![FeedType::Like, FeedType::Repost]);
        assert_eq!(
            merged[0].user_post_uri,
            vec![
                "at://x/app.bsky.feed.like/1".to_string(),
                "at://x/app.bsky.feed.repost/3".to_string()
            ]
        );
    }
}
