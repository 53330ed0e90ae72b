//! Blob and JSON side-file writer.

use std::path::Path;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;

use crate::api::AtprotoApi;
use crate::config::Config;
use crate::download::state::{PostOutcome, RunStats};
use crate::error::Result;
use crate::fs::{ensure_dir, fit_filename, make_base_filename, temp_path_for, FilenameFields};
use crate::ledger::Ledger;
use crate::media::MediaDescriptor;
use crate::post::EnrichedPost;

/// Write one post's blobs and JSON side file into `directory`.
///
/// Each blob fetch goes through the retry policy; a blob that still fails is
/// logged and counted, and the post is then left out of the ledger so a later
/// run picks it up again. Ledger and filesystem errors are returned.
pub async fn download_post(
    api: &dyn AtprotoApi,
    ledger: &Ledger,
    config: &Config,
    directory: &Path,
    post: &EnrichedPost,
) -> Result<PostOutcome> {
    let fields = FilenameFields {
        rkey: &post.rkey,
        handle: &post.author.handle,
        text: &post.text,
        did: &post.author.did,
        display_name: post.author.display_name.as_deref().unwrap_or_default(),
    };
    let base = make_base_filename(&config.options.filename_format, &fields)?;
    let policy = config.retry_policy();
    let mut outcome = PostOutcome::default();

    if let Some(media) = &post.media {
        let cids = media.cids();
        let numbered = cids.len() > 1;

        for (i, cid) in cids.iter().enumerate() {
            let index = numbered.then_some(i + 1);
            let path = directory.join(fit_filename(&base, index, Some(media.extension())));
            let context = format!("DID: {}, CID: {}", post.author.did, cid);

            match policy
                .run(&context, || api.get_blob(&post.author.did, cid))
                .await
            {
                Ok(bytes) => {
                    write_atomic(&path, &bytes).await?;
                    tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
                    match media {
                        MediaDescriptor::Images { .. } => outcome.images += 1,
                        MediaDescriptor::Video { .. } => outcome.videos += 1,
                    }
                }
                Err(e) => {
                    tracing::error!("Error downloading blob, {}: {}", context, e);
                    outcome.failed_blobs += 1;
                }
            }
        }
    }

    let json_path = directory.join(fit_filename(&base, None, Some("json")));
    let json = serde_json::to_vec_pretty(&post.response)?;
    write_atomic(&json_path, &json).await?;
    outcome.json_files += 1;

    if outcome.is_complete() {
        outcome.new_rows = ledger
            .insert_many(&post.reference.ledger_entries())
            .await?;
        outcome.recorded = true;
    } else {
        tracing::warn!(
            "Not recording {}: {} blob(s) failed",
            post.reference.poster_post_uri,
            outcome.failed_blobs
        );
    }

    Ok(outcome)
}

/// Download every post with up to `threads` posts in flight.
pub async fn download_posts(
    api: &dyn AtprotoApi,
    ledger: &Ledger,
    config: &Config,
    posts: &[EnrichedPost],
    progress: &ProgressBar,
) -> Result<RunStats> {
    let directory = config.download_directory();
    ensure_dir(&directory)?;
    let directory = directory.as_path();
    let workers = config.options.threads.max(1);

    let results: Vec<Result<PostOutcome>> = stream::iter(posts)
        .map(|post| async move {
            let outcome = download_post(api, ledger, config, directory, post).await;
            progress.inc(1);
            outcome
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    let mut stats = RunStats::default();
    for result in results {
        stats.add_outcome(&result?);
    }
    Ok(stats)
}

/// Write through a temporary sibling so readers never see partial files.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp = temp_path_for(path);
    if let Err(e) = tokio::fs::write(&temp, bytes).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }
    tokio::fs::rename(&temp, path).await?;
    Ok(())
}
