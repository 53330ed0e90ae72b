//! Run orchestration: list, filter through the ledger, fetch, download.

use crate::api::AtprotoApi;
use crate::config::{Config, FeedType};
use crate::download::blobs::download_posts;
use crate::download::details::fetch_post_details_report;
use crate::download::identifiers::{list_post_references, merge_references, retain_media};
use crate::download::state::RunStats;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::output::{create_item_bar, create_spinner};
use crate::post::PostReference;

/// The DID to archive: the configured DID, or the handle resolved remotely.
pub async fn resolve_account(api: &dyn AtprotoApi, config: &Config) -> Result<String> {
    let identifier = config.account_identifier()?;
    if identifier.starts_with("did:") {
        return Ok(identifier.to_string());
    }

    let handle = identifier.trim_start_matches('@');
    let context = format!("handle: {}", handle);
    let did = config
        .retry_policy()
        .run(&context, || api.resolve_handle(handle))
        .await?;

    tracing::info!("Resolved {} to {}", handle, did);
    Ok(did)
}

/// Archive the configured feeds of the configured account.
///
/// References already in the ledger are skipped before any detail fetch.
/// Listing failures abort the run; detail and blob failures are counted.
pub async fn archive_account(
    api: &dyn AtprotoApi,
    ledger: &Ledger,
    config: &Config,
) -> Result<RunStats> {
    let did = resolve_account(api, config).await?;

    let mut references = Vec::new();
    for &feed_type in &config.options.feed_types {
        let listed = list_post_references(api, config, &did, feed_type).await?;
        tracing::info!("Listed {} {} reference(s) for {}", listed.len(), feed_type, did);
        references.extend(listed);
    }

    let references = merge_references(references);
    let mut stats = RunStats {
        listed: references.len() as u64,
        ..Default::default()
    };

    let mut pending = Vec::with_capacity(references.len());
    for reference in references {
        if ledger.reference_recorded(&reference).await? {
            stats.skipped += 1;
        } else {
            pending.push(reference);
        }
    }
    tracing::info!(
        "{} reference(s) already archived, {} to fetch",
        stats.skipped,
        pending.len()
    );

    download_references(api, ledger, config, &pending, &mut stats).await?;
    Ok(stats)
}

/// Re-download everything the ledger holds for the configured account.
///
/// An empty feed type selection restores every feed type.
pub async fn restore_downloads(
    api: &dyn AtprotoApi,
    ledger: &Ledger,
    config: &Config,
) -> Result<RunStats> {
    let did = resolve_account(api, config).await?;
    let selected = &config.options.feed_types;
    let candidates: &[FeedType] = if selected.is_empty() {
        &FeedType::ALL
    } else {
        selected
    };

    let mut any_entries = false;
    for &feed_type in candidates {
        if ledger.account_has_entries(&did, feed_type).await? {
            any_entries = true;
        } else {
            tracing::info!("No {} entries recorded for {}", feed_type, did);
        }
    }

    let mut stats = RunStats::default();
    if !any_entries {
        tracing::warn!("Nothing recorded for {}, nothing to restore", did);
        return Ok(stats);
    }

    let references = merge_references(ledger.restore(Some(&did), selected).await?);
    stats.listed = references.len() as u64;
    tracing::info!("Restoring {} reference(s) for {}", references.len(), did);

    download_references(api, ledger, config, &references, &mut stats).await?;
    Ok(stats)
}

/// Remove every ledger row for the configured account.
///
/// Returns the resolved DID and the number of rows removed.
pub async fn delete_account_entries(
    api: &dyn AtprotoApi,
    ledger: &Ledger,
    config: &Config,
) -> Result<(String, u64)> {
    let did = resolve_account(api, config).await?;
    let removed = ledger.delete_account(&did).await?;
    tracing::info!("Removed {} ledger row(s) for {}", removed, did);
    Ok((did, removed))
}

async fn download_references(
    api: &dyn AtprotoApi,
    ledger: &Ledger,
    config: &Config,
    references: &[PostReference],
    stats: &mut RunStats,
) -> Result<()> {
    if references.is_empty() {
        return Ok(());
    }

    let visible = config.options.show_progress;
    let spinner = create_spinner(
        &format!("Fetching details for {} post(s)...", references.len()),
        visible,
    );
    let report = fetch_post_details_report(api, config, references).await;
    spinner.finish_and_clear();

    stats.missing += report.missing.len() as u64;
    stats.failed_lookups += report.failed.len() as u64;

    let fetched = report.posts.len();
    let posts = retain_media(report.posts, &config.options.media_types);
    stats.filtered += (fetched - posts.len()) as u64;

    let bar = create_item_bar(posts.len() as u64, "Downloading", visible);
    let downloaded = download_posts(api, ledger, config, &posts, &bar).await?;
    bar.finish_and_clear();

    stats.add_downloads(&downloaded);
    Ok(())
}
