//! Download module: the archive pipeline.
//!
//! This module provides:
//! - Record listing and reference merging
//! - Chunked post detail fetching
//! - Blob and JSON side-file writing
//! - Archive, restore and delete orchestration
//! - Run statistics

pub mod blobs;
pub mod details;
pub mod identifiers;
pub mod pipeline;
pub mod state;

pub use blobs::{download_post, download_posts};
pub use details::{fetch_post_details, fetch_post_details_report, DetailReport};
pub use identifiers::{
    list_post_references, list_references_with_media, merge_references, retain_media,
};
pub use pipeline::{archive_account, delete_account_entries, resolve_account, restore_downloads};
pub use state::{PostOutcome, RunStats};
