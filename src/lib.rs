//! Bluesky Media Archiver
//!
//! This library archives the posts an AT Protocol account authored, liked or
//! reposted, together with their image and video blobs.
//!
//! # Features
//!
//! - Cursor-paginated record listing with a politeness delay
//! - Chunked, concurrent post detail fetching
//! - Retry with exponential backoff around every remote call
//! - Image and video extraction from post embeds
//! - A SQLite ledger so repeated runs only fetch what is new
//! - Restore and per-account delete of ledger entries
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use bsky_media_archiver::{archive_account, Config, Ledger, XrpcClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let api = XrpcClient::from_config(&config)?;
//!     let ledger = Ledger::open(&config.database_path()?).await?;
//!
//!     let stats = archive_account(&api, &ledger, &config).await?;
//!     println!("{} new posts", stats.new_posts);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod ledger;
pub mod media;
pub mod output;
pub mod post;

// Re-exports for convenience
pub use api::{AtprotoApi, RetryPolicy, XrpcClient};
pub use config::{Config, FeedType, MediaKind, RunMode};
pub use download::{
    archive_account, delete_account_entries, fetch_post_details, list_post_references,
    restore_downloads, RunStats,
};
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerEntry};
pub use media::{extract_media, MediaDescriptor};
pub use post::{EnrichedPost, PostReference};
