//! Configuration structures and loading logic.

use crate::api::retry::{Backoff, RetryPolicy};
use crate::config::modes::{FeedType, MediaKind, RunMode};
use crate::error::{Error, Result};
use crate::fs::paths::default_database_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for concurrent fetch/download workers.
pub const MAX_THREADS: usize = 8;

/// Maximum URIs accepted by a single getPosts call.
pub const MAX_POSTS_PER_REQUEST: usize = 25;

/// Maximum records returned by a single listRecords page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default filename template for downloaded blobs.
pub const DEFAULT_FILENAME_FORMAT: &str = "{RKEY}_{HANDLE}_{TEXT}";

/// Main configuration structure.
///
/// Built once at startup and passed by reference to every pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Account being archived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Handle to resolve (e.g. `alice.bsky.social`).
    #[serde(default)]
    pub handle: Option<String>,

    /// DID, used directly when present.
    #[serde(default)]
    pub did: Option<String>,
}

/// Archive options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// What this invocation does. Only settable from the command line.
    #[serde(skip)]
    pub mode: RunMode,

    /// Directory blobs and JSON side files are written to.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Collections to archive.
    #[serde(default)]
    pub feed_types: Vec<FeedType>,

    /// Only keep posts carrying one of these media kinds. Empty keeps everything.
    #[serde(default)]
    pub media_types: Vec<MediaKind>,

    /// Concurrent workers for detail fetches and blob downloads.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Maximum references listed per feed type.
    #[serde(default)]
    pub limit: Option<usize>,

    /// Records requested per listRecords page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Template for blob filenames.
    #[serde(default = "default_filename_format")]
    pub filename_format: String,

    /// Ledger database location. Defaults to the per-user data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Whether to show progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            download_directory: None,
            feed_types: Vec::new(),
            media_types: Vec::new(),
            threads: default_threads(),
            limit: None,
            page_size: default_page_size(),
            filename_format: default_filename_format(),
            database_path: None,
            show_progress: true,
        }
    }
}

/// Remote endpoints and retry/throttle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Host serving com.atproto.* repo and sync endpoints.
    #[serde(default = "default_pds_url")]
    pub pds_url: String,

    /// Host serving app.bsky.* views.
    #[serde(default = "default_appview_url")]
    pub appview_url: String,

    /// Attempts per remote call before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry wait in milliseconds; doubles per attempt.
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    /// Retry wait ceiling in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Pause between listRecords pages.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// URIs per getPosts call.
    #[serde(default = "default_posts_chunk_size")]
    pub posts_chunk_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            pds_url: default_pds_url(),
            appview_url: default_appview_url(),
            max_attempts: default_max_attempts(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            page_delay_ms: default_page_delay_ms(),
            posts_chunk_size: default_posts_chunk_size(),
        }
    }
}

fn default_threads() -> usize {
    3
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_filename_format() -> String {
    DEFAULT_FILENAME_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_pds_url() -> String {
    "https://bsky.social".to_string()
}

fn default_appview_url() -> String {
    "https://public.api.bsky.app".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_initial_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_page_delay_ms() -> u64 {
    250
}

fn default_posts_chunk_size() -> usize {
    MAX_POSTS_PER_REQUEST
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Get the ledger database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.options.database_path {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }

    /// The account identifier given by the user, DID preferred over handle.
    pub fn account_identifier(&self) -> Result<&str> {
        self.account
            .did
            .as_deref()
            .or(self.account.handle.as_deref())
            .ok_or_else(|| Error::MissingConfig("handle or did".to_string()))
    }

    /// Retry policy applied around every remote call.
    pub fn retry_policy(&self) -> RetryPolicy {
        let backoff = if self.network.backoff_initial_ms == 0 {
            Backoff::None
        } else {
            Backoff::Exponential {
                initial: Duration::from_millis(self.network.backoff_initial_ms),
                max: Duration::from_millis(self.network.backoff_max_ms),
            }
        };
        RetryPolicy::new(self.network.max_attempts, backoff)
    }

    /// Pause between listing pages.
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.network.page_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [account]
            handle = "alice.bsky.social"

            [options]
            feed_types = ["like", "repost"]
            media_types = ["image"]
            threads = 2

            [network]
            max_attempts = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.account.handle.as_deref(), Some("alice.bsky.social"));
        assert_eq!(
            config.options.feed_types,
            vec![FeedType::Like, FeedType::Repost]
        );
        assert_eq!(config.options.media_types, vec![MediaKind::Image]);
        assert_eq!(config.options.threads, 2);
        assert_eq!(config.options.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.options.filename_format, DEFAULT_FILENAME_FORMAT);
        assert_eq!(config.network.max_attempts, 2);
        assert_eq!(config.network.posts_chunk_size, MAX_POSTS_PER_REQUEST);
        assert_eq!(config.options.mode, RunMode::Archive);
    }

    #[test]
    fn test_account_identifier_prefers_did() {
        let mut config = Config::default();
        assert!(config.account_identifier().is_err());

        config.account.handle = Some("alice.bsky.social".into());
        assert_eq!(config.account_identifier().unwrap(), "alice.bsky.social");

        config.account.did = Some("did:plc:abc123".into());
        assert_eq!(config.account_identifier().unwrap(), "did:plc:abc123");
    }

    #[test]
    fn test_retry_policy_from_network_settings() {
        let mut config = Config::default();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert!(matches!(policy.backoff, Backoff::Exponential { .. }));

        config.network.backoff_initial_ms = 0;
        assert!(matches!(config.retry_policy().backoff, Backoff::None));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
