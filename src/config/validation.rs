//! Configuration validation logic.
//!
//! Everything here runs before the first network request.

use std::path::Path;
use std::sync::OnceLock;

use crate::config::loader::{Config, MAX_PAGE_SIZE, MAX_POSTS_PER_REQUEST, MAX_THREADS};
use crate::config::modes::{FeedType, RunMode};
use crate::error::{Error, Result};
use regex::Regex;

fn did_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^did:[a-z]+:[a-zA-Z0-9._:%-]+$").expect("valid regex"))
}

fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$")
            .expect("valid regex")
    })
}

/// Validate the entire configuration, clamping the thread count in place.
pub fn validate_config(config: &mut Config) -> Result<()> {
    let mode = config.options.mode;

    match (&config.account.did, &config.account.handle) {
        (Some(did), _) => validate_did(did)?,
        (None, Some(handle)) => validate_handle(handle)?,
        (None, None) => return Err(Error::MissingConfig("handle or did".to_string())),
    }

    if mode != RunMode::DeleteAccount {
        validate_directory(&config.download_directory())?;
        validate_filename_format(&config.options.filename_format)?;
        config.options.threads = validate_threads(config.options.threads)?;
        validate_chunk_size(config.network.posts_chunk_size)?;
    }

    if mode == RunMode::Archive {
        validate_feed_types(&config.options.feed_types)?;
        validate_page_size(config.options.page_size)?;
        if let Some(limit) = config.options.limit {
            validate_limit(limit)?;
        }
    }

    if config.network.max_attempts == 0 {
        return Err(Error::ConfigValidation {
            field: "max_attempts".to_string(),
            message: "At least one attempt is required".to_string(),
        });
    }

    Ok(())
}

/// Validate a DID such as `did:plc:abc123`.
pub fn validate_did(did: &str) -> Result<()> {
    if did_pattern().is_match(did) {
        Ok(())
    } else {
        Err(Error::ConfigValidation {
            field: "did".to_string(),
            message: format!("'{}' is not a valid DID (expected did:<method>:<id>)", did),
        })
    }
}

/// Validate a handle such as `alice.bsky.social`.
pub fn validate_handle(handle: &str) -> Result<()> {
    let clean = handle.trim_start_matches('@');
    if clean.len() <= 253 && handle_pattern().is_match(clean) {
        Ok(())
    } else {
        Err(Error::ConfigValidation {
            field: "handle".to_string(),
            message: format!("'{}' is not a valid handle", handle),
        })
    }
}

/// Validate that the output directory exists.
pub fn validate_directory(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::MissingConfig("download_directory".to_string()));
    }

    if !path.is_dir() {
        return Err(Error::ConfigValidation {
            field: "download_directory".to_string(),
            message: format!("'{}' does not exist or is not a directory", path.display()),
        });
    }

    Ok(())
}

/// Validate the per-feed reference cap.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::ConfigValidation {
            field: "limit".to_string(),
            message: "Limit must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Validate the listRecords page size.
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::ConfigValidation {
            field: "page_size".to_string(),
            message: format!(
                "Page size must be between 1 and {} (got {})",
                MAX_PAGE_SIZE, page_size
            ),
        });
    }
    Ok(())
}

/// Validate the getPosts chunk size.
pub fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size > MAX_POSTS_PER_REQUEST {
        return Err(Error::ConfigValidation {
            field: "posts_chunk_size".to_string(),
            message: format!(
                "Chunk size must be between 1 and {} (got {})",
                MAX_POSTS_PER_REQUEST, chunk_size
            ),
        });
    }
    Ok(())
}

/// Validate the worker count, clamping it to [`MAX_THREADS`].
pub fn validate_threads(threads: usize) -> Result<usize> {
    if threads == 0 {
        return Err(Error::ConfigValidation {
            field: "threads".to_string(),
            message: "Thread count must be at least 1".to_string(),
        });
    }

    if threads > MAX_THREADS {
        tracing::warn!(
            "Thread count {} exceeds maximum, using {}",
            threads,
            MAX_THREADS
        );
        return Ok(MAX_THREADS);
    }

    Ok(threads)
}

/// Validate that at least one feed type was selected.
pub fn validate_feed_types(feed_types: &[FeedType]) -> Result<()> {
    if feed_types.is_empty() {
        return Err(Error::MissingConfig(
            "feed type (at least one of --post, --like, --repost)".to_string(),
        ));
    }
    Ok(())
}

/// Validate the filename template.
pub fn validate_filename_format(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        return Err(Error::ConfigValidation {
            field: "filename_format".to_string(),
            message: "Filename format cannot be empty".to_string(),
        });
    }
    Ok(())
}
