//! Configuration module for the archiver.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Feed type, media kind and run mode definitions
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{
    AccountConfig, Config, NetworkConfig, OptionsConfig, DEFAULT_FILENAME_FORMAT, MAX_PAGE_SIZE,
    MAX_POSTS_PER_REQUEST, MAX_THREADS,
};
pub use modes::{FeedType, MediaKind, RunMode};
pub use validation::{validate_config, validate_did, validate_handle};
