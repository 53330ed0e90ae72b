//! Error types for the bsky-media-archiver application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Remote errors
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Handle not found: {0}")]
    HandleNotFound(String),

    #[error("Retries exhausted after {attempts} attempt(s) for {context}: {source}")]
    RetriesExhausted {
        context: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    // Ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] sqlx::Error),

    // File system errors
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether a failed remote call may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Api(_) | Error::RateLimited(_) | Error::Json(_)
        )
    }

    /// Whether this error came out of the retry wrapper.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Error::RetriesExhausted { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
