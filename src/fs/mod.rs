//! Filesystem module.
//!
//! Provides:
//! - Ledger and temporary file paths
//! - Filename templating, sanitizing and truncation

pub mod naming;
pub mod paths;

pub use naming::{
    append_extension, fit_filename, make_base_filename, sanitize_filename, truncate_filename,
    FilenameFields, MAX_FILENAME_BYTES,
};
pub use paths::{default_database_path, ensure_dir, temp_path_for};
