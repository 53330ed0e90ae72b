//! Media module for embed classification.

pub mod extract;

pub use extract::{extract_media, extract_rkey, MediaDescriptor};
