//! AT Protocol API module.
//!
//! This module provides:
//! - The `AtprotoApi` capability trait and its XRPC client
//! - Bounded retry with backoff around remote calls
//! - API response types

pub mod client;
pub mod retry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{AtprotoApi, XrpcClient};
pub use retry::{Backoff, RetryPolicy};
pub use types::*;
