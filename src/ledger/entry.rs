//! Ledger row shape.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::config::FeedType;
use crate::post::PostReference;

/// One `downloaded_posts` row.
///
/// `feed_type` is kept as stored so rows written by other versions still load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user_did: String,
    pub user_post_uri: String,
    pub feed_type: String,
    pub poster_post_uri: String,
}

impl LedgerEntry {
    /// Convert back into a single-action reference.
    ///
    /// Returns `None` when the stored feed type is unknown.
    pub fn to_reference(&self) -> Option<PostReference> {
        let feed_type: FeedType = self.feed_type.parse().ok()?;
        Some(PostReference::new(
            self.user_did.clone(),
            self.user_post_uri.clone(),
            feed_type,
            self.poster_post_uri.clone(),
        ))
    }
}

impl<'r> FromRow<'r, SqliteRow> for LedgerEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_did: row.try_get("user_did")?,
            user_post_uri: row.try_get("user_post_uri")?,
            feed_type: row.try_get("feed_type")?,
            poster_post_uri: row.try_get("poster_post_uri")?,
        })
    }
}
