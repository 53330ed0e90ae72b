//! Local "already downloaded" ledger.
//!
//! A single SQLite table keyed on `(user_post_uri, user_did, feed_type)`.
//! Rows are only ever inserted or deleted per account.

mod entry;

pub use entry::LedgerEntry;

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::config::FeedType;
use crate::error::Result;
use crate::fs::ensure_dir;
use crate::post::PostReference;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS downloaded_posts (
    user_did TEXT NOT NULL,
    user_post_uri TEXT NOT NULL,
    feed_type TEXT NOT NULL,
    poster_post_uri TEXT NOT NULL,
    PRIMARY KEY (user_post_uri, user_did, feed_type)
)
"#;

/// Handle to the ledger database, opened once per run.
#[derive(Debug)]
pub struct Ledger {
    pool: SqlitePool,
    /// Serializes writers; reads go straight to the pool.
    write_lock: Mutex<()>,
}

impl Ledger {
    /// Open (creating if needed) the ledger at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        tracing::debug!("Ledger opened at {}", path.display());

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// Whether this exact action has been recorded.
    pub async fn exists(
        &self,
        user_did: &str,
        user_post_uri: &str,
        feed_type: FeedType,
    ) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM downloaded_posts WHERE user_did = ? AND user_post_uri = ? AND feed_type = ? LIMIT 1",
        )
        .bind(user_did)
        .bind(user_post_uri)
        .bind(feed_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Whether every action of `reference` has been recorded.
    pub async fn reference_recorded(&self, reference: &PostReference) -> Result<bool> {
        for (user_post_uri, feed_type) in reference.actions() {
            if !self
                .exists(&reference.user_did, user_post_uri, feed_type)
                .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether the account has any rows of the given feed type.
    pub async fn account_has_entries(&self, user_did: &str, feed_type: FeedType) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM downloaded_posts WHERE user_did = ? AND feed_type = ? LIMIT 1",
        )
        .bind(user_did)
        .bind(feed_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Whether the account has any rows at all.
    pub async fn account_exists(&self, user_did: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM downloaded_posts WHERE user_did = ? LIMIT 1")
                .bind(user_did)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some())
    }

    /// Insert rows, ignoring ones already present.
    ///
    /// Returns whether at least one row was new.
    pub async fn insert_many(&self, entries: &[LedgerEntry]) -> Result<bool> {
        if entries.is_empty() {
            return Ok(false);
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for entry in entries {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO downloaded_posts (user_did, user_post_uri, feed_type, poster_post_uri) VALUES (?, ?, ?, ?)",
            )
            .bind(&entry.user_did)
            .bind(&entry.user_post_uri)
            .bind(&entry.feed_type)
            .bind(&entry.poster_post_uri)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        tracing::debug!("Ledger insert: {} of {} row(s) new", inserted, entries.len());

        Ok(inserted > 0)
    }

    /// Raw rows matching an optional account and a set of feed types.
    ///
    /// An empty feed type set matches every row.
    pub async fn entries(
        &self,
        user_did: Option<&str>,
        feed_types: &[FeedType],
    ) -> Result<Vec<LedgerEntry>> {
        let mut where_clauses: Vec<String> = Vec::new();

        if user_did.is_some() {
            where_clauses.push("user_did = ?".to_string());
        }
        if !feed_types.is_empty() {
            let placeholders = vec!["?"; feed_types.len()].join(", ");
            where_clauses.push(format!("feed_type IN ({})", placeholders));
        }

        let mut sql = "SELECT user_did, user_post_uri, feed_type, poster_post_uri FROM downloaded_posts"
            .to_string();
        if !where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid");

        let mut query = sqlx::query_as::<_, LedgerEntry>(&sql);
        if let Some(did) = user_did {
            query = query.bind(did);
        }
        for feed_type in feed_types {
            query = query.bind(feed_type.as_str());
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Rebuild references from recorded rows.
    ///
    /// Rows with an unrecognised feed type are skipped with a warning.
    pub async fn restore(
        &self,
        user_did: Option<&str>,
        feed_types: &[FeedType],
    ) -> Result<Vec<PostReference>> {
        let entries = self.entries(user_did, feed_types).await?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let reference = entry.to_reference();
                if reference.is_none() {
                    tracing::warn!(
                        "Skipping ledger row {} with unknown feed type '{}'",
                        entry.user_post_uri,
                        entry.feed_type
                    );
                }
                reference
            })
            .collect())
    }

    /// Delete every row for the account, returning how many were removed.
    pub async fn delete_account(&self, user_did: &str) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM downloaded_posts WHERE user_did = ?")
            .bind(user_did)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Total number of rows.
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM downloaded_posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the underlying pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
