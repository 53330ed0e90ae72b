//! Post reference and enriched post records passed between pipeline stages.

use serde_json::Value;

use crate::config::FeedType;
use crate::ledger::LedgerEntry;
use crate::media::{extract_rkey, MediaDescriptor};

/// A user action (authored post, like or repost) pointing at a post.
///
/// `user_post_uri` and `feed_type` are index-aligned: each pair is one action
/// record and becomes one ledger row. They only hold more than one element
/// after [`crate::download::merge_references`] folds actions on the same post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    pub user_did: String,
    pub user_post_uri: Vec<String>,
    pub feed_type: Vec<FeedType>,
    pub poster_post_uri: String,
}

impl PostReference {
    pub fn new(
        user_did: impl Into<String>,
        user_post_uri: impl Into<String>,
        feed_type: FeedType,
        poster_post_uri: impl Into<String>,
    ) -> Self {
        Self {
            user_did: user_did.into(),
            user_post_uri: vec![user_post_uri.into()],
            feed_type: vec![feed_type],
            poster_post_uri: poster_post_uri.into(),
        }
    }

    /// Record key of the referenced post.
    pub fn rkey(&self) -> Option<&str> {
        extract_rkey(&self.poster_post_uri)
    }

    pub fn has_feed_type(&self, feed_type: FeedType) -> bool {
        self.feed_type.contains(&feed_type)
    }

    /// (action URI, feed type) pairs.
    pub fn actions(&self) -> impl Iterator<Item = (&str, FeedType)> {
        self.user_post_uri
            .iter()
            .map(String::as_str)
            .zip(self.feed_type.iter().copied())
    }

    /// Ledger rows recording this reference as downloaded.
    pub fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.actions()
            .map(|(user_post_uri, feed_type)| LedgerEntry {
                user_did: self.user_did.clone(),
                user_post_uri: user_post_uri.to_string(),
                feed_type: feed_type.as_str().to_string(),
                poster_post_uri: self.poster_post_uri.clone(),
            })
            .collect()
    }
}

/// Author fields shown in filenames. Fetched fresh every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorSummary {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
}

/// A reference joined with the post view returned by getPosts.
#[derive(Debug, Clone)]
pub struct EnrichedPost {
    pub reference: PostReference,
    /// The post view exactly as returned, written out as the JSON side file.
    pub response: Value,
    pub rkey: String,
    pub text: String,
    pub author: AuthorSummary,
    pub media: Option<MediaDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_entries_follow_actions() {
        let reference = PostReference {
            user_did: "did:plc:u6iyyil77bqv5fknwauj3tfk".into(),
            user_post_uri: vec![
                "at://did:plc:u6iyyil77bqv5fknwauj3tfk/app.bsky.feed.like/3lqx3fnspgj2a".into(),
                "at://did:plc:u6iyyil77bqv5fknwauj3tfk/app.bsky.feed.repost/3lqx3fnspgj2s".into(),
            ],
            feed_type: vec![FeedType::Like, FeedType::Repost],
            poster_post_uri: "at://did:plc:3eatnvb2dim4l7fiwln5wow6/app.bsky.feed.post/3lqwz2kuzg22s"
                .into(),
        };

        let entries = reference.ledger_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].feed_type, "like");
        assert_eq!(entries[1].feed_type, "repost");
        assert!(entries[1].user_post_uri.ends_with("3lqx3fnspgj2s"));
        assert!(entries
            .iter()
            .all(|e| e.poster_post_uri == reference.poster_post_uri));
        assert_eq!(reference.rkey(), Some("3lqwz2kuzg22s"));
        assert!(reference.has_feed_type(FeedType::Repost));
        assert!(!reference.has_feed_type(FeedType::Post));
    }
}
