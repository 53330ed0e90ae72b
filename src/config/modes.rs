//! Feed type, media kind and run mode definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection of user actions being archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    /// Posts authored by the account.
    Post,
    /// Posts the account liked.
    Like,
    /// Posts the account reposted.
    Repost,
}

impl FeedType {
    /// All feed types, in listing order.
    pub const ALL: [FeedType; 3] = [FeedType::Post, FeedType::Like, FeedType::Repost];

    /// Name stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::Post => "post",
            FeedType::Like => "like",
            FeedType::Repost => "repost",
        }
    }

    /// Lexicon collection NSID for listRecords.
    pub fn collection(&self) -> &'static str {
        match self {
            FeedType::Post => "app.bsky.feed.post",
            FeedType::Like => "app.bsky.feed.like",
            FeedType::Repost => "app.bsky.feed.repost",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post" => Ok(FeedType::Post),
            "like" => Ok(FeedType::Like),
            "repost" => Ok(FeedType::Repost),
            _ => Err(format!("Unknown feed type: {}", s)),
        }
    }
}

/// Kind of downloadable media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(format!("Unknown media type: {}", s)),
        }
    }
}

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// List, fetch and download everything not yet in the ledger.
    #[default]
    Archive,
    /// Re-download posts already recorded in the ledger.
    Restore,
    /// Remove the account's rows from the ledger.
    DeleteAccount,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Archive => write!(f, "archive"),
            RunMode::Restore => write!(f, "restore"),
            RunMode::DeleteAccount => write!(f, "delete account"),
        }
    }
}
