//! XRPC request/response type definitions.

use serde::{Deserialize, Serialize};

/// com.atproto.repo.listRecords output.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<RepoRecord>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// A single repository record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepoRecord {
    pub uri: String,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RepoRecord {
    /// URI of the post a like/repost record points at.
    pub fn subject_uri(&self) -> Option<&str> {
        self.value
            .get("subject")
            .and_then(|subject| subject.get("uri"))
            .and_then(|uri| uri.as_str())
    }
}

/// app.bsky.feed.getPosts output.
///
/// Posts are kept as raw JSON so they can be persisted unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GetPostsResponse {
    #[serde(default)]
    pub posts: Vec<serde_json::Value>,
}

/// The fields of app.bsky.feed.defs#postView the archiver reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PostView {
    pub uri: String,
    pub author: AuthorView,
    #[serde(default)]
    pub record: PostRecordView,
}

/// app.bsky.actor.defs#profileViewBasic subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// app.bsky.feed.post record subset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostRecordView {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub embed: Option<serde_json::Value>,
}

/// com.atproto.identity.resolveHandle output.
#[derive(Debug, Deserialize)]
pub struct ResolveHandleResponse {
    pub did: String,
}

/// Error body returned by XRPC endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct XrpcErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subject_uri_for_like_record() {
        let record: RepoRecord = serde_json::from_value(json!({
            "uri": "at://did:plc:z72i7hdynmk6r22z27h6tvur/app.bsky.feed.like/3ld7z46debo2g",
            "cid": "bafyreic5s6gfkaogfwljvhxnzxer4xslfopwf26f5qtwakluypzrppamye",
            "value": {
                "$type": "app.bsky.feed.like",
                "subject": {
                    "cid": "bafyreifp4vomoqhxritmilksydl4iixlnqnmwhau4nnprs7dvl4xy6gmqi",
                    "uri": "at://did:plc:xlqcxpk53spbhlypj6wmvvke/app.bsky.feed.post/3ld6bzuenjs2a"
                },
                "createdAt": "2024-12-14T00:09:53.185Z"
            }
        }))
        .unwrap();

        assert_eq!(
            record.subject_uri(),
            Some("at://did:plc:xlqcxpk53spbhlypj6wmvvke/app.bsky.feed.post/3ld6bzuenjs2a")
        );
    }

    #[test]
    fn test_post_view_reads_camel_case_author() {
        let post = json!({
            "uri": "at://did:plc:vpkdwwdia5etkdsuvsewtlws/app.bsky.feed.post/3lqx7wzy7c227",
            "cid": "bafyreidhuc5hv3iiq26e6citq2d77xl5gwsf22mp6qpwtl73hdkjqy3jsa",
            "author": {
                "did": "did:plc:vpkdwwdia5etkdsuvsewtlws",
                "handle": "inkpixels.bsky.social",
                "displayName": "ink"
            },
            "record": { "text": "11 colors, pixelart", "createdAt": "2025-06-06T16:11:02.304Z" },
            "likeCount": 1342
        });

        let view = PostView::deserialize(&post).unwrap();
        assert_eq!(view.author.display_name.as_deref(), Some("ink"));
        assert_eq!(view.record.text, "11 colors, pixelart");
        assert!(view.record.embed.is_none());
    }
}
