//! Scripted [`AtprotoApi`] used by unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::client::AtprotoApi;
use crate::api::types::{GetPostsResponse, ListRecordsResponse, RepoRecord};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct ScriptedApi {
    pub pages: Mutex<VecDeque<ListRecordsResponse>>,
    pub posts: HashMap<String, Value>,
    pub blobs: HashMap<String, Vec<u8>>,
    pub handles: HashMap<String, String>,
    /// URIs whose getPosts chunk always fails.
    pub failing_uris: HashSet<String>,
    pub list_calls: AtomicU32,
    pub get_posts_calls: AtomicU32,
    pub blob_calls: AtomicU32,
    pub requested_limits: Mutex<Vec<u32>>,
    pub requested_cursors: Mutex<Vec<Option<String>>>,
}

impl ScriptedApi {
    pub fn with_pages(pages: Vec<Vec<RepoRecord>>) -> Self {
        Self {
            pages: Mutex::new(
                pages
                    .into_iter()
                    .map(|records| ListRecordsResponse {
                        records,
                        cursor: None,
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn add_post(&mut self, post: Value) {
        let uri = post["uri"].as_str().unwrap_or_default().to_string();
        self.posts.insert(uri, post);
    }

    pub fn get_posts_count(&self) -> u32 {
        self.get_posts_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AtprotoApi for ScriptedApi {
    async fn list_records(
        &self,
        _repo: &str,
        _collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ListRecordsResponse> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_limits.lock().unwrap().push(limit);
        self.requested_cursors
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn get_posts(&self, uris: &[String]) -> Result<GetPostsResponse> {
        self.get_posts_calls.fetch_add(1, Ordering::SeqCst);
        if uris.iter().any(|uri| self.failing_uris.contains(uri)) {
            return Err(Error::Api("HTTP 502 Bad Gateway".into()));
        }
        Ok(GetPostsResponse {
            posts: uris
                .iter()
                .filter_map(|uri| self.posts.get(uri).cloned())
                .collect(),
        })
    }

    async fn get_blob(&self, _did: &str, cid: &str) -> Result<Vec<u8>> {
        self.blob_calls.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .get(cid)
            .cloned()
            .ok_or_else(|| Error::Api(format!("HTTP 404 blob {}", cid)))
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        self.handles
            .get(handle)
            .cloned()
            .ok_or_else(|| Error::HandleNotFound(handle.to_string()))
    }
}

pub fn post_record(did: &str, rkey: &str) -> RepoRecord {
    RepoRecord {
        uri: format!("at://{}/app.bsky.feed.post/{}", did, rkey),
        cid: None,
        value: json!({ "$type": "app.bsky.feed.post", "text": "" }),
    }
}

pub fn like_record(did: &str, rkey: &str, subject_uri: &str) -> RepoRecord {
    RepoRecord {
        uri: format!("at://{}/app.bsky.feed.like/{}", did, rkey),
        cid: None,
        value: json!({
            "$type": "app.bsky.feed.like",
            "subject": { "uri": subject_uri, "cid": "bafyreisubject" }
        }),
    }
}

pub fn image_embed(cids: &[&str]) -> Value {
    let images: Vec<Value> = cids
        .iter()
        .map(|cid| {
            json!({
                "alt": "",
                "image": { "$type": "blob", "ref": { "$link": cid }, "mimeType": "image/jpeg", "size": 5 }
            })
        })
        .collect();
    json!({ "$type": "app.bsky.embed.images", "images": images })
}

pub fn post_view(uri: &str, author_did: &str, handle: &str, text: &str, embed: Option<Value>) -> Value {
    let mut record = json!({ "$type": "app.bsky.feed.post", "text": text });
    if let Some(embed) = embed {
        record["embed"] = embed;
    }
    json!({
        "uri": uri,
        "cid": "bafyreipost",
        "author": { "did": author_did, "handle": handle, "displayName": "Author" },
        "record": record,
        "likeCount": 3
    })
}
