//! AT Protocol XRPC client.

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::types::*;
use crate::config::Config;
use crate::error::{Error, Result};

/// Seconds to wait on a 429 without a Retry-After header.
const DEFAULT_RATE_LIMIT_WAIT: u64 = 60;

/// Remote capabilities the archive pipeline consumes.
#[async_trait]
pub trait AtprotoApi: Send + Sync {
    /// One page of records from `repo`'s `collection`.
    async fn list_records(
        &self,
        repo: &str,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ListRecordsResponse>;

    /// Post views for up to 25 AT URIs. Deleted posts are absent from the output.
    async fn get_posts(&self, uris: &[String]) -> Result<GetPostsResponse>;

    /// Raw blob bytes.
    async fn get_blob(&self, did: &str, cid: &str) -> Result<Vec<u8>>;

    /// Resolve a handle to a DID, failing with [`Error::HandleNotFound`].
    async fn resolve_handle(&self, handle: &str) -> Result<String>;
}

/// reqwest-backed XRPC client.
#[derive(Debug, Clone)]
pub struct XrpcClient {
    client: Client,
    pds_url: Url,
    appview_url: Url,
}

impl XrpcClient {
    /// Create a client against the given PDS and AppView hosts.
    pub fn new(pds_url: &str, appview_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            pds_url: parse_base_url(pds_url)?,
            appview_url: parse_base_url(appview_url)?,
        })
    }

    /// Create a client from the `[network]` configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.network.pds_url, &config.network.appview_url)
    }

    fn endpoint(base: &Url, nsid: &str) -> Result<Url> {
        Ok(base.join(&format!("xrpc/{}", nsid))?)
    }

    /// Make a GET request and map error statuses.
    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<Response> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
            return Err(Error::RateLimited(wait));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: XrpcErrorBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(Error::Api(format!(
                "HTTP {}: {} {}",
                status,
                parsed.error.as_deref().unwrap_or("error"),
                parsed.message.as_deref().unwrap_or(&body)
            )));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T> {
        let response = self.get(url, query).await?;
        let text = response.text().await?;
        tracing::debug!("{} response length: {} bytes", what, text.len());

        serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse {}: {} - Response: {}",
                what,
                e,
                &text[..floor_char_boundary(&text, 500)]
            ))
        })
    }
}

#[async_trait]
impl AtprotoApi for XrpcClient {
    async fn list_records(
        &self,
        repo: &str,
        collection: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ListRecordsResponse> {
        let url = Self::endpoint(&self.pds_url, "com.atproto.repo.listRecords")?;
        let limit = limit.to_string();
        let mut query = vec![
            ("repo", repo),
            ("collection", collection),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        self.get_json(url, &query, "listRecords").await
    }

    async fn get_posts(&self, uris: &[String]) -> Result<GetPostsResponse> {
        if uris.is_empty() {
            return Ok(GetPostsResponse::default());
        }

        let url = Self::endpoint(&self.appview_url, "app.bsky.feed.getPosts")?;
        let query: Vec<(&str, &str)> = uris.iter().map(|uri| ("uris", uri.as_str())).collect();

        self.get_json(url, &query, "getPosts").await
    }

    async fn get_blob(&self, did: &str, cid: &str) -> Result<Vec<u8>> {
        let url = Self::endpoint(&self.pds_url, "com.atproto.sync.getBlob")?;
        let response = self.get(url, &[("did", did), ("cid", cid)]).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let handle = handle.trim_start_matches('@');
        let url = Self::endpoint(&self.appview_url, "com.atproto.identity.resolveHandle")?;

        match self
            .get_json::<ResolveHandleResponse>(url, &[("handle", handle)], "resolveHandle")
            .await
        {
            Ok(resolved) => Ok(resolved.did),
            Err(Error::Api(message)) if message.starts_with("HTTP 400") => {
                tracing::debug!("Handle resolution rejected: {}", message);
                Err(Error::HandleNotFound(handle.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

/// Parse a host URL so that `join` appends rather than replaces the last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Largest index `<= max` that falls on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
