//! Media descriptor extraction from post embeds.

use serde::Deserialize;
use serde_json::Value;

use crate::config::MediaKind;

/// Downloadable media attached to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaDescriptor {
    /// One or more images. The MIME type is taken from the first image.
    Images { cids: Vec<String>, mime_type: String },
    /// A single video.
    Video { cid: String, mime_type: String },
}

impl MediaDescriptor {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaDescriptor::Images { .. } => MediaKind::Image,
            MediaDescriptor::Video { .. } => MediaKind::Video,
        }
    }

    /// Blob CIDs in download order.
    pub fn cids(&self) -> Vec<&str> {
        match self {
            MediaDescriptor::Images { cids, .. } => cids.iter().map(String::as_str).collect(),
            MediaDescriptor::Video { cid, .. } => vec![cid.as_str()],
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            MediaDescriptor::Images { mime_type, .. } | MediaDescriptor::Video { mime_type, .. } => {
                mime_type.as_str()
            }
        }
    }

    /// File extension derived from the MIME subtype (`image/jpeg` is `jpeg`).
    pub fn extension(&self) -> &str {
        mime_subtype(self.mime_type())
    }
}

/// Blob reference as found in a post record.
///
/// Current records carry `ref.$link`; older ones a bare `cid`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobRef {
    #[serde(rename = "ref", default)]
    link: Option<CidLink>,
    #[serde(default)]
    cid: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CidLink {
    #[serde(rename = "$link")]
    link: String,
}

impl BlobRef {
    fn into_parts(self) -> Option<(String, String)> {
        let cid = self.link.map(|l| l.link).or(self.cid)?;
        Some((cid, self.mime_type.unwrap_or_default()))
    }
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    image: BlobRef,
}

/// Classify a post record's embed.
///
/// Returns `None` for text-only posts and for embeds that carry nothing to
/// download (external links, quotes, record-with-media).
pub fn extract_media(embed: &Value) -> Option<MediaDescriptor> {
    if let Some(images) = embed.get("images").and_then(Value::as_array) {
        let mut parts = images
            .iter()
            .filter_map(|entry| ImageEntry::deserialize(entry).ok())
            .filter_map(|entry| entry.image.into_parts());

        let (first_cid, mime_type) = parts.next()?;
        let mut cids = vec![first_cid];
        cids.extend(parts.map(|(cid, _)| cid));

        return Some(MediaDescriptor::Images { cids, mime_type });
    }

    if let Some(video) = embed.get("video").filter(|v| v.is_object()) {
        let (cid, mime_type) = BlobRef::deserialize(video).ok()?.into_parts()?;
        return Some(MediaDescriptor::Video { cid, mime_type });
    }

    None
}

/// Record key of an AT URI: its final path segment.
pub fn extract_rkey(uri: &str) -> Option<&str> {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|rkey| !rkey.is_empty() && !rkey.contains(':'))
}

fn mime_subtype(mime_type: &str) -> &str {
    match mime_type.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => subtype.split(';').next().unwrap_or(subtype),
        _ => "bin",
    }
}
