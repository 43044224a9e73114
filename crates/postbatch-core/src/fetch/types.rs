//! Fetch results.

use serde::{Deserialize, Serialize};

/// Structured fields extracted for one post. Stored as JSON in the metadata store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL after redirects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Media references (images, videos) found for the post.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
}

/// Successful fetch of one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResult {
    pub metadata: PostMetadata,
    /// Body bytes read from the remote.
    pub bytes: u64,
}

impl PostResult {
    pub fn new(metadata: PostMetadata) -> Self {
        Self { metadata, bytes: 0 }
    }

    pub fn media_count(&self) -> usize {
        self.metadata.media.len()
    }
}
