//! Post identity derived from URL path segments.

use std::fmt;

/// Stable identity of a post, built from the URL host and its non-empty path
/// segments. Query string and fragment never take part, so a post fetched
/// with one `xsec_token` still matches when retried with a refreshed token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostIdentifier {
    host: String,
    segments: Vec<String>,
}

impl PostIdentifier {
    /// Returns None if the URL has no host.
    pub fn from_url(url: &url::Url) -> Option<Self> {
        let host = url.host_str().filter(|h| !h.is_empty())?.to_ascii_lowercase();
        let segments = url
            .path_segments()
            .map(|segs| {
                segs.filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { host, segments })
    }

    /// Store key: `host/seg1/seg2/...`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Last path segment; the post id for `/explore/<id>` and
    /// `/user/profile/<author>/<id>` shapes.
    pub fn post_id(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Author id for `/user/profile/<author>/<post>` URLs.
    pub fn author_id(&self) -> Option<&str> {
        let pos = self.segments.iter().position(|s| s == "profile")?;
        // Bare profile pages (`/user/profile/<author>`) carry no post.
        if self.segments.len() < pos + 3 {
            return None;
        }
        self.segments.get(pos + 1).map(String::as_str)
    }
}

impl fmt::Display for PostIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host)?;
        for s in &self.segments {
            write!(f, "/{}", s)?;
        }
        Ok(())
    }
}
