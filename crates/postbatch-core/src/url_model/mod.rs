//! URL modeling: input-line normalization and post identity.
//!
//! Turns raw input lines (absolute URLs or site-relative paths) into
//! fully-qualified [`UrlEntry`] values and derives the stable
//! [`PostIdentifier`] used for resume/skip decisions.

mod identity;
mod list;

pub use identity::PostIdentifier;
pub use list::{load_url_file, parse_url_list, InvalidLine, ParsedList};

/// Marker that starts a comment line in URL lists and the retry ledger.
pub const COMMENT_MARKER: char = '#';

/// How an input line was resolved. Decided once, at normalization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// Line began with `/` and was prefixed with the base domain.
    Relative,
    /// Line already carried an `http://` or `https://` scheme.
    Absolute,
}

/// Why an input line could not be turned into an entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Neither a `/path` nor an `http(s)://` URL.
    #[error("not a URL or /path: {0:?}")]
    Malformed(String),
    /// Looked like a URL but could not be parsed (or has no host).
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// One normalized input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    /// The trimmed input line as read.
    pub raw: String,
    /// Fully-qualified URL handed to the fetcher.
    pub normalized: String,
    pub kind: UrlKind,
    /// Identity derived from host and path segments (query ignored).
    pub id: PostIdentifier,
}

impl UrlEntry {
    /// Key used by the metadata store.
    pub fn key(&self) -> String {
        self.id.key()
    }
}

fn has_http_scheme(s: &str) -> bool {
    let head: String = s.chars().take(8).collect::<String>().to_ascii_lowercase();
    head.starts_with("http://") || head.starts_with("https://")
}

/// Validated base domain used to expand relative lines (trailing `/` removed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDomain(String);

impl BaseDomain {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim().trim_end_matches('/');
        if !has_http_scheme(trimmed) {
            return Err(ParseError::Malformed(raw.to_string()));
        }
        let parsed = url::Url::parse(trimmed).map_err(|e| ParseError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ParseError::InvalidUrl {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalizes one non-comment input line against `base`.
///
/// Relative lines (`/user/profile/A1/P1?...`) are prefixed with the base
/// domain; absolute `http(s)://` lines pass through unchanged. Anything else
/// is a [`ParseError`]. Blank and comment lines are filtered by
/// [`parse_url_list`] before this is called.
///
/// Normalization is idempotent: feeding `entry.normalized` back in yields
/// the same `normalized` string.
pub fn normalize(raw: &str, base: &BaseDomain) -> Result<UrlEntry, ParseError> {
    let line = raw.trim();
    let (normalized, kind) = if line.starts_with('/') {
        (format!("{}{}", base.as_str(), line), UrlKind::Relative)
    } else if has_http_scheme(line) {
        (line.to_string(), UrlKind::Absolute)
    } else {
        return Err(ParseError::Malformed(line.to_string()));
    };

    let parsed = url::Url::parse(&normalized).map_err(|e| ParseError::InvalidUrl {
        url: normalized.clone(),
        reason: e.to_string(),
    })?;
    let id = PostIdentifier::from_url(&parsed).ok_or_else(|| ParseError::InvalidUrl {
        url: normalized.clone(),
        reason: "missing host".to_string(),
    })?;

    Ok(UrlEntry {
        raw: line.to_string(),
        normalized,
        kind,
        id,
    })
}
