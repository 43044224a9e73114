//! Parsing whole URL lists: comments, blank lines, dedup.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use super::{normalize, BaseDomain, ParseError, UrlEntry, COMMENT_MARKER};

/// A non-empty, non-comment line that failed normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    /// 1-based line number in the source text.
    pub line_no: usize,
    pub raw: String,
    pub error: ParseError,
}

/// Result of parsing a URL list: valid entries (deduplicated, input order)
/// plus the lines that could not be normalized.
#[derive(Debug, Clone, Default)]
pub struct ParsedList {
    pub entries: Vec<UrlEntry>,
    pub invalid: Vec<InvalidLine>,
    /// Lines dropped because an earlier line normalized to the same URL.
    pub duplicates: usize,
}

impl ParsedList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.invalid.is_empty()
    }
}

/// Parses one-URL-per-line text. Blank lines and `#` comments are skipped;
/// entries with an identical normalized URL collapse to the first occurrence.
pub fn parse_url_list(text: &str, base: &BaseDomain) -> ParsedList {
    let mut out = ParsedList::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        match normalize(line, base) {
            Ok(entry) => {
                if seen.insert(entry.normalized.clone()) {
                    out.entries.push(entry);
                } else {
                    out.duplicates += 1;
                }
            }
            Err(error) => out.invalid.push(InvalidLine {
                line_no: idx + 1,
                raw: line.to_string(),
                error,
            }),
        }
    }

    out
}

/// Reads and parses a URL list file.
pub fn load_url_file(path: &Path, base: &BaseDomain) -> Result<ParsedList> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read URL list: {}", path.display()))?;
    let parsed = parse_url_list(&text, base);
    tracing::info!(
        path = %path.display(),
        entries = parsed.entries.len(),
        invalid = parsed.invalid.len(),
        duplicates = parsed.duplicates,
        "loaded URL list"
    );
    Ok(parsed)
}
