//! Best-effort extraction of post metadata from an HTML page.
//!
//! Reads `<title>` and Open Graph style `<meta>` tags. Anything richer
//! (site JSON blobs, signed media URLs) belongs in a site-specific fetcher.

use super::PostMetadata;

/// Parse a post page into metadata. Never fails; missing fields stay empty.
pub fn parse_post_html(html: &str) -> PostMetadata {
    let mut meta = PostMetadata::default();
    let mut og_title = None;

    for tag in meta_tags(html) {
        let key = attr(tag, "property").or_else(|| attr(tag, "name"));
        let (Some(key), Some(content)) = (key, attr(tag, "content")) else {
            continue;
        };
        let content = decode_entities(content.trim());
        if content.is_empty() {
            continue;
        }
        match key.to_ascii_lowercase().as_str() {
            "og:title" => og_title = Some(content),
            "og:description" | "description" => {
                meta.description.get_or_insert(content);
            }
            "author" | "og:author" | "article:author" => {
                meta.author.get_or_insert(content);
            }
            "og:image" | "og:image:url" | "og:video" | "og:video:url" => {
                if !meta.media.contains(&content) {
                    meta.media.push(content);
                }
            }
            _ => {}
        }
    }

    meta.title = og_title.or_else(|| title_tag(html));
    meta
}

/// Slices of the form `<meta ...>` (without the brackets).
fn meta_tags(html: &str) -> impl Iterator<Item = &str> {
    let lower = html.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(start) = lower[pos..].find("<meta") {
        let start = pos + start;
        let Some(end) = lower[start..].find('>') else {
            break;
        };
        out.push(&html[start + 1..start + end]);
        pos = start + end + 1;
    }
    out.into_iter()
}

/// Value of a quoted (or bare) attribute inside a tag body.
fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let mut from = 0;
    while let Some(i) = lower[from..].find(name) {
        let i = from + i;
        from = i + name.len();
        // Must be a whole attribute name, e.g. not `data-content`.
        let preceded_ok = i == 0 || lower.as_bytes()[i - 1].is_ascii_whitespace();
        let rest = lower[from..].trim_start();
        if !preceded_ok || !rest.starts_with('=') {
            continue;
        }
        let value_start = tag.len() - rest.len() + 1;
        let value = tag[value_start..].trim_start();
        return match value.chars().next() {
            Some(q @ ('"' | '\'')) => value[1..].split(q).next(),
            Some(_) => value.split(|c: char| c.is_ascii_whitespace() || c == '/').next(),
            None => None,
        };
    }
    None
}

fn title_tag(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let body_start = open + lower[open..].find('>')? + 1;
    let body_end = body_start + lower[body_start..].find("</title")?;
    let title = decode_entities(html[body_start..body_end].trim());
    (!title.is_empty()).then_some(title)
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
