//! Default fetcher: HTTP GET via libcurl, then best-effort HTML extraction.

use async_trait::async_trait;
use std::str;
use std::sync::Arc;
use std::time::Duration;

use super::parse::parse_post_html;
use super::{FetchError, PostFetcher, PostResult};
use crate::config::BatchConfig;
use crate::retry::{run_with_retry, AttemptError, RetryPolicy};

/// Bodies beyond this are drained but not kept; post pages carry their
/// metadata in `<head>`.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherOptions {
    pub connect_timeout: Duration,
    /// Timeout for one attempt (connect + transfer).
    pub timeout: Duration,
    pub user_agent: String,
    /// Raw `Cookie` header value, if the site needs a session.
    pub cookie: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl HttpFetcherOptions {
    pub fn from_config(cfg: &BatchConfig) -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            connect_timeout: defaults.connect_timeout,
            timeout: Duration::from_secs(cfg.fetch_timeout_secs.max(1)),
            user_agent: cfg.user_agent.clone().unwrap_or(defaults.user_agent),
            cookie: cfg.cookie.clone(),
            retry: cfg.retry_policy()?,
        })
    }
}

/// curl-backed [`PostFetcher`]. Each fetch runs on the blocking pool and
/// retries transient failures according to its [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    options: Arc<HttpFetcherOptions>,
}

impl HttpFetcher {
    pub fn new(options: HttpFetcherOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }
}

#[async_trait]
impl PostFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<PostResult, FetchError> {
        let url = url.to_string();
        let options = Arc::clone(&self.options);
        let page = tokio::task::spawn_blocking(move || {
            run_with_retry(&options.retry, || get_once(&url, &options))
        })
        .await
        .map_err(|e| FetchError::Transport(format!("fetch task: {}", e)))??;

        let mut metadata = parse_post_html(&page.body);
        metadata.final_url = page.final_url;
        metadata.content_type = page.content_type;
        if metadata.title.is_none() && metadata.media.is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        Ok(PostResult {
            metadata,
            bytes: page.bytes,
        })
    }
}

struct Page {
    body: String,
    bytes: u64,
    final_url: Option<String>,
    content_type: Option<String>,
}

/// One GET attempt. Runs in the current thread.
fn get_once(url: &str, options: &HttpFetcherOptions) -> Result<Page, AttemptError> {
    let mut body: Vec<u8> = Vec::new();
    let mut bytes: u64 = 0;

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(options.connect_timeout)?;
    easy.timeout(options.timeout)?;
    easy.useragent(&options.user_agent)?;
    easy.accept_encoding("")?; // any encoding curl supports

    let mut list = curl::easy::List::new();
    if let Some(cookie) = options.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
        list.append(&format!("Cookie: {}", cookie.trim()))?;
    }
    list.append("Accept: text/html,application/xhtml+xml")?;
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            bytes += data.len() as u64;
            let room = MAX_BODY_BYTES.saturating_sub(body.len());
            body.extend_from_slice(&data[..data.len().min(room)]);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(AttemptError::Http(code));
    }
    if bytes == 0 {
        return Err(AttemptError::EmptyBody);
    }

    let final_url = easy.effective_url()?.map(str::to_string);
    let content_type = easy.content_type()?.map(str::to_string);

    Ok(Page {
        body: String::from_utf8_lossy(&body).into_owned(),
        bytes,
        final_url,
        content_type,
    })
}
