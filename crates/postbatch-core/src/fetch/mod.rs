//! External fetch capability.
//!
//! The orchestrator only sees [`PostFetcher`]: one URL in, post metadata and
//! media references out. [`HttpFetcher`] is the default curl-backed
//! implementation; tests and embedders plug in their own.

mod error;
mod http;
mod parse;
mod types;

use async_trait::async_trait;

pub use error::FetchError;
pub use http::{HttpFetcher, HttpFetcherOptions};
pub use parse::parse_post_html;
pub use types::{PostMetadata, PostResult};

/// Turns one normalized post URL into its metadata.
///
/// Implementations own their protocol details (HTTP, auth, parsing) and
/// their own cancellation: the worker pool may stop waiting on a call after
/// its per-item timeout and drop the future.
#[async_trait]
pub trait PostFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PostResult, FetchError>;
}
