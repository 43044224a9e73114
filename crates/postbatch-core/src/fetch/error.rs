//! Per-item fetch errors. Never fatal to a run.

/// Why a fetch did not produce a post.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Remote answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Connection, DNS, TLS or other transport failure.
    #[error("transport: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    /// Remote answered but returned nothing usable.
    #[error("no data returned")]
    EmptyResponse,
    /// Response could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),
}
