//! Single-attempt error type for retry classification.

use std::fmt;

use crate::fetch::FetchError;

/// Error from one HTTP attempt (curl failure or HTTP status).
/// Kept separate from `FetchError` so the curl error can be classified
/// before it is flattened to a reason string.
#[derive(Debug)]
pub enum AttemptError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// 2xx response with an empty body.
    EmptyBody,
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Curl(e) => write!(f, "{}", e),
            AttemptError::Http(code) => write!(f, "HTTP {}", code),
            AttemptError::EmptyBody => write!(f, "empty body"),
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Curl(e) => Some(e),
            AttemptError::Http(_) | AttemptError::EmptyBody => None,
        }
    }
}

impl From<curl::Error> for AttemptError {
    fn from(e: curl::Error) -> Self {
        AttemptError::Curl(e)
    }
}

impl From<AttemptError> for FetchError {
    fn from(e: AttemptError) -> Self {
        match e {
            AttemptError::Curl(ce) if ce.is_operation_timedout() => FetchError::Timeout,
            AttemptError::Curl(ce) => FetchError::Transport(ce.to_string()),
            AttemptError::Http(code) => FetchError::Http(code),
            AttemptError::EmptyBody => FetchError::EmptyResponse,
        }
    }
}
