//! Search client error taxonomy.
//!
//! Every variant is terminal for the page that raised it; nothing here is
//! retried internally.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by [`GithubClient`](super::GithubClient) calls.
#[derive(Error, Debug)]
pub enum SearchError {
    /// No qualifier present; raised before any token or network use.
    #[error("no search options provided")]
    EmptyQuery,

    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("error making request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 2xx body that is not the expected JSON shape.
    #[error("not able to unmarshal response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Structured non-2xx response: request URL, status, and upstream message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("github error {status}: {message} | URL: {url}")]
pub struct ApiError {
    pub url: String,
    pub status: u16,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    /// Build from a raw error body; an undecodable body still yields an error.
    pub fn from_body(url: impl Into<String>, status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .map(|b| b.message)
            .unwrap_or_else(|_| "not able to unmarshal error response".to_string());
        Self {
            url: url.into(),
            status,
            message,
        }
    }
}
