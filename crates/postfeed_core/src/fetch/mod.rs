//! Remote post retrieval.
//!
//! # Responsibility
//! - Define the fetch contract consumed by the screen orchestration.
//! - Provide the HTTP implementation against the posts endpoint.
//!
//! # Invariants
//! - One call issues at most one request; there is no retry and no cache.
//! - Every failure surfaces as a [`FetchError`]; callers decide what to show.

use crate::model::post::Post;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod http;

pub use http::{HttpPostFetcher, DEFAULT_POSTS_ENDPOINT};

pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of a single posts fetch.
#[derive(Debug)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure.
    Transport(reqwest::Error),
    /// Server answered with a non-2xx status.
    Status { status: u16 },
    /// Body was not a JSON array of posts.
    Decode(serde_json::Error),
}

impl FetchError {
    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(err) if err.is_timeout() => "fetch_timeout",
            Self::Transport(_) => "fetch_transport",
            Self::Status { .. } => "fetch_status",
            Self::Decode(_) => "fetch_decode",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "posts request failed: {err}"),
            Self::Status { status } => write!(f, "posts endpoint returned status {status}"),
            Self::Decode(err) => write!(f, "posts response is malformed: {err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Status { .. } => None,
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

/// Source of the post collection shown on the screen.
#[async_trait]
pub trait PostFetcher: Send + Sync {
    async fn fetch(&self) -> FetchResult<Vec<Post>>;
}
