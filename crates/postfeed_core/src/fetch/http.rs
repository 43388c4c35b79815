//! `reqwest`-backed posts fetcher.

use super::{FetchError, FetchResult, PostFetcher};
use crate::model::post::Post;
use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use std::time::{Duration, Instant};

/// Endpoint used when configuration does not override it.
pub const DEFAULT_POSTS_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Fetches posts with one HTTP GET to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpPostFetcher {
    client: Client,
    endpoint: String,
}

impl HttpPostFetcher {
    /// Builds a fetcher for `endpoint`.
    ///
    /// `timeout = None` keeps the transport default (no overall deadline).
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> FetchResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    /// Returns the endpoint this fetcher targets.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_inner(&self) -> FetchResult<Vec<Post>> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        // Read the body first so malformed JSON is reported as Decode, not
        // folded into a transport error.
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice::<Vec<Post>>(&bytes)?)
    }
}

#[async_trait]
impl PostFetcher for HttpPostFetcher {
    async fn fetch(&self) -> FetchResult<Vec<Post>> {
        let started_at = Instant::now();
        info!("event=posts_fetch module=fetch status=start");

        let result = self.fetch_inner().await;
        match &result {
            Ok(posts) => info!(
                "event=posts_fetch module=fetch status=ok duration_ms={} count={}",
                started_at.elapsed().as_millis(),
                posts.len()
            ),
            Err(err) => error!(
                "event=posts_fetch module=fetch status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }
}
