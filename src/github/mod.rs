//! GitHub commit search client.
//!
//! [`GithubClient`] performs rate-limited requests against the commit search
//! endpoint and translates failures into [`SearchError`]s:
//!
//! | Failure | Error | Token spent |
//! |---------|-------|-------------|
//! | no qualifiers | [`SearchError::EmptyQuery`] | no |
//! | network / body read | [`SearchError::Transport`] | yes |
//! | non-2xx status | [`SearchError::Api`] | yes |
//! | malformed JSON | [`SearchError::Decode`] | yes |
//!
//! None of these are retried here. [`GithubClient::search_paginated`] stops
//! at the first failed page and discards whatever it had collected for that
//! query.

pub mod error;
pub mod options;
pub mod response;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GithubConfig;
use crate::rate_limit::RateLimiter;

pub use error::{ApiError, SearchError};
pub use options::{SearchOptions, SortOrder};
pub use response::{CommitItem, CommitSearchResponse, RateLimitResponse};

const COMMIT_SEARCH_ACCEPT: &str = "application/vnd.github.cloak-preview+json";
const API_ACCEPT: &str = "application/vnd.github.v3+json";

/// Source of commit search results for the ingestion pipeline.
#[async_trait]
pub trait CommitSearcher: Send + Sync {
    /// Collect every result for `options`, up to the configured fetch limit.
    async fn search_paginated(&self, options: &SearchOptions)
        -> Result<Vec<CommitItem>, SearchError>;
}

pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    user_agent: String,
    limiter: Arc<RateLimiter>,
    max_fetch: usize,
}

impl GithubClient {
    /// Build a client from configuration. The limiter is passed in so that
    /// every client in the process can share one budget.
    pub fn new(config: &GithubConfig, limiter: Arc<RateLimiter>) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolve_api_key(),
            user_agent: config.user_agent.clone(),
            limiter,
            max_fetch: config.max_fetch,
        })
    }

    pub fn max_fetch(&self) -> usize {
        self.max_fetch
    }

    fn headers(&self, accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        if let Ok(agent) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, agent);
        }
        if let Some(key) = &self.api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("token {}", key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Fetch one page of commit search results.
    ///
    /// Returns the decoded response; its `total_count` is the upstream's
    /// count across all pages.
    pub async fn search(&self, options: &SearchOptions) -> Result<CommitSearchResponse, SearchError> {
        if options.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        self.limiter.acquire().await;

        let url = format!("{}/search/commits?{}", self.base_url, options.serialize());
        let response = self
            .http
            .get(&url)
            .headers(self.headers(COMMIT_SEARCH_ACCEPT))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::from_body(url, status.as_u16(), &body).into());
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch pages until every result is collected or `max_fetch` is reached.
    /// Never returns more than `min(total_count, max_fetch)` items.
    ///
    /// Paging starts at `options.page` (or 1). Any failed page aborts the
    /// whole query and earlier pages are dropped.
    pub async fn search_paginated(
        &self,
        options: &SearchOptions,
    ) -> Result<Vec<CommitItem>, SearchError> {
        let mut options = options.clone();
        options.page = options.page.max(1);

        let mut items: Vec<CommitItem> = Vec::with_capacity(self.max_fetch.min(100));
        let mut total_count;

        loop {
            info!(query = %options.query_text, page = options.page, "fetching page");

            let response = self.search(&options).await?;
            let page_len = response.items.len();
            total_count = response.total_count;
            items.extend(response.items);

            debug!(
                query = %options.query_text,
                page = options.page,
                got = page_len,
                "page fetched"
            );

            if items.len() >= total_count {
                debug!(query = %options.query_text, page = options.page, "reached last page");
                break;
            }
            if items.len() >= self.max_fetch {
                debug!(query = %options.query_text, limit = self.max_fetch, "reached item limit");
                break;
            }
            if page_len == 0 {
                debug!(query = %options.query_text, page = options.page, "empty page, stopping");
                break;
            }

            options.page += 1;
        }

        // Pages may carry more items than the reported total.
        items.truncate(self.max_fetch.min(total_count));
        info!(query = %options.query_text, total = items.len(), "query finished");
        Ok(items)
    }

    /// Current rate limit status for the configured token. Not throttled by
    /// the search limiter.
    pub async fn rate_limits(&self) -> Result<RateLimitResponse, SearchError> {
        let url = format!("{}/rate_limit", self.base_url);
        let response = self
            .http
            .get(&url)
            .headers(self.headers(API_ACCEPT))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::from_body(url, status.as_u16(), &body).into());
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl CommitSearcher for GithubClient {
    async fn search_paginated(
        &self,
        options: &SearchOptions,
    ) -> Result<Vec<CommitItem>, SearchError> {
        GithubClient::search_paginated(self, options).await
    }
}
