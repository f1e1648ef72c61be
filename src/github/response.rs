//! Response shapes for the commit search and rate limit endpoints.
//!
//! Only the fields the pipeline consumes are decoded. Upstream sends `null`
//! for the author of commits whose email is not linked to an account; those
//! decode to an empty [`SearchUser`] instead of failing the whole page.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitSearchResponse {
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub items: Vec<CommitItem>,
}

/// One raw search hit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitItem {
    #[serde(rename = "html_url", default)]
    pub url: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commit: CommitDetail,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: SearchUser,
    #[serde(rename = "repository", default, deserialize_with = "null_as_default")]
    pub repo: SearchRepository,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: AuthorDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorDate {
    #[serde(default)]
    pub date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchUser {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(rename = "html_url", default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRepository {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "html_url", default)]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryOwner {
    #[serde(default)]
    pub login: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /rate_limit` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RateLimitResources {
    pub core: RateLimit,
    pub search: RateLimit,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RateLimit {
    pub limit: u64,
    #[serde(default)]
    pub used: u64,
    pub remaining: u64,
    /// Unix timestamp when the window resets.
    pub reset: i64,
}
