use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Inline token; takes precedence over `api_key_env` when set.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Max number of items to collect per term when paginating.
    #[serde(default = "default_max_fetch")]
    pub max_fetch: usize,
    /// Commit messages longer than this are never persisted.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            api_key: None,
            user_agent: default_user_agent(),
            max_fetch: default_max_fetch(),
            max_message_length: default_max_message_length(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GithubConfig {
    /// Resolve the API token: inline value first, then the environment.
    ///
    /// An absent token is not an error; requests are then sent
    /// unauthenticated and get the upstream's anonymous limits.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.is_empty())
    }
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}
fn default_api_key_env() -> String {
    "GITHUB_API_KEY".to_string()
}
fn default_user_agent() -> String {
    "commits.lol".to_string()
}
fn default_max_fetch() -> usize {
    50
}
fn default_max_message_length() -> usize {
    45
}
fn default_timeout_secs() -> u64 {
    30
}

/// Rolling-window budget for search calls: `requests` per `window_secs`.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests")]
    pub requests: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

fn default_requests() -> usize {
    30
}
fn default_window_secs() -> u64 {
    70
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// How many random search terms to draw when none are given.
    #[serde(default = "default_random_terms")]
    pub random_terms: i64,
    #[serde(default = "default_term_rank")]
    pub term_rank: i64,
    /// Minutes between background fetches while serving. 0 disables them.
    #[serde(default = "default_fetch_interval_mins")]
    pub fetch_interval_mins: u64,
    /// How many days back a background fetch reaches.
    #[serde(default = "default_fetch_days_back")]
    pub fetch_days_back: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            random_terms: default_random_terms(),
            term_rank: default_term_rank(),
            fetch_interval_mins: default_fetch_interval_mins(),
            fetch_days_back: default_fetch_days_back(),
        }
    }
}

impl PipelineConfig {
    /// `None` when background fetching is off.
    pub fn fetch_interval(&self) -> Option<Duration> {
        (self.fetch_interval_mins > 0).then(|| Duration::from_secs(self.fetch_interval_mins * 60))
    }
}

fn default_workers() -> usize {
    4
}
fn default_random_terms() -> i64 {
    10
}
fn default_term_rank() -> i64 {
    1
}
fn default_fetch_interval_mins() -> u64 {
    60
}
fn default_fetch_days_back() -> i64 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Rows inserted by `commits init` into the collaborator-owned tables.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub bad_words: Vec<String>,
    #[serde(default)]
    pub search_terms: Vec<SeedSearchTerm>,
    /// keyword -> group
    #[serde(default)]
    pub group_keywords: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedSearchTerm {
    pub text: String,
    #[serde(default = "default_term_rank")]
    pub rank: i64,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.github.max_fetch == 0 {
        anyhow::bail!("github.max_fetch must be > 0");
    }

    if config.github.max_message_length == 0 {
        anyhow::bail!("github.max_message_length must be > 0");
    }

    if config.rate_limit.requests == 0 {
        anyhow::bail!("rate_limit.requests must be > 0");
    }

    if config.rate_limit.window_secs == 0 {
        anyhow::bail!("rate_limit.window_secs must be > 0");
    }

    if config.pipeline.workers == 0 {
        anyhow::bail!("pipeline.workers must be > 0");
    }

    if config.pipeline.random_terms < 1 {
        anyhow::bail!("pipeline.random_terms must be >= 1");
    }

    if config.pipeline.fetch_days_back < 0 {
        anyhow::bail!("pipeline.fetch_days_back must be >= 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let content = format!("[db]\npath = \"/tmp/commits.sqlite\"\n{}", extra);
        let config: Config = toml::from_str(&content)?;
        validate_config(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = parse("").unwrap();
        assert_eq!(config.github.base_url, "https://api.github.com");
        assert_eq!(config.github.max_fetch, 50);
        assert_eq!(config.github.max_message_length, 45);
        assert_eq!(config.rate_limit.requests, 30);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(70));
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(
            config.pipeline.fetch_interval(),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(config.pipeline.fetch_days_back, 3);
        assert!(config.seed.bad_words.is_empty());
    }

    #[test]
    fn test_seed_section() {
        let config = parse(
            r#"
[seed]
bad_words = ["crappy"]
search_terms = [{ text = "fixed a bug", rank = 2 }, { text = "oops" }]

[seed.group_keywords]
lol = "funny"
argh = "angry"
"#,
        )
        .unwrap();
        assert_eq!(config.seed.bad_words, vec!["crappy"]);
        assert_eq!(config.seed.search_terms.len(), 2);
        assert_eq!(config.seed.search_terms[0].rank, 2);
        assert_eq!(config.seed.search_terms[1].rank, 1);
        assert_eq!(config.seed.group_keywords.get("lol").unwrap(), "funny");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = parse("[pipeline]\nworkers = 0\n").unwrap_err();
        assert!(err.to_string().contains("pipeline.workers"));
    }

    #[test]
    fn test_zero_fetch_interval_disables_background_fetch() {
        let config = parse("[pipeline]\nfetch_interval_mins = 0\n").unwrap();
        assert_eq!(config.pipeline.fetch_interval(), None);

        let err = parse("[pipeline]\nfetch_days_back = -1\n").unwrap_err();
        assert!(err.to_string().contains("pipeline.fetch_days_back"));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let err = parse("[rate_limit]\nrequests = 0\n").unwrap_err();
        assert!(err.to_string().contains("rate_limit.requests"));
    }

    #[test]
    fn test_inline_api_key_wins() {
        let github = GithubConfig {
            api_key: Some("inline".to_string()),
            api_key_env: "COMMITS_LOL_TEST_UNSET_VAR".to_string(),
            ..GithubConfig::default()
        };
        assert_eq!(github.resolve_api_key().as_deref(), Some("inline"));

        let github = GithubConfig {
            api_key: None,
            api_key_env: "COMMITS_LOL_TEST_UNSET_VAR".to_string(),
            ..GithubConfig::default()
        };
        assert_eq!(github.resolve_api_key(), None);
    }
}
