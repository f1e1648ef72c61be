//! CLI-level commands that drive the pipeline.
//!
//! Wires config, database, rate limiter, search client and reporter
//! together, then prints a short summary on stdout. Also runs the
//! background fetch loop used while serving.

use anyhow::{bail, Result};
use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::censor::Censor;
use crate::classify::Classifier;
use crate::config::Config;
use crate::db;
use crate::github::options::is_valid_date;
use crate::github::{GithubClient, SearchOptions, SortOrder};
use crate::pipeline::{rederive_commits, CommitPipeline, RunSummary};
use crate::rate_limit::RateLimiter;
use crate::report::LogReporter;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;
use crate::validate::CommitValidator;

/// Arguments of `commits fetch`.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub terms: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: Option<SortOrder>,
    pub workers: Option<usize>,
}

/// Build the base search options for a fetch. Both dates default to today
/// (UTC) and must be `YYYY-MM-DD`. Results come newest first unless a sort
/// is given.
pub fn fetch_options(request: &FetchRequest) -> Result<SearchOptions> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let from = request.from.clone().unwrap_or_else(|| today.clone());
    let to = request.to.clone().unwrap_or(today);

    for (flag, value) in [("--from", &from), ("--to", &to)] {
        if !is_valid_date(value) {
            bail!("{} must be YYYY-MM-DD, got '{}'", flag, value);
        }
    }
    if from > to {
        bail!("--from ({}) is after --to ({})", from, to);
    }

    Ok(SearchOptions {
        from_date: from,
        to_date: to,
        sort: Some(request.sort.unwrap_or(SortOrder::Desc)),
        page: 1,
        ..SearchOptions::default()
    })
}

/// The request a background fetch makes on `today`: the last `days_back`
/// days up to today, newest first, random stored terms.
pub fn scheduled_request(today: NaiveDate, days_back: u64) -> FetchRequest {
    let from = today.checked_sub_days(Days::new(days_back)).unwrap_or(today);
    FetchRequest {
        terms: Vec::new(),
        from: Some(from.format("%Y-%m-%d").to_string()),
        to: Some(today.format("%Y-%m-%d").to_string()),
        sort: Some(SortOrder::Desc),
        workers: None,
    }
}

/// Fetch every `every` until the task is dropped. The first run starts one
/// full interval after the call; a failed run is logged and the loop goes on.
pub async fn run_scheduled_fetches(config: Config, every: Duration) {
    let days_back = config.pipeline.fetch_days_back.max(0) as u64;
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    info!(every_secs = every.as_secs(), days_back, "background fetch scheduled");
    loop {
        ticker.tick().await;

        let request = scheduled_request(Utc::now().date_naive(), days_back);
        match fetch(&config, request).await {
            Ok((options, summary)) => info!(
                from = %options.from_date,
                to = %options.to_date,
                terms = summary.terms,
                saved = summary.saved,
                existing = summary.existing,
                "background fetch finished"
            ),
            Err(err) => warn!(error = %err, "background fetch failed"),
        }
    }
}

pub async fn run_fetch(config: &Config, request: FetchRequest) -> Result<()> {
    let (options, summary) = fetch(config, request).await?;

    println!("fetch {}..{}", options.from_date, options.to_date);
    println!("  terms: {} ({} failed)", summary.terms, summary.failed_terms);
    println!("  fetched: {} items", summary.fetched);
    println!("  saved: {} new, {} already stored", summary.saved, summary.existing);
    println!("  skipped: {}", summary.skipped);
    println!("  failed: {}", summary.failed);
    println!("ok");

    Ok(())
}

async fn fetch(config: &Config, request: FetchRequest) -> Result<(SearchOptions, RunSummary)> {
    let options = fetch_options(&request)?;

    let pool = db::connect(config).await?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool.clone()));

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.requests,
        config.rate_limit.window(),
    ));
    let client = Arc::new(GithubClient::new(&config.github, limiter)?);
    let validator = CommitValidator::new(config.github.max_message_length)?;

    let pipeline = CommitPipeline::new(store, client, Arc::new(LogReporter), validator)
        .await?
        .with_options(options)
        .with_workers(request.workers.unwrap_or(config.pipeline.workers));

    let pipeline = if request.terms.is_empty() {
        pipeline
            .with_random_terms(config.pipeline.term_rank, config.pipeline.random_terms)
            .await
    } else {
        pipeline.with_terms(request.terms)
    };

    let summary = pipeline.run().await;
    pool.close().await;

    Ok((pipeline.options().clone(), summary))
}

pub async fn run_rederive(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let censor = Censor::new(store.banned_words().await?);
    let classifier = Classifier::new(store.group_keywords().await?);
    let updated = rederive_commits(&store, &censor, &classifier, &LogReporter).await?;
    pool.close().await;

    println!("rederive");
    println!("  updated: {}", updated);
    println!("ok");
    Ok(())
}

pub async fn run_limits(config: &Config) -> Result<()> {
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit.requests,
        config.rate_limit.window(),
    ));
    let client = GithubClient::new(&config.github, limiter)?;
    let limits = client.rate_limits().await?;

    for (name, limit) in [
        ("core", &limits.resources.core),
        ("search", &limits.resources.search),
    ] {
        println!(
            "{:<7} limit={} used={} remaining={} reset={}",
            name, limit.limit, limit.used, limit.remaining, limit.reset
        );
    }
    Ok(())
}
