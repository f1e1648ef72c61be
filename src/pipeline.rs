//! Concurrent commit ingestion.
//!
//! A [`CommitPipeline`] fans a set of search terms out to a fixed pool of
//! worker tasks:
//!
//! ```text
//! dispatcher ──terms──▶ job queue ──▶ worker 1..W ──one signal per term──▶ run()
//! ```
//!
//! Each worker pulls a term, collects every result page for it and saves
//! each record in this order: validate, author, repository, commit (with
//! color, group and censored message derived first). A failed search ends
//! that term; a failed write ends that record. Both are handed to the
//! [`ErrorReporter`] and neither stops the run. Records that fail
//! validation are skipped without being reported.
//!
//! [`run`](CommitPipeline::run) returns once it has received exactly one
//! completion signal per dispatched term.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::censor::Censor;
use crate::classify::Classifier;
use crate::error::{PipelineError, Stage};
use crate::github::{CommitItem, CommitSearcher, SearchOptions};
use crate::models::{Author, PersistedCommit, Repository};
use crate::report::ErrorReporter;
use crate::store::{Persisted, Store};
use crate::validate::{CommitValidator, ValidationError};

pub const DEFAULT_WORKERS: usize = 4;

/// Result of saving one search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    /// Commit row, either freshly created or the existing duplicate.
    Commit(Persisted),
    Skipped(ValidationError),
}

/// Completion signal for one term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermOutcome {
    pub term: String,
    pub fetched: usize,
    /// Rows created by this term.
    pub saved: usize,
    /// Valid hits that were already stored.
    pub existing: usize,
    pub skipped: usize,
    pub failed: usize,
    pub search_failed: bool,
}

/// Totals over every term of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub terms: usize,
    pub failed_terms: usize,
    pub fetched: usize,
    pub saved: usize,
    pub existing: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn add(&mut self, outcome: &TermOutcome) {
        self.terms += 1;
        if outcome.search_failed {
            self.failed_terms += 1;
        }
        self.fetched += outcome.fetched;
        self.saved += outcome.saved;
        self.existing += outcome.existing;
        self.skipped += outcome.skipped;
        self.failed += outcome.failed;
    }
}

/// Collaborators shared by every worker.
struct Shared {
    store: Arc<dyn Store>,
    searcher: Arc<dyn CommitSearcher>,
    reporter: Arc<dyn ErrorReporter>,
    validator: CommitValidator,
    censor: Censor,
    classifier: Classifier,
}

pub struct CommitPipeline {
    shared: Arc<Shared>,
    terms: Vec<String>,
    options: SearchOptions,
    workers: usize,
}

impl CommitPipeline {
    /// Build a pipeline, loading the banned words and group keywords from
    /// the store.
    pub async fn new(
        store: Arc<dyn Store>,
        searcher: Arc<dyn CommitSearcher>,
        reporter: Arc<dyn ErrorReporter>,
        validator: CommitValidator,
    ) -> Result<Self> {
        let censor = Censor::new(store.banned_words().await?);
        let classifier = Classifier::new(store.group_keywords().await?);
        debug!(
            banned_words = censor.len(),
            group_keywords = classifier.len(),
            "pipeline word lists loaded"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                searcher,
                reporter,
                validator,
                censor,
                classifier,
            }),
            terms: Vec::new(),
            options: SearchOptions::default(),
            workers: DEFAULT_WORKERS,
        })
    }

    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Draw up to `limit` terms of `rank` from the store. A failed lookup
    /// leaves the pipeline with no terms, so the run does nothing.
    pub async fn with_random_terms(mut self, rank: i64, limit: i64) -> Self {
        match self.shared.store.random_search_terms(rank, limit).await {
            Ok(terms) => self.terms = terms.into_iter().map(|t| t.text).collect(),
            Err(err) => {
                warn!(error = %err, "could not load random search terms");
                self.terms.clear();
            }
        }
        self
    }

    /// Base options shared by all terms. The text qualifier and page are
    /// replaced per term.
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = SearchOptions {
            query_text: String::new(),
            page: 1,
            ..options
        };
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn censor(&self) -> &Censor {
        &self.shared.censor
    }

    pub fn classifier(&self) -> &Classifier {
        &self.shared.classifier
    }

    /// Process every term and wait for all of them.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        if self.terms.is_empty() {
            info!("no search terms, nothing to do");
            return summary;
        }

        let expected = self.terms.len();
        info!(terms = expected, workers = self.workers, "starting run");

        let (job_tx, job_rx) = mpsc::channel::<String>(self.workers);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (done_tx, mut done_rx) = mpsc::channel::<TermOutcome>(expected);

        for id in 0..self.workers {
            let shared = Arc::clone(&self.shared);
            let jobs = Arc::clone(&job_rx);
            let done = done_tx.clone();
            let options = self.options.clone();
            tokio::spawn(async move { shared.work(id, jobs, done, options).await });
        }
        drop(done_tx);

        let terms = self.terms.clone();
        tokio::spawn(async move {
            for term in terms {
                if job_tx.send(term).await.is_err() {
                    break;
                }
            }
        });

        for _ in 0..expected {
            match done_rx.recv().await {
                Some(outcome) => {
                    info!(
                        term = %outcome.term,
                        fetched = outcome.fetched,
                        saved = outcome.saved,
                        existing = outcome.existing,
                        skipped = outcome.skipped,
                        failed = outcome.failed,
                        "term done"
                    );
                    summary.add(&outcome);
                }
                // Every worker is gone; nothing else can arrive.
                None => {
                    warn!(received = summary.terms, expected, "workers exited early");
                    break;
                }
            }
        }

        info!(
            terms = summary.terms,
            saved = summary.saved,
            existing = summary.existing,
            skipped = summary.skipped,
            failed = summary.failed,
            "run finished"
        );
        summary
    }

    /// Validate, derive and persist one search hit.
    pub async fn save(&self, item: &CommitItem) -> Result<Saved, PipelineError> {
        self.shared.save(item).await
    }
}

impl Shared {
    async fn work(
        &self,
        id: usize,
        jobs: Arc<Mutex<mpsc::Receiver<String>>>,
        done: mpsc::Sender<TermOutcome>,
        base: SearchOptions,
    ) {
        loop {
            let term = jobs.lock().await.recv().await;
            let Some(term) = term else {
                break;
            };

            debug!(worker = id, term = %term, "picked up term");
            let outcome = self.process_term(term, &base).await;
            if done.send(outcome).await.is_err() {
                break;
            }
        }
        debug!(worker = id, "worker exiting");
    }

    async fn process_term(&self, term: String, base: &SearchOptions) -> TermOutcome {
        let mut outcome = TermOutcome {
            term: term.clone(),
            ..TermOutcome::default()
        };

        let options = SearchOptions {
            query_text: term.clone(),
            page: 1,
            ..base.clone()
        };

        let items = match self.searcher.search_paginated(&options).await {
            Ok(items) => items,
            Err(source) => {
                self.reporter
                    .capture(&PipelineError::Search { term, source });
                outcome.search_failed = true;
                return outcome;
            }
        };
        outcome.fetched = items.len();

        for item in &items {
            match self.save(item).await {
                Ok(Saved::Commit(row)) if row.created => outcome.saved += 1,
                Ok(Saved::Commit(_)) => outcome.existing += 1,
                Ok(Saved::Skipped(reason)) => {
                    debug!(sha = %item.sha, reason = %reason, "skipped");
                    outcome.skipped += 1;
                }
                Err(err) => {
                    self.reporter.capture(&err);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    async fn save(&self, item: &CommitItem) -> Result<Saved, PipelineError> {
        if let Err(reason) = self.validator.validate(item) {
            return Ok(Saved::Skipped(reason));
        }

        let persistence = |stage| {
            move |source| PipelineError::Persistence {
                stage,
                sha: item.sha.clone(),
                source,
            }
        };

        let author = Author::from_item(item);
        let author_id = self
            .store
            .get_or_create_author(&author)
            .await
            .map_err(persistence(Stage::Author))?;

        let repo = Repository::from_item(item);
        let repo_id = self
            .store
            .get_or_create_repository(&repo)
            .await
            .map_err(persistence(Stage::Repository))?;

        let mut commit = PersistedCommit::from_item(item, Utc::now());
        commit.author_id = author_id;
        commit.repo_id = repo_id;
        commit.apply_color_theme(&author.username);
        commit.apply_group(&self.classifier);
        commit.apply_censor(&self.censor);

        let row = self
            .store
            .get_or_create_commit(&commit)
            .await
            .map_err(persistence(Stage::Commit))?;

        Ok(Saved::Commit(row))
    }
}

/// Recompute color, group and censored message for every stored commit and
/// write back the rows that changed. Returns how many were updated.
///
/// A failed update is reported and skipped; only failing to load the
/// commits aborts the pass.
pub async fn rederive_commits(
    store: &dyn Store,
    censor: &Censor,
    classifier: &Classifier,
    reporter: &dyn ErrorReporter,
) -> Result<usize> {
    let commits = store.all_commits().await?;
    let total = commits.len();
    let mut updated = 0;

    for entry in commits {
        let mut commit = entry.commit;
        let color = commit.apply_color_theme(&entry.author.username);
        let group = commit.apply_group(classifier);
        let censored = commit.apply_censor(censor);
        if !(color || group || censored) {
            continue;
        }

        match store.update_commit(&commit).await {
            Ok(()) => updated += 1,
            Err(source) => reporter.capture(&PipelineError::Persistence {
                stage: Stage::Update,
                sha: commit.sha.clone(),
                source,
            }),
        }
    }

    info!(total, updated, "rederive finished");
    Ok(updated)
}
