//! Persistence gateway.
//!
//! The [`Store`] trait is everything the pipeline and the HTTP server need
//! from storage. Two backends exist: [`sqlite::SqliteStore`] for real runs
//! and [`memory::InMemoryStore`] for tests.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`get_or_create_author`](Store::get_or_create_author) | Row id for an author, inserting by `url` if absent |
//! | [`get_or_create_repository`](Store::get_or_create_repository) | Row id for a repository, inserting by `url` if absent |
//! | [`get_or_create_commit`](Store::get_or_create_commit) | Row id for a commit, inserting by `(author_id, message)` if absent, and whether it was inserted |
//! | [`update_commit`](Store::update_commit) | Full-row update by id |
//! | [`all_commits`](Store::all_commits) | Every commit with its author |
//! | [`recent_commits_by_group`](Store::recent_commits_by_group) | Display sample for one group |
//! | [`random_search_terms`](Store::random_search_terms) | Random terms of a given rank |
//! | [`banned_words`](Store::banned_words) | Censor word list |
//! | [`group_keywords`](Store::group_keywords) | Classifier keyword map |
//!
//! Get-or-create calls racing on the same natural key must converge on one
//! row id; neither backend creates duplicates.

pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Author, CommitWithAuthor, PersistedCommit, Repository, SearchTerm};

/// How far back [`Store::recent_commits_by_group`] looks.
pub const RECENT_DAYS: i64 = 150;
/// Max rows returned by [`Store::recent_commits_by_group`].
pub const RECENT_LIMIT: usize = 30;

/// Result of [`Store::get_or_create_commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persisted {
    pub id: i64,
    /// False when the row already existed.
    pub created: bool,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_or_create_author(&self, author: &Author) -> Result<i64>;

    async fn get_or_create_repository(&self, repo: &Repository) -> Result<i64>;

    /// Returns the id of the existing row when the author already has a
    /// commit with the same message, whatever its sha or repository.
    async fn get_or_create_commit(&self, commit: &PersistedCommit) -> Result<Persisted>;

    async fn update_commit(&self, commit: &PersistedCommit) -> Result<()>;

    async fn all_commits(&self) -> Result<Vec<CommitWithAuthor>>;

    /// Up to [`RECENT_LIMIT`] commits dated within the last [`RECENT_DAYS`]
    /// days, in random order. An empty `group` matches every group.
    async fn recent_commits_by_group(&self, group: &str) -> Result<Vec<CommitWithAuthor>>;

    async fn random_search_terms(&self, rank: i64, limit: i64) -> Result<Vec<SearchTerm>>;

    async fn banned_words(&self) -> Result<Vec<String>>;

    /// keyword -> group
    async fn group_keywords(&self) -> Result<BTreeMap<String, String>>;
}
