//! In-memory [`Store`] implementation for tests.
//!
//! All tables live behind one `std::sync::Mutex`, so every get-or-create is
//! atomic. Random orderings are replaced by deterministic ones: recent
//! commits come back newest first and search terms in insertion order.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::models::{Author, CommitWithAuthor, PersistedCommit, Repository, SearchTerm};

use super::{Persisted, Store, RECENT_DAYS, RECENT_LIMIT};

#[derive(Default)]
struct Tables {
    authors: Vec<Author>,
    repositories: Vec<Repository>,
    commits: Vec<PersistedCommit>,
    search_terms: Vec<SearchTerm>,
    banned_words: Vec<String>,
    group_keywords: BTreeMap<String, String>,
    failing_messages: HashSet<String>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    pub fn add_search_term(&self, text: &str, rank: i64) -> Result<()> {
        self.lock()?.search_terms.push(SearchTerm {
            text: text.to_string(),
            rank,
        });
        Ok(())
    }

    pub fn add_banned_word(&self, word: &str) -> Result<()> {
        self.lock()?.banned_words.push(word.to_string());
        Ok(())
    }

    pub fn add_group_keyword(&self, keyword: &str, group: &str) -> Result<()> {
        self.lock()?
            .group_keywords
            .insert(keyword.to_string(), group.to_string());
        Ok(())
    }

    /// Make `get_or_create_commit` fail for commits with this message.
    pub fn fail_commits_with_message(&self, message: &str) -> Result<()> {
        self.lock()?.failing_messages.insert(message.to_string());
        Ok(())
    }

    pub fn author_count(&self) -> Result<usize> {
        Ok(self.lock()?.authors.len())
    }

    pub fn repository_count(&self) -> Result<usize> {
        Ok(self.lock()?.repositories.len())
    }

    pub fn commits(&self) -> Result<Vec<PersistedCommit>> {
        Ok(self.lock()?.commits.clone())
    }
}

fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

impl Tables {
    fn with_author(&self, commit: &PersistedCommit) -> CommitWithAuthor {
        let author = self
            .authors
            .iter()
            .find(|a| a.id == commit.author_id)
            .cloned()
            .unwrap_or_default();
        CommitWithAuthor {
            commit: commit.clone(),
            author,
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_or_create_author(&self, author: &Author) -> Result<i64> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables.authors.iter().find(|a| a.url == author.url) {
            return Ok(existing.id);
        }
        let id = next_id(tables.authors.len());
        tables.authors.push(Author {
            id,
            ..author.clone()
        });
        Ok(id)
    }

    async fn get_or_create_repository(&self, repo: &Repository) -> Result<i64> {
        let mut tables = self.lock()?;
        if let Some(existing) = tables.repositories.iter().find(|r| r.url == repo.url) {
            return Ok(existing.id);
        }
        let id = next_id(tables.repositories.len());
        tables.repositories.push(Repository {
            id,
            ..repo.clone()
        });
        Ok(id)
    }

    async fn get_or_create_commit(&self, commit: &PersistedCommit) -> Result<Persisted> {
        let mut tables = self.lock()?;
        if tables.failing_messages.contains(&commit.message) {
            anyhow::bail!("insert commit {}: write failed", commit.sha);
        }
        if let Some(existing) = tables
            .commits
            .iter()
            .find(|c| c.author_id == commit.author_id && c.message == commit.message)
        {
            return Ok(Persisted {
                id: existing.id,
                created: false,
            });
        }
        let id = next_id(tables.commits.len());
        tables.commits.push(PersistedCommit {
            id,
            ..commit.clone()
        });
        Ok(Persisted { id, created: true })
    }

    async fn update_commit(&self, commit: &PersistedCommit) -> Result<()> {
        let mut tables = self.lock()?;
        let slot = tables
            .commits
            .iter_mut()
            .find(|c| c.id == commit.id)
            .ok_or_else(|| anyhow!("commit {} not found", commit.id))?;
        *slot = commit.clone();
        Ok(())
    }

    async fn all_commits(&self) -> Result<Vec<CommitWithAuthor>> {
        let tables = self.lock()?;
        Ok(tables.commits.iter().map(|c| tables.with_author(c)).collect())
    }

    async fn recent_commits_by_group(&self, group: &str) -> Result<Vec<CommitWithAuthor>> {
        let since = Utc::now() - Duration::days(RECENT_DAYS);
        let tables = self.lock()?;

        let mut recent: Vec<&PersistedCommit> = tables
            .commits
            .iter()
            .filter(|c| c.date > since)
            .filter(|c| group.is_empty() || c.group == group)
            .collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(recent
            .into_iter()
            .take(RECENT_LIMIT)
            .map(|c| tables.with_author(c))
            .collect())
    }

    async fn random_search_terms(&self, rank: i64, limit: i64) -> Result<Vec<SearchTerm>> {
        let tables = self.lock()?;
        Ok(tables
            .search_terms
            .iter()
            .filter(|t| t.rank == rank)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn banned_words(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.banned_words.clone())
    }

    async fn group_keywords(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.lock()?.group_keywords.clone())
    }
}
