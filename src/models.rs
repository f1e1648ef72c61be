//! Core data models.
//!
//! [`Author`], [`Repository`] and [`PersistedCommit`] mirror the `author`,
//! `repository` and `commit` tables. A freshly mapped value has `id == 0`
//! until the store assigns one.
//!
//! Natural keys:
//!
//! | Model | Unique by |
//! |-------|-----------|
//! | `Author` | `url` |
//! | `Repository` | `url` |
//! | `PersistedCommit` | `(author_id, message)` |

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::censor::Censor;
use crate::classify::Classifier;
use crate::github::CommitItem;
use crate::theme::color_theme;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub url: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

/// A stored commit and its derived display fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedCommit {
    pub id: i64,
    pub author_id: i64,
    pub repo_id: i64,
    pub message: String,
    /// Empty unless censoring changed the message.
    pub message_censored: String,
    pub sha: String,
    pub url: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub group: String,
    pub color_bg: String,
    pub color_fg: String,
}

/// A commit joined with its author, as returned for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitWithAuthor {
    #[serde(flatten)]
    pub commit: PersistedCommit,
    pub author: Author,
}

impl Author {
    pub fn from_item(item: &CommitItem) -> Self {
        Self {
            id: 0,
            username: item.author.login.clone(),
            url: item.author.url.clone(),
            avatar_url: item.author.avatar_url.clone(),
        }
    }
}

impl Repository {
    pub fn from_item(item: &CommitItem) -> Self {
        Self {
            id: 0,
            name: item.repo.name.clone(),
            description: item.repo.description.clone(),
            url: item.repo.url.clone(),
        }
    }
}

impl PersistedCommit {
    /// Map a search hit. Foreign keys stay 0 until stamped by the caller;
    /// a missing author date falls back to `now`.
    pub fn from_item(item: &CommitItem, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            author_id: 0,
            repo_id: 0,
            message: item.commit.message.clone(),
            message_censored: String::new(),
            sha: item.sha.clone(),
            url: item.url.clone(),
            date: item
                .commit
                .author
                .date
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(now),
            created_at: now,
            group: String::new(),
            color_bg: String::new(),
            color_fg: String::new(),
        }
    }

    /// Set the color pair. Returns whether it changed.
    pub fn apply_color_theme(&mut self, author_name: &str) -> bool {
        let theme = color_theme(&self.message, author_name);
        if self.color_bg == theme.background && self.color_fg == theme.foreground {
            return false;
        }
        self.color_bg = theme.background.to_string();
        self.color_fg = theme.foreground.to_string();
        true
    }

    /// Set the group. Returns whether it changed.
    pub fn apply_group(&mut self, classifier: &Classifier) -> bool {
        let group = classifier.classify(&self.message);
        if group == self.group {
            return false;
        }
        self.group = group;
        true
    }

    /// Set the censored message when censoring actually changes the text.
    /// Returns whether the field changed.
    pub fn apply_censor(&mut self, censor: &Censor) -> bool {
        let censored = censor.censor(&self.message);
        let next = if censored.changed(&self.message) {
            censored.text
        } else {
            String::new()
        };
        if next == self.message_censored {
            return false;
        }
        self.message_censored = next;
        true
    }
}

/// A ranked query phrase drawn for a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub text: String,
    pub rank: i64,
}
