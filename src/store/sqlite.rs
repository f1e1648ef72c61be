//! SQLite-backed [`Store`] implementation.
//!
//! Get-or-create is lookup, then `INSERT ... ON CONFLICT DO NOTHING`, then
//! lookup again. The unique indexes created by [`crate::migrate`] decide
//! which of several racing inserts wins; the losers read back the winner's
//! id. Timestamps are stored as unix seconds.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{Author, CommitWithAuthor, PersistedCommit, Repository, SearchTerm};

use super::{Persisted, Store, RECENT_DAYS, RECENT_LIMIT};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn author_id(&self, url: &str) -> Result<Option<i64>> {
        Ok(sqlx::query_scalar("SELECT id FROM author WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn repository_id(&self, url: &str) -> Result<Option<i64>> {
        Ok(sqlx::query_scalar("SELECT id FROM repository WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn commit_id(&self, author_id: i64, message: &str) -> Result<Option<i64>> {
        Ok(
            sqlx::query_scalar(r#"SELECT id FROM "commit" WHERE author_id = ? AND message = ?"#)
                .bind(author_id)
                .bind(message)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

const COMMIT_WITH_AUTHOR: &str = r#"
    SELECT c.id, c.author_id, c.repo_id, c.message, c.message_censored, c.sha, c.url,
           c.date, c.created_at, c.groupname, c.color_bg, c.color_fg,
           a.username AS a_username, a.url AS a_url, a.avatar_url AS a_avatar_url
    FROM "commit" c
    JOIN author a ON a.id = c.author_id
"#;

fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn row_to_commit_with_author(row: &SqliteRow) -> CommitWithAuthor {
    let author_id: i64 = row.get("author_id");
    CommitWithAuthor {
        commit: PersistedCommit {
            id: row.get("id"),
            author_id,
            repo_id: row.get("repo_id"),
            message: row.get("message"),
            message_censored: row.get("message_censored"),
            sha: row.get("sha"),
            url: row.get("url"),
            date: from_ts(row.get("date")),
            created_at: from_ts(row.get("created_at")),
            group: row.get("groupname"),
            color_bg: row.get("color_bg"),
            color_fg: row.get("color_fg"),
        },
        author: Author {
            id: author_id,
            username: row.get("a_username"),
            url: row.get("a_url"),
            avatar_url: row.get("a_avatar_url"),
        },
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_or_create_author(&self, author: &Author) -> Result<i64> {
        if let Some(id) = self.author_id(&author.url).await? {
            return Ok(id);
        }

        sqlx::query(
            r#"
            INSERT INTO author (username, url, avatar_url)
            VALUES (?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&author.username)
        .bind(&author.url)
        .bind(&author.avatar_url)
        .execute(&self.pool)
        .await?;

        self.author_id(&author.url)
            .await?
            .ok_or_else(|| anyhow!("author {} missing after insert", author.url))
    }

    async fn get_or_create_repository(&self, repo: &Repository) -> Result<i64> {
        if let Some(id) = self.repository_id(&repo.url).await? {
            return Ok(id);
        }

        sqlx::query(
            r#"
            INSERT INTO repository (name, description, url)
            VALUES (?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&repo.name)
        .bind(&repo.description)
        .bind(&repo.url)
        .execute(&self.pool)
        .await?;

        self.repository_id(&repo.url)
            .await?
            .ok_or_else(|| anyhow!("repository {} missing after insert", repo.url))
    }

    async fn get_or_create_commit(&self, commit: &PersistedCommit) -> Result<Persisted> {
        if let Some(id) = self.commit_id(commit.author_id, &commit.message).await? {
            return Ok(Persisted { id, created: false });
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO "commit" (author_id, repo_id, message, message_censored, sha, url,
                                  date, created_at, groupname, color_bg, color_fg)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(author_id, message) DO NOTHING
            "#,
        )
        .bind(commit.author_id)
        .bind(commit.repo_id)
        .bind(&commit.message)
        .bind(&commit.message_censored)
        .bind(&commit.sha)
        .bind(&commit.url)
        .bind(commit.date.timestamp())
        .bind(commit.created_at.timestamp())
        .bind(&commit.group)
        .bind(&commit.color_bg)
        .bind(&commit.color_fg)
        .execute(&self.pool)
        .await?;

        // Zero rows affected means a concurrent writer got there first.
        let id = self
            .commit_id(commit.author_id, &commit.message)
            .await?
            .ok_or_else(|| anyhow!("commit {} missing after insert", commit.sha))?;
        Ok(Persisted {
            id,
            created: inserted.rows_affected() > 0,
        })
    }

    async fn update_commit(&self, commit: &PersistedCommit) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE "commit" SET
                author_id = ?, repo_id = ?, message = ?, message_censored = ?, sha = ?,
                url = ?, date = ?, created_at = ?, groupname = ?, color_bg = ?, color_fg = ?
            WHERE id = ?
            "#,
        )
        .bind(commit.author_id)
        .bind(commit.repo_id)
        .bind(&commit.message)
        .bind(&commit.message_censored)
        .bind(&commit.sha)
        .bind(&commit.url)
        .bind(commit.date.timestamp())
        .bind(commit.created_at.timestamp())
        .bind(&commit.group)
        .bind(&commit.color_bg)
        .bind(&commit.color_fg)
        .bind(commit.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("commit {} not found", commit.id);
        }
        Ok(())
    }

    async fn all_commits(&self) -> Result<Vec<CommitWithAuthor>> {
        let sql = format!("{} ORDER BY c.id", COMMIT_WITH_AUTHOR);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_commit_with_author).collect())
    }

    async fn recent_commits_by_group(&self, group: &str) -> Result<Vec<CommitWithAuthor>> {
        let since = (Utc::now() - Duration::days(RECENT_DAYS)).timestamp();
        let sql = format!(
            "{} WHERE c.date > ? AND (? = '' OR c.groupname = ?) ORDER BY RANDOM() LIMIT ?",
            COMMIT_WITH_AUTHOR
        );
        let rows = sqlx::query(&sql)
            .bind(since)
            .bind(group)
            .bind(group)
            .bind(RECENT_LIMIT as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_commit_with_author).collect())
    }

    async fn random_search_terms(&self, rank: i64, limit: i64) -> Result<Vec<SearchTerm>> {
        let rows = sqlx::query(
            "SELECT text, rank FROM search_term WHERE rank = ? ORDER BY RANDOM() LIMIT ?",
        )
        .bind(rank)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SearchTerm {
                text: row.get("text"),
                rank: row.get("rank"),
            })
            .collect())
    }

    async fn banned_words(&self) -> Result<Vec<String>> {
        Ok(sqlx::query_scalar("SELECT word FROM bad_word ORDER BY word")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn group_keywords(&self) -> Result<BTreeMap<String, String>> {
        let rows = sqlx::query("SELECT keyword, groupname FROM group_term")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("keyword"), row.get("groupname")))
            .collect())
    }
}
