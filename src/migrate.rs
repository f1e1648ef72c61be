//! Schema creation and seeding.
//!
//! `author`, `repository` and `commit` hold ingested data. `search_term`,
//! `bad_word` and `group_term` hold the word lists the pipeline reads at
//! startup; [`seed`] fills them from the `[seed]` config section.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::{Config, SeedConfig};
use crate::db;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS author (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        avatar_url TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS repository (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        url TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "commit" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author_id INTEGER NOT NULL,
        repo_id INTEGER NOT NULL,
        message TEXT NOT NULL,
        message_censored TEXT NOT NULL DEFAULT '',
        sha TEXT NOT NULL,
        url TEXT NOT NULL,
        date INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        groupname TEXT NOT NULL DEFAULT '',
        color_bg TEXT NOT NULL DEFAULT '',
        color_fg TEXT NOT NULL DEFAULT '',
        UNIQUE(author_id, message),
        FOREIGN KEY (author_id) REFERENCES author(id),
        FOREIGN KEY (repo_id) REFERENCES repository(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS search_term (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL UNIQUE,
        rank INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bad_word (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        word TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS group_term (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        keyword TEXT NOT NULL UNIQUE,
        groupname TEXT NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_commit_date ON "commit"(date DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_commit_groupname ON "commit"(groupname)"#,
    "CREATE INDEX IF NOT EXISTS idx_search_term_rank ON search_term(rank)",
];

/// Rows inserted by one [`seed`] call. Entries already present are skipped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub search_terms: u64,
    pub bad_words: u64,
    pub group_keywords: u64,
}

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index. Safe to run repeatedly.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub async fn seed(pool: &SqlitePool, seed: &SeedConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for term in &seed.search_terms {
        let text = term.text.trim();
        if text.is_empty() {
            continue;
        }
        summary.search_terms += sqlx::query("INSERT OR IGNORE INTO search_term (text, rank) VALUES (?, ?)")
            .bind(text)
            .bind(term.rank)
            .execute(pool)
            .await?
            .rows_affected();
    }

    for word in &seed.bad_words {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            continue;
        }
        summary.bad_words += sqlx::query("INSERT OR IGNORE INTO bad_word (word) VALUES (?)")
            .bind(word)
            .execute(pool)
            .await?
            .rows_affected();
    }

    for (keyword, group) in &seed.group_keywords {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        summary.group_keywords +=
            sqlx::query("INSERT OR IGNORE INTO group_term (keyword, groupname) VALUES (?, ?)")
                .bind(keyword)
                .bind(group)
                .execute(pool)
                .await?
                .rows_affected();
    }

    Ok(summary)
}
