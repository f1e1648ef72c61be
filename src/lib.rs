//! # commits.lol
//!
//! Collects short, funny commit messages from GitHub commit search and
//! stores each one exactly once.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ GitHub search│──▶│ Pipeline         │──▶│  SQLite  │
//! │ rate limited │   │ validate/derive  │   │ get-or-  │
//! └──────────────┘   │ W workers        │   │ create   │
//!                    └──────────────────┘   └────┬─────┘
//!                                                │
//!                                          ┌─────▼────┐
//!                                          │ HTTP API │
//!                                          └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`rate_limit`] | Rolling-window request budget |
//! | [`github`] | Commit search client, options and responses |
//! | [`validate`] | Which commits may be stored |
//! | [`censor`] | Bad-word masking |
//! | [`classify`] | Keyword groups |
//! | [`theme`] | Display colors |
//! | [`models`] | Persisted entities |
//! | [`store`] | Persistence gateway (SQLite and in-memory) |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema and seed data |
//! | [`error`] | Pipeline errors |
//! | [`report`] | Error reporting sink |
//! | [`pipeline`] | Worker pool orchestration |
//! | [`ingest`] | CLI commands driving the pipeline |
//! | [`server`] | HTTP API |

pub mod censor;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod github;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod rate_limit;
pub mod report;
pub mod server;
pub mod store;
pub mod theme;
pub mod validate;
