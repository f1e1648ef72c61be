//! # commits CLI
//!
//! ```bash
//! commits --config ./config/commits.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `commits init` | Create the database schema and seed the word lists |
//! | `commits fetch` | Search for commits and store the valid ones |
//! | `commits limits` | Show the current GitHub rate limits |
//! | `commits rederive` | Recompute color, group and censoring for stored commits |
//! | `commits serve` | Start the HTTP API and the background fetch loop |
//!
//! ```bash
//! commits init
//! commits fetch --term "fixed a bug" --term "lol" --from 2020-09-01 --to 2020-09-04
//! commits fetch                 # random terms, today only
//! commits serve
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use commits_lol::config;
use commits_lol::db;
use commits_lol::github::SortOrder;
use commits_lol::ingest::{self, FetchRequest};
use commits_lol::logging;
use commits_lol::migrate;
use commits_lol::server;
use commits_lol::store::sqlite::SqliteStore;

/// Collect funny commit messages from GitHub commit search.
#[derive(Parser)]
#[command(name = "commits", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/commits.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and insert the `[seed]` word lists.
    ///
    /// Idempotent; running it again only adds new seed entries.
    Init,

    /// Search for commits and store the valid ones.
    Fetch {
        /// Search term; repeat for several. Random stored terms are used
        /// when omitted.
        #[arg(long = "term")]
        terms: Vec<String>,

        /// First author date to include (YYYY-MM-DD, default today).
        #[arg(long)]
        from: Option<String>,

        /// Last author date to include (YYYY-MM-DD, default today).
        #[arg(long)]
        to: Option<String>,

        /// Sort results by author date (default desc).
        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Worker count (overrides `[pipeline].workers`).
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Show the current GitHub rate limits.
    Limits,

    /// Recompute color, group and censoring for stored commits.
    Rederive,

    /// Start the HTTP API on `[server].bind`.
    ///
    /// Also fetches the last `[pipeline].fetch_days_back` days every
    /// `[pipeline].fetch_interval_mins` minutes.
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Asc => SortOrder::Asc,
            SortArg::Desc => SortOrder::Desc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            let pool = db::connect(&cfg).await?;
            let seeded = migrate::seed(&pool, &cfg.seed).await?;
            pool.close().await;
            println!("Database initialized successfully.");
            println!(
                "  seeded: {} search terms, {} bad words, {} group keywords",
                seeded.search_terms, seeded.bad_words, seeded.group_keywords
            );
        }
        Commands::Fetch {
            terms,
            from,
            to,
            sort,
            workers,
        } => {
            let request = FetchRequest {
                terms,
                from,
                to,
                sort: sort.map(Into::into),
                workers,
            };
            ingest::run_fetch(&cfg, request).await?;
        }
        Commands::Limits => {
            ingest::run_limits(&cfg).await?;
        }
        Commands::Rederive => {
            ingest::run_rederive(&cfg).await?;
        }
        Commands::Serve => {
            if let Some(every) = cfg.pipeline.fetch_interval() {
                tokio::spawn(ingest::run_scheduled_fetches(cfg.clone(), every));
            }
            let pool = db::connect(&cfg).await?;
            server::run_server(&cfg, Arc::new(SqliteStore::new(pool))).await?;
        }
    }

    Ok(())
}
