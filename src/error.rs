//! Pipeline failures.
//!
//! Validation failures never show up here: a record that fails validation
//! is skipped without being reported.

use thiserror::Error;

use crate::github::SearchError;

/// Which write failed while saving one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Author,
    Repository,
    Commit,
    Update,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Author => "author",
            Stage::Repository => "repository",
            Stage::Commit => "commit",
            Stage::Update => "update",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A search term produced no usable results. Terminal for that term.
    #[error("search {term:?}: {source}")]
    Search {
        term: String,
        #[source]
        source: SearchError,
    },
    /// One write failed. Terminal for that record only.
    #[error("save {stage} for {sha}: {source}")]
    Persistence {
        stage: Stage,
        sha: String,
        #[source]
        source: anyhow::Error,
    },
}
