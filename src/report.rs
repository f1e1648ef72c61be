//! Error reporting sink.
//!
//! Pipeline failures that should reach an operator go through an
//! [`ErrorReporter`]. The default [`LogReporter`] writes them to the log;
//! tests use [`CollectingReporter`] to inspect what was reported.

use std::sync::Mutex;

use tracing::error;

use crate::error::PipelineError;

pub trait ErrorReporter: Send + Sync {
    fn capture(&self, err: &PipelineError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn capture(&self, err: &PipelineError) {
        match err {
            PipelineError::Search { term, source } => {
                error!(term = %term, error = %source, "search failed");
            }
            PipelineError::Persistence { stage, sha, source } => {
                error!(stage = %stage, sha = %sha, error = %source, "save failed");
            }
        }
    }
}

/// Keeps the display string of every captured error.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    captured: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<String> {
        self.captured
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl ErrorReporter for CollectingReporter {
    fn capture(&self, err: &PipelineError) {
        if let Ok(mut captured) = self.captured.lock() {
            captured.push(err.to_string());
        }
    }
}
