use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

/// Reasons for rejecting a run before any worker is started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("document is blank")]
    BlankDocument,
    #[error("number of workers must be positive")]
    NoWorkers,
    /// Every chunk must contain at least one word.
    #[error("number of workers ({workers}) exceeds the number of words in the document ({words})")]
    TooManyWorkers { workers: usize, words: usize },
    #[error("number of workers ({workers}) exceeds the configured limit ({limit})")]
    WorkerLimitExceeded { workers: usize, limit: usize },
}

/// Worker which didn't produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub chunk_index: usize,
    /// Panic payload if it was a string, otherwise a placeholder.
    pub message: String,
}

fn chunk_list(failures: &[WorkerFailure]) -> String {
    failures.iter().map(|failure| failure.chunk_index).join(", ")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// Reported only after all other workers have finished.
    #[error("workers failed for chunks [{}]", chunk_list(.failures))]
    WorkerFailed { failures: Vec<WorkerFailure> },

    #[error("can't start worker for chunk {chunk_index}")]
    Fatal {
        chunk_index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("can't load config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    /// Indices of failed chunks, empty unless this is [Error::WorkerFailed].
    pub fn failed_chunks(&self) -> Vec<usize> {
        match self {
            Error::WorkerFailed { failures } => failures.iter().map(|failure| failure.chunk_index).collect(),
            _ => Vec::new(),
        }
    }
}
