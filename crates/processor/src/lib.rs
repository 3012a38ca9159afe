#![doc = include_str!("../../../README.md")]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod experiment;
pub mod partition;
pub mod report;
pub mod run_stats;
pub mod trace;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use error::{Error, InvalidInput, WorkerFailure};
pub use partition::{partition, words, Chunk};
pub use report::{aggregate, Report};
pub use worker::{ChunkProcessor, WordCounter, WorkerResult};

/// Splits `document` into `workers` chunks, processes every chunk on its own thread and returns the
/// aggregated [Report].
pub fn process(document: &str, workers: usize) -> Result<Report, Error> {
    let chunks = partition(document, workers)?;
    let results = Dispatcher::new().run(&chunks)?;
    Ok(aggregate(results))
}
