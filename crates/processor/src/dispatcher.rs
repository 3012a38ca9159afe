use std::{any::Any, thread};

use log::{debug, info, warn};

use crate::{
    error::{Error, WorkerFailure},
    partition::Chunk,
    worker::{ChunkProcessor, WordCounter, WorkerResult},
};

/// Dispatches chunks to worker threads.
pub struct Dispatcher {
    processor: Box<dyn ChunkProcessor>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Dispatcher which processes chunks with [WordCounter].
    pub fn new() -> Self {
        Self::with_processor(Box::new(WordCounter))
    }

    pub fn with_processor(processor: Box<dyn ChunkProcessor>) -> Self {
        Self { processor }
    }

    /// Starts a worker for every chunk in order and blocks until all of them finish.
    ///
    /// Results are ordered by chunk index regardless of completion order. Panicked workers are
    /// reported together as [Error::WorkerFailed] once every other worker has finished. If a thread
    /// can't be created, workers which were already started are still waited for and
    /// [Error::Fatal] is returned.
    pub fn run(&self, chunks: &[Chunk<'_>]) -> Result<Vec<WorkerResult>, Error> {
        info!("dispatching {} workers", chunks.len());
        let processor = self.processor.as_ref();

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(chunks.len());
            let mut fatal = None;
            for chunk in chunks {
                let spawned = thread::Builder::new()
                    .name(format!("chunk-{}", chunk.index))
                    .spawn_scoped(scope, move || {
                        debug!("worker for chunk {} started", chunk.index);
                        let result = processor.process(chunk);
                        debug!(
                            "worker for chunk {} counted {} words in {:.2?}",
                            chunk.index,
                            result.word_count,
                            result.elapsed()
                        );
                        result
                    });
                match spawned {
                    Ok(handle) => handles.push((chunk, handle)),
                    Err(source) => {
                        fatal = Some(Error::Fatal {
                            chunk_index: chunk.index,
                            source,
                        });
                        break;
                    }
                }
            }

            let mut results = Vec::with_capacity(handles.len());
            let mut failures = Vec::new();
            for (chunk, handle) in handles {
                match handle.join() {
                    Ok(result) => {
                        if result.word_count != chunk.word_count {
                            warn!(
                                "chunk {} was assigned {} words but its worker counted {}",
                                chunk.index, chunk.word_count, result.word_count
                            );
                        }
                        results.push(result);
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        warn!("worker for chunk {} failed: {}", chunk.index, message);
                        failures.push(WorkerFailure {
                            chunk_index: chunk.index,
                            message,
                        });
                    }
                }
            }

            if let Some(error) = fatal {
                return Err(error);
            }
            if !failures.is_empty() {
                failures.sort_by_key(|failure| failure.chunk_index);
                return Err(Error::WorkerFailed { failures });
            }
            results.sort_by_key(|result| result.chunk_index);
            Ok(results)
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
