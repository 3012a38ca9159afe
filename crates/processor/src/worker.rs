//! Processing of a single chunk.

use std::{
    collections::BTreeMap,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};

use crate::partition::{words, Chunk};

/// Number of occurrences of every distinct word.
pub type WordFrequency = BTreeMap<String, usize>;

/// Result of processing one chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub chunk_index: usize,
    /// Number of words in the chunk, counted by the worker itself.
    pub word_count: usize,
    /// Word frequencies within this chunk only.
    pub frequency: WordFrequency,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
}

impl WorkerResult {
    /// Wall-clock time spent on the chunk. Zero if the system clock went backwards.
    pub fn elapsed(&self) -> Duration {
        self.end_time.duration_since(self.start_time).unwrap_or_default()
    }

    /// Most frequent words first, ties broken alphabetically. Keeps at most `top` words if given.
    pub fn most_frequent(&self, top: Option<usize>) -> Vec<(&str, usize)> {
        let mut words = self
            .frequency
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect::<Vec<_>>();
        words.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        if let Some(top) = top {
            words.truncate(top);
        }
        words
    }
}

/// Computes a [WorkerResult] for a chunk.
///
/// Implementations are shared between worker threads and must not keep per-chunk state.
pub trait ChunkProcessor: Sync {
    fn process(&self, chunk: &Chunk) -> WorkerResult;
}

/// Default processor: counts words and their frequencies.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordCounter;

impl ChunkProcessor for WordCounter {
    fn process(&self, chunk: &Chunk) -> WorkerResult {
        let start_time = SystemTime::now();
        let word_count = count_words(chunk.text);
        let frequency = word_frequency(chunk.text);
        WorkerResult {
            chunk_index: chunk.index,
            word_count,
            frequency,
            start_time,
            end_time: SystemTime::now(),
        }
    }
}

pub fn count_words(text: &str) -> usize {
    words(text).count()
}

pub fn word_frequency(text: &str) -> WordFrequency {
    let mut frequency = WordFrequency::new();
    for word in words(text) {
        *frequency.entry(word.to_string()).or_default() += 1;
    }
    frequency
}
