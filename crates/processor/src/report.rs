//! Final result of a processing run.

use log::info;
use serde::{Deserialize, Serialize};

use crate::worker::{WordFrequency, WorkerResult};

/// Results of all workers of one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Sum of word counts of all chunks.
    pub total_word_count: usize,
    /// Per-chunk results ordered by chunk index. Frequency maps are not merged.
    pub chunks: Vec<WorkerResult>,
}

/// Combines worker results into a [Report].
pub fn aggregate(mut results: Vec<WorkerResult>) -> Report {
    results.sort_by_key(|result| result.chunk_index);
    let total_word_count = results.iter().map(|result| result.word_count).sum();
    info!("{} chunks processed, total word count {}", results.len(), total_word_count);
    Report {
        total_word_count,
        chunks: results,
    }
}

impl Report {
    pub fn chunk(&self, index: usize) -> Option<&WorkerResult> {
        self.chunks.iter().find(|result| result.chunk_index == index)
    }

    /// Word frequencies over the whole document. Computed on request, the report keeps only
    /// per-chunk maps.
    pub fn merged_frequency(&self) -> WordFrequency {
        let mut merged = WordFrequency::new();
        for result in self.chunks.iter() {
            for (word, count) in result.frequency.iter() {
                *merged.entry(word.clone()).or_default() += count;
            }
        }
        merged
    }
}
