//! Some stats from a completed run.

use serde::{Deserialize, Serialize};

use crate::report::Report;

/// Some stats from a completed run. All times are in seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunStats {
    /// Total number of words in the document.
    pub total_word_count: usize,
    pub chunk_count: usize,
    /// Number of distinct words in the whole document.
    pub distinct_words: usize,
    /// Time between the first worker start and the last worker finish.
    pub makespan: f64,
    /// Average processing time of a worker.
    pub average_worker_time: f64,
    pub min_worker_time: f64,
    pub max_worker_time: f64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            total_word_count: 0,
            chunk_count: 0,
            distinct_words: 0,
            makespan: 0.0,
            average_worker_time: 0.0,
            min_worker_time: f64::MAX,
            max_worker_time: 0.0,
        }
    }

    /// Collect stats from a finished run.
    pub fn from_report(report: &Report) -> Self {
        let mut stats = RunStats::new();
        for result in report.chunks.iter() {
            stats.register_worker(result.word_count, result.elapsed().as_secs_f64());
        }
        stats.distinct_words = report.merged_frequency().len();

        let first_start = report.chunks.iter().map(|result| result.start_time).min();
        let last_end = report.chunks.iter().map(|result| result.end_time).max();
        let makespan = match (first_start, last_end) {
            (Some(start), Some(end)) => end.duration_since(start).unwrap_or_default().as_secs_f64(),
            _ => 0.0,
        };
        stats.finalize(makespan);
        stats
    }

    /// Register a finished worker which processed `word_count` words in `elapsed` seconds.
    pub fn register_worker(&mut self, word_count: usize, elapsed: f64) {
        self.average_worker_time =
            (self.average_worker_time * self.chunk_count as f64 + elapsed) / (self.chunk_count + 1) as f64;
        self.chunk_count += 1;
        self.total_word_count += word_count;
        self.max_worker_time = self.max_worker_time.max(elapsed);
        self.min_worker_time = self.min_worker_time.min(elapsed);
    }

    /// Finalize result given [makespan](RunStats::makespan).
    pub fn finalize(&mut self, makespan: f64) {
        self.makespan = makespan;
        if self.chunk_count == 0 {
            self.min_worker_time = 0.0;
        }
    }
}
