use std::{fs::File, io::BufWriter, path::Path, time::SystemTime};

use serde::{Deserialize, Serialize};

use crate::report::Report;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TraceEvent {
    WorkerStarted {
        time: f64,
        chunk_index: usize,
    },
    WorkerCompleted {
        time: f64,
        chunk_index: usize,
        word_count: usize,
    },
}

impl TraceEvent {
    pub fn time(&self) -> f64 {
        match self {
            TraceEvent::WorkerStarted { time, .. } | TraceEvent::WorkerCompleted { time, .. } => *time,
        }
    }
}

/// Worker events with times in seconds since the first worker started.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trace {
    pub total_word_count: usize,
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new(total_word_count: usize) -> Self {
        Self {
            total_word_count,
            events: Vec::new(),
        }
    }

    pub fn log(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    /// Builds a chronologically ordered trace from worker timestamps.
    pub fn from_report(report: &Report) -> Self {
        let mut trace = Trace::new(report.total_word_count);
        let Some(origin) = report.chunks.iter().map(|result| result.start_time).min() else {
            return trace;
        };
        let offset = |time: SystemTime| time.duration_since(origin).unwrap_or_default().as_secs_f64();
        for result in report.chunks.iter() {
            trace.log(TraceEvent::WorkerStarted {
                time: offset(result.start_time),
                chunk_index: result.chunk_index,
            });
            trace.log(TraceEvent::WorkerCompleted {
                time: offset(result.end_time),
                chunk_index: result.chunk_index,
                word_count: result.word_count,
            });
        }
        trace.events.sort_by(|a, b| a.time().total_cmp(&b.time()));
        trace
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
