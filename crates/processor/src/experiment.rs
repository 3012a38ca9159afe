use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};
use threadpool::ThreadPool;

use crate::{error::Error, run_stats::RunStats};

/// Document taking part in an experiment.
#[derive(Clone, Debug)]
pub struct Plan {
    pub name: String,
    pub document_path: PathBuf,
}

struct Run {
    plan: Plan,
    workers: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub document: String,
    pub workers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_stats: Option<RunStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub documents: Vec<PathBuf>,
    pub worker_counts: Vec<usize>,
}

impl ExperimentConfig {
    /// Read [ExperimentConfig] from YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self, Error> {
        let path = file.as_ref();
        let config_error = |message: String| Error::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))
    }
}

pub struct Experiment {
    plans: Vec<Plan>,
    worker_counts: Vec<usize>,
    show_progress: bool,
}

impl Experiment {
    pub fn new(plans: Vec<Plan>, worker_counts: Vec<usize>) -> Self {
        Self {
            plans,
            worker_counts,
            show_progress: true,
        }
    }

    /// Disable progress line on stdout.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Runs every document with every worker count using `threads` threads for independent runs.
    /// Results are sorted by document name and worker count.
    pub fn run(self, threads: usize) -> Vec<RunResult> {
        let runs = self
            .plans
            .into_iter()
            .cartesian_product(self.worker_counts)
            .map(|(plan, workers)| Run { plan, workers })
            .collect::<Vec<_>>();

        let total_runs = runs.len();
        let show_progress = self.show_progress;

        let finished_run_atomic = Arc::new(AtomicUsize::new(0));
        let results = Arc::new(Mutex::new(Vec::new()));

        let pool = ThreadPool::new(threads.max(1));
        let start_time = Instant::now();
        for run in runs.into_iter() {
            let finished_run_atomic = finished_run_atomic.clone();
            let results = results.clone();
            pool.execute(move || {
                let outcome = std::fs::read_to_string(&run.plan.document_path)
                    .map_err(|e| format!("can't read {}: {}", run.plan.document_path.display(), e))
                    .and_then(|document| {
                        crate::process(&document, run.workers)
                            .map(|report| RunStats::from_report(&report))
                            .map_err(|e| e.to_string())
                    });
                if let Err(e) = &outcome {
                    warn!("run {} with {} workers failed: {}", run.plan.name, run.workers, e);
                }

                let (run_stats, error) = match outcome {
                    Ok(run_stats) => (Some(run_stats), None),
                    Err(e) => (None, Some(e)),
                };
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(RunResult {
                        document: run.plan.name,
                        workers: run.workers,
                        run_stats,
                        error,
                    });

                let finished_runs = finished_run_atomic.fetch_add(1, Ordering::SeqCst) + 1;
                if !show_progress {
                    return;
                }
                let elapsed = start_time.elapsed();
                let remaining = Duration::from_secs_f64(
                    elapsed.as_secs_f64() / finished_runs as f64 * (total_runs - finished_runs) as f64,
                );
                print!("\r{}", " ".repeat(70));
                print!(
                    "\rFinished {}/{} [{}%] runs in {:.2?}, remaining time: {:.2?}",
                    finished_runs,
                    total_runs,
                    (finished_runs as f64 * 100. / total_runs as f64).round() as i32,
                    elapsed,
                    remaining
                );
                let _ = std::io::stdout().flush();
            });
        }

        pool.join();

        if show_progress {
            print!("\r{}", " ".repeat(70));
            println!("\rFinished {} runs in {:.2?}", total_runs, start_time.elapsed());
        }

        let mut results = std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));
        results.sort_by(|a, b| a.document.cmp(&b.document).then(a.workers.cmp(&b.workers)));
        results
    }
}
