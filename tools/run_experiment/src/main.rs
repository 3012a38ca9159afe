use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use docproc::experiment::{Experiment, ExperimentConfig, Plan, RunResult};
use env_logger::Builder;
use itertools::Itertools;

/// Runs every document from the config with every worker count and compares worker counts.
#[derive(Parser, Debug)]
struct Args {
    /// Path to config.
    #[arg(short, long)]
    config: PathBuf,

    /// Path to file with results.
    #[arg(short, long)]
    output: PathBuf,

    /// Do not run experiments, just read results from --output.
    #[arg(long)]
    precalculated: bool,

    /// Number of runs executed at the same time.
    #[arg(long, default_value_t = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))]
    threads: usize,
}

fn filename(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct ResultRow {
    workers: usize,
    runs: usize,
    failed: usize,
    avg_makespan: f64,
    avg_slowdown: f64,
    max_slowdown: f64,
    avg_max_worker_time: f64,
}

fn summarize(result: &[RunResult]) -> Vec<ResultRow> {
    let mut best_makespan: HashMap<&str, f64> = HashMap::new();
    for run in result.iter() {
        if let Some(stats) = &run.run_stats {
            let best = best_makespan.entry(&run.document).or_insert(f64::MAX);
            *best = best.min(stats.makespan);
        }
    }

    let mut by_workers: BTreeMap<usize, Vec<&RunResult>> = BTreeMap::new();
    for run in result.iter() {
        by_workers.entry(run.workers).or_default().push(run);
    }

    by_workers
        .into_iter()
        .map(|(workers, runs)| {
            let succeeded = runs
                .iter()
                .filter_map(|run| run.run_stats.as_ref().map(|stats| (run.document.as_str(), stats)))
                .collect::<Vec<_>>();
            let count = succeeded.len().max(1) as f64;
            let slowdowns = succeeded
                .iter()
                .map(|(document, stats)| {
                    let best = best_makespan[document];
                    if best > 0.0 {
                        stats.makespan / best
                    } else {
                        1.0
                    }
                })
                .collect::<Vec<_>>();
            ResultRow {
                workers,
                runs: runs.len(),
                failed: runs.len() - succeeded.len(),
                avg_makespan: succeeded.iter().map(|(_, stats)| stats.makespan).sum::<f64>() / count * 1000.,
                avg_slowdown: slowdowns.iter().sum::<f64>() / count,
                max_slowdown: slowdowns.iter().copied().fold(0.0, f64::max),
                avg_max_worker_time: succeeded.iter().map(|(_, stats)| stats.max_worker_time).sum::<f64>() / count
                    * 1000.,
            }
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();

    let result: Vec<RunResult> = if args.precalculated {
        serde_json::from_str(&std::fs::read_to_string(&args.output).context("Can't read file with result")?)
            .context("Can't parse file with result")?
    } else {
        let config = ExperimentConfig::from_yaml(&args.config)?;
        let experiment = Experiment::new(
            config
                .documents
                .into_iter()
                .enumerate()
                .map(|(i, path)| Plan {
                    name: format!("{}_{}", i, filename(&path)),
                    document_path: path,
                })
                .collect(),
            config.worker_counts,
        );

        let result = experiment.run(args.threads);
        File::create(&args.output)
            .context("Can't create output file")?
            .write_all(serde_json::to_string_pretty(&result)?.as_bytes())
            .context("Can't write to output file")?;
        result
    };

    for run in result.iter().filter(|run| run.error.is_some()) {
        println!(
            "{} with {} workers failed: {}",
            run.document,
            run.workers,
            run.error.as_deref().unwrap_or_default()
        );
    }

    let rows = summarize(&result);
    println!("| workers | runs | failed | avg makespan, ms | avg slowdown | max slowdown | avg slowest worker, ms |");
    println!("|---------|------|--------|------------------|--------------|--------------|------------------------|");
    println!(
        "{}",
        rows.iter()
            .map(|row| format!(
                "| {: >7} | {: >4} | {: >6} | {: >16.3} | {: >12.3} | {: >12.3} | {: >22.3} |",
                row.workers,
                row.runs,
                row.failed,
                row.avg_makespan,
                row.avg_slowdown,
                row.max_slowdown,
                row.avg_max_worker_time
            ))
            .join("\n")
    );
    Ok(())
}
