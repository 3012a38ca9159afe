use std::{
    io::{Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::info;

use docproc::{aggregate, config::ProcessorConfig, partition, trace::Trace, Dispatcher};

mod display;

/// Splits a document into chunks and counts words of every chunk on a separate thread.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the document. Read from stdin if omitted.
    document: Option<PathBuf>,

    /// Number of workers, overrides the config.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path to config.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to save the worker timeline as JSON, overrides the config.
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Show only this many most frequent words of every chunk.
    #[arg(long)]
    top: Option<usize>,
}

fn read_document(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Can't read file {}", path.display())),
        None => {
            let mut document = String::new();
            std::io::stdin()
                .read_to_string(&mut document)
                .context("Can't read document from stdin")?;
            Ok(document)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ProcessorConfig::from_yaml(path)?,
        None => ProcessorConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(trace) = args.trace {
        config.trace = Some(trace);
    }
    config.validate()?;

    let document = read_document(args.document.as_ref())?;
    let chunks = partition(&document, config.workers)?;
    let results = Dispatcher::new().run(&chunks)?;
    let report = aggregate(results);

    if let Some(path) = &config.trace {
        Trace::from_report(&report)
            .save_json(path)
            .with_context(|| format!("Can't write trace to {}", path.display()))?;
        info!("saved trace to {}", path.display());
    }

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    } else {
        display::write_report(&mut stdout, &chunks, &report, args.top)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
