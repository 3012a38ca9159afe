use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread,
    time::{Duration, SystemTime},
};

use docproc::{
    aggregate,
    config::ProcessorConfig,
    partition, process,
    run_stats::RunStats,
    trace::{Trace, TraceEvent},
    words,
    worker::{count_words, word_frequency},
    Chunk, ChunkProcessor, Dispatcher, Error, InvalidInput, WordCounter, WorkerResult,
};

const FOX: &str = "the quick brown fox jumps over the lazy dog";

const POEM: &str = "  Tyger Tyger, burning bright,\n\tIn the forests of the night;\nWhat immortal hand or eye,\r\n\
                    Could frame thy fearful symmetry?  \u{3000}Tyger  ";

fn frequency(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
    pairs.iter().map(|(word, count)| (word.to_string(), *count)).collect()
}

fn invalid_input(result: Result<Vec<Chunk<'_>>, Error>) -> InvalidInput {
    match result {
        Err(Error::InvalidInput(reason)) => reason,
        other => panic!("expected invalid input, got {:?}", other),
    }
}

#[test]
fn partition_example() {
    let chunks = partition(FOX, 3).unwrap();
    let texts = chunks.iter().map(|chunk| chunk.text).collect::<Vec<_>>();
    assert_eq!(texts, vec!["the quick brown", "fox jumps over", "the lazy dog"]);
    assert_eq!(
        chunks.iter().map(|chunk| chunk.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(chunks.iter().all(|chunk| chunk.word_count == 3));
}

#[test]
fn partition_keeps_every_word_once_in_order() {
    let all_words = words(POEM).collect::<Vec<_>>();
    assert_eq!(all_words.len(), 21);
    for workers in 1..=all_words.len() {
        let chunks = partition(POEM, workers).unwrap();
        assert_eq!(chunks.len(), workers);
        assert!(chunks.iter().all(|chunk| chunk.word_count > 0));

        let rebuilt = chunks.iter().flat_map(|chunk| words(chunk.text)).collect::<Vec<_>>();
        assert_eq!(rebuilt, all_words, "workers = {}", workers);

        let sizes = chunks.iter().map(|chunk| chunk.word_count).collect::<Vec<_>>();
        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        assert!(max - min <= 1, "uneven chunks {:?}", sizes);
        assert!(sizes.windows(2).all(|pair| pair[0] >= pair[1]));
    }
}

#[test]
fn partition_chunks_are_trimmed_substrings() {
    let chunks = partition(POEM, 4).unwrap();
    for chunk in chunks.iter() {
        assert!(POEM.contains(chunk.text));
        assert_eq!(chunk.text, chunk.text.trim());
    }
    assert_eq!(chunks[0].text, "Tyger Tyger, burning bright,\n\tIn the");
    assert!(chunks[3].text.ends_with("\u{3000}Tyger"));
}

#[test]
fn partition_rejects_blank_document() {
    assert_eq!(invalid_input(partition("", 1)), InvalidInput::BlankDocument);
    assert_eq!(invalid_input(partition("   ", 1)), InvalidInput::BlankDocument);
    assert_eq!(invalid_input(partition(" \n\t\r\n ", 3)), InvalidInput::BlankDocument);
}

#[test]
fn partition_rejects_too_many_workers() {
    assert_eq!(
        invalid_input(partition("hello", 2)),
        InvalidInput::TooManyWorkers { workers: 2, words: 1 }
    );
    assert_eq!(
        invalid_input(partition(FOX, 10)),
        InvalidInput::TooManyWorkers { workers: 10, words: 9 }
    );
    assert_eq!(partition(FOX, 9).unwrap().len(), 9);
}

#[test]
fn partition_rejects_zero_workers() {
    assert_eq!(invalid_input(partition(FOX, 0)), InvalidInput::NoWorkers);
}

#[test]
fn word_counter_counts_chunk_only() {
    let chunks = partition(FOX, 3).unwrap();
    let first = WordCounter.process(&chunks[0]);
    assert_eq!(first.chunk_index, 0);
    assert_eq!(first.word_count, 3);
    assert_eq!(first.frequency, frequency(&[("the", 1), ("quick", 1), ("brown", 1)]));
    assert!(first.end_time >= first.start_time);

    let last = WordCounter.process(&chunks[2]);
    assert_eq!(last.frequency, frequency(&[("the", 1), ("lazy", 1), ("dog", 1)]));
}

#[test]
fn word_frequency_matches_occurrences() {
    let text = "a b a  c\nb a A";
    let map = word_frequency(text);
    assert_eq!(map, frequency(&[("a", 3), ("b", 2), ("c", 1), ("A", 1)]));
    assert_eq!(map.values().sum::<usize>(), count_words(text));
    assert_eq!(count_words(text), 7);
}

#[test]
fn process_example() {
    let report = process(FOX, 3).unwrap();
    assert_eq!(report.total_word_count, 9);
    assert_eq!(report.chunks.len(), 3);
    assert_eq!(
        report.chunks[0].frequency,
        frequency(&[("the", 1), ("quick", 1), ("brown", 1)])
    );
    assert_eq!(report.chunks[2].frequency, frequency(&[("the", 1), ("lazy", 1), ("dog", 1)]));
    assert_eq!(report.merged_frequency()["the"], 2);
}

#[test]
fn process_invalid_input() {
    assert!(matches!(
        process("hello", 2),
        Err(Error::InvalidInput(InvalidInput::TooManyWorkers { workers: 2, words: 1 }))
    ));
    for workers in 1..4 {
        assert!(matches!(
            process("   ", workers),
            Err(Error::InvalidInput(InvalidInput::BlankDocument))
        ));
    }
}

#[test]
fn total_does_not_depend_on_worker_count() {
    let whole = count_words(POEM);
    for workers in 1..=whole {
        let report = process(POEM, workers).unwrap();
        assert_eq!(report.total_word_count, whole);
        assert_eq!(
            report.chunks.iter().map(|result| result.word_count).sum::<usize>(),
            whole
        );
        for result in report.chunks.iter() {
            assert_eq!(result.frequency.values().sum::<usize>(), result.word_count);
        }
    }
}

/// Makes earlier chunks finish later and records the completion order.
struct ReverseOrder {
    chunks: usize,
    completed: Mutex<Vec<usize>>,
}

impl ChunkProcessor for ReverseOrder {
    fn process(&self, chunk: &Chunk) -> WorkerResult {
        thread::sleep(Duration::from_millis(40 * (self.chunks - chunk.index) as u64));
        let result = WordCounter.process(chunk);
        self.completed.lock().unwrap().push(chunk.index);
        result
    }
}

#[test]
fn dispatcher_orders_results_by_chunk() {
    let chunks = partition(POEM, 4).unwrap();
    let processor: &'static ReverseOrder = Box::leak(Box::new(ReverseOrder {
        chunks: chunks.len(),
        completed: Mutex::new(Vec::new()),
    }));
    let results = Dispatcher::with_processor(Box::new(ProcessorRef(processor)))
        .run(&chunks)
        .unwrap();

    assert_eq!(*processor.completed.lock().unwrap(), vec![3, 2, 1, 0]);
    assert_eq!(
        results.iter().map(|result| result.chunk_index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    for (chunk, result) in chunks.iter().zip(results.iter()) {
        assert_eq!(result.word_count, chunk.word_count);
    }
}

/// Lets a test keep access to the processor it hands to the dispatcher.
struct ProcessorRef(&'static ReverseOrder);

impl ChunkProcessor for ProcessorRef {
    fn process(&self, chunk: &Chunk) -> WorkerResult {
        self.0.process(chunk)
    }
}

/// Panics on odd chunks, even chunks finish after a delay.
struct FailOdd {
    finished: &'static AtomicUsize,
}

impl ChunkProcessor for FailOdd {
    fn process(&self, chunk: &Chunk) -> WorkerResult {
        if chunk.index % 2 == 1 {
            panic!("chunk {} interrupted", chunk.index);
        }
        thread::sleep(Duration::from_millis(50));
        self.finished.fetch_add(1, Ordering::SeqCst);
        WordCounter.process(chunk)
    }
}

#[test]
fn dispatcher_reports_failed_workers_after_barrier() {
    let finished: &'static AtomicUsize = Box::leak(Box::new(AtomicUsize::new(0)));
    let chunks = partition(FOX, 5).unwrap();
    let error = Dispatcher::with_processor(Box::new(FailOdd { finished }))
        .run(&chunks)
        .unwrap_err();

    // All healthy workers ran to completion before the error was returned.
    assert_eq!(finished.load(Ordering::SeqCst), 3);
    assert_eq!(error.failed_chunks(), vec![1, 3]);
    match error {
        Error::WorkerFailed { failures } => {
            assert_eq!(failures[0].message, "chunk 1 interrupted");
            assert_eq!(failures[1].message, "chunk 3 interrupted");
        }
        other => panic!("expected worker failure, got {:?}", other),
    }
}

#[test]
fn dispatcher_single_chunk() {
    let chunks = partition("hello", 1).unwrap();
    let results = Dispatcher::new().run(&chunks).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].frequency, frequency(&[("hello", 1)]));
}

/// Reports one word more than the chunk has.
struct Miscount;

impl ChunkProcessor for Miscount {
    fn process(&self, chunk: &Chunk) -> WorkerResult {
        let mut result = WordCounter.process(chunk);
        result.word_count += 1;
        result
    }
}

#[test]
fn dispatcher_keeps_worker_count_on_mismatch() {
    let chunks = partition(FOX, 3).unwrap();
    let results = Dispatcher::with_processor(Box::new(Miscount)).run(&chunks).unwrap();
    assert_eq!(
        results.iter().map(|result| result.word_count).collect::<Vec<_>>(),
        vec![4, 4, 4]
    );
    assert_eq!(aggregate(results).total_word_count, 12);
}

#[test]
fn error_messages_are_not_repeated() {
    let too_many = process("hello", 2).unwrap_err();
    assert_eq!(
        format!("{:#}", anyhow::Error::from(too_many)),
        "number of workers (2) exceeds the number of words in the document (1)"
    );

    let blank = process("   ", 1).unwrap_err();
    assert!(std::error::Error::source(&blank).is_none());
    assert_eq!(format!("{:#}", anyhow::Error::from(blank)), "document is blank");

    let fatal = Error::Fatal {
        chunk_index: 2,
        source: std::io::Error::new(std::io::ErrorKind::WouldBlock, "no more threads"),
    };
    assert_eq!(fatal.to_string(), "can't start worker for chunk 2");
    assert_eq!(
        format!("{:#}", anyhow::Error::from(fatal)),
        "can't start worker for chunk 2: no more threads"
    );
}

#[test]
fn most_frequent_words() {
    let report = process("b a c b a d b e", 1).unwrap();
    let result = &report.chunks[0];
    assert_eq!(
        result.most_frequent(None),
        vec![("b", 3), ("a", 2), ("c", 1), ("d", 1), ("e", 1)]
    );
    assert_eq!(result.most_frequent(Some(3)), vec![("b", 3), ("a", 2), ("c", 1)]);
    assert_eq!(result.most_frequent(Some(10)).len(), 5);
    assert!(result.most_frequent(Some(0)).is_empty());
}

fn result_at(chunk_index: usize, word_count: usize, start_ms: u64, end_ms: u64) -> WorkerResult {
    let origin = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    WorkerResult {
        chunk_index,
        word_count,
        frequency: frequency(&[("w", word_count)]),
        start_time: origin + Duration::from_millis(start_ms),
        end_time: origin + Duration::from_millis(end_ms),
    }
}

#[test]
fn aggregate_sums_and_orders() {
    let report = aggregate(vec![result_at(2, 4, 0, 10), result_at(0, 5, 0, 30), result_at(1, 1, 5, 20)]);
    assert_eq!(report.total_word_count, 10);
    assert_eq!(
        report.chunks.iter().map(|result| result.chunk_index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    // Per-chunk maps are left as they are.
    assert_eq!(report.chunk(1).unwrap().frequency, frequency(&[("w", 1)]));
    assert_eq!(report.merged_frequency(), frequency(&[("w", 10)]));
}

#[test]
fn run_stats_from_report() {
    let report = aggregate(vec![result_at(0, 5, 0, 30), result_at(1, 4, 10, 20), result_at(2, 1, 5, 45)]);
    let stats = RunStats::from_report(&report);
    assert_eq!(stats.total_word_count, 10);
    assert_eq!(stats.chunk_count, 3);
    assert_eq!(stats.distinct_words, 1);
    assert!((stats.makespan - 0.045).abs() < 1e-9);
    assert!((stats.min_worker_time - 0.010).abs() < 1e-9);
    assert!((stats.max_worker_time - 0.040).abs() < 1e-9);
    assert!((stats.average_worker_time - 0.080 / 3.0).abs() < 1e-9);
}

#[test]
fn trace_is_chronological() {
    let report = aggregate(vec![result_at(0, 5, 0, 30), result_at(1, 4, 10, 20)]);
    let trace = Trace::from_report(&report);
    assert_eq!(trace.total_word_count, 9);
    assert_eq!(
        trace.events,
        vec![
            TraceEvent::WorkerStarted {
                time: 0.0,
                chunk_index: 0
            },
            TraceEvent::WorkerStarted {
                time: 0.01,
                chunk_index: 1
            },
            TraceEvent::WorkerCompleted {
                time: 0.02,
                chunk_index: 1,
                word_count: 4
            },
            TraceEvent::WorkerCompleted {
                time: 0.03,
                chunk_index: 0,
                word_count: 5
            },
        ]
    );
}

#[test]
fn report_serializes_to_json() {
    let report = process(FOX, 2).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    let restored: docproc::Report = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, report);
}

#[test]
fn config_from_yaml() {
    let config = ProcessorConfig::from_yaml_str("workers: 3\nmax_workers: 4\ntrace: trace.json\n").unwrap();
    assert_eq!(config.workers, 3);
    assert_eq!(config.max_workers, Some(4));
    assert_eq!(config.trace, Some("trace.json".into()));
    config.validate().unwrap();

    let config = ProcessorConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, ProcessorConfig::default());
}

#[test]
fn config_validation() {
    let config = ProcessorConfig::from_yaml_str("workers: 5\nmax_workers: 4\n").unwrap();
    assert!(matches!(
        config.validate(),
        Err(Error::InvalidInput(InvalidInput::WorkerLimitExceeded { workers: 5, limit: 4 }))
    ));
    let config = ProcessorConfig::from_yaml_str("workers: 0\n").unwrap();
    assert!(matches!(
        config.validate(),
        Err(Error::InvalidInput(InvalidInput::NoWorkers))
    ));
    assert!(matches!(
        ProcessorConfig::from_yaml_str("workers: many\n"),
        Err(Error::Config { .. })
    ));
    assert!(matches!(
        ProcessorConfig::from_yaml("does/not/exist.yaml"),
        Err(Error::Config { .. })
    ));
}
