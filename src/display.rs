use std::{
    io::{self, Write},
    time::{SystemTime, UNIX_EPOCH},
};

use docproc::{Chunk, Report};

fn millis(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Prints one block per chunk followed by the total.
pub fn write_report(out: &mut impl Write, chunks: &[Chunk], report: &Report, top: Option<usize>) -> io::Result<()> {
    for (chunk, result) in chunks.iter().zip(report.chunks.iter()) {
        writeln!(out, "Chunk {}", chunk.index + 1)?;
        writeln!(out, "  text: {:?}", chunk.text)?;
        writeln!(out, "  word count: {}", result.word_count)?;
        writeln!(
            out,
            "  start: {} ms, end: {} ms, elapsed: {:.2?}",
            millis(result.start_time),
            millis(result.end_time),
            result.elapsed()
        )?;
        let words = result.most_frequent(top);
        let width = words.iter().map(|(word, _)| word.chars().count()).max().unwrap_or(0);
        writeln!(out, "  word frequency:")?;
        for (word, count) in words {
            writeln!(out, "    {: <width$} {}", word, count, width = width)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "Total Word Count: {}", report.total_word_count)
}
