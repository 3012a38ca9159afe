//! Splitting a document into words and contiguous chunks.

use std::ops::Range;

use log::debug;

use crate::error::{Error, InvalidInput};

/// Contiguous part of a document assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Position of the chunk in the document, starting from 0.
    pub index: usize,
    /// Text from the start of the first word to the end of the last word of the chunk.
    pub text: &'a str,
    /// Number of words assigned to the chunk by [partition].
    pub word_count: usize,
}

/// Whitespace-delimited words of `text`.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Byte ranges of whitespace-delimited words of `text`.
pub fn word_spans(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let &(start, _) = chars.peek()?;
        let mut end = start;
        while let Some((i, c)) = chars.next_if(|(_, c)| !c.is_whitespace()) {
            end = i + c.len_utf8();
        }
        Some(start..end)
    })
}

/// Splits `document` into `workers` chunks of consecutive words.
///
/// Every chunk gets `W / workers` words and the first `W % workers` chunks get one more, where `W`
/// is the number of words in the document. Fails if the document has no words or if some chunk
/// would be empty.
pub fn partition(document: &str, workers: usize) -> Result<Vec<Chunk<'_>>, Error> {
    let spans = word_spans(document).collect::<Vec<_>>();
    if spans.is_empty() {
        return Err(InvalidInput::BlankDocument.into());
    }
    if workers == 0 {
        return Err(InvalidInput::NoWorkers.into());
    }
    if workers > spans.len() {
        return Err(InvalidInput::TooManyWorkers {
            workers,
            words: spans.len(),
        }
        .into());
    }

    let base = spans.len() / workers;
    let extra = spans.len() % workers;
    let mut chunks = Vec::with_capacity(workers);
    let mut first = 0;
    for index in 0..workers {
        let word_count = base + usize::from(index < extra);
        let last = first + word_count - 1;
        let text = &document[spans[first].start..spans[last].end];
        debug!(
            "chunk {} covers words {}..={} (bytes {}..{})",
            index, first, last, spans[first].start, spans[last].end
        );
        chunks.push(Chunk {
            index,
            text,
            word_count,
        });
        first += word_count;
    }
    Ok(chunks)
}
