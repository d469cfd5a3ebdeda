//! Clause segmentation: document text → ordered, non-overlapping spans.
//!
//! Splitting prefers structural cues (numbered/lettered section headings,
//! blank-line paragraph breaks), falls back to sentence boundaries, and for
//! pathological input with no cues at all falls back to fixed-size word
//! windows. The segmenter always terminates and always yields at least one
//! span for non-empty input; boilerplate between spans may be skipped.

use lexplain_core::{ClauseSpan, Document};
use thiserror::Error;
use unicode_segmentation::{USentenceBoundIndices, UWordBoundIndices, UnicodeSegmentation};

/// Window size, in words, for the no-cues-at-all fallback.
const WINDOW_WORDS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("document text is empty or whitespace-only")]
pub struct EmptyInputError;

/// Splits document text into clause spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter;

impl Segmenter {
    pub fn new() -> Self {
        Self
    }

    /// Lazily segment a document.
    ///
    /// The returned iterator is `Clone`, so a pass can be restarted from the
    /// beginning at any point. Fails only for empty or whitespace-only text.
    pub fn segment<'a>(&self, doc: &'a Document) -> Result<Clauses<'a>, EmptyInputError> {
        let text = doc.text.as_str();
        if text.trim().is_empty() {
            return Err(EmptyInputError);
        }

        let inner = if has_structural_cues(text) {
            ClausesInner::Structural { text, pos: 0 }
        } else if sentence_count_at_least(text, 2) {
            ClausesInner::Sentence {
                iter: text.split_sentence_bound_indices(),
            }
        } else if text.unicode_words().take(WINDOW_WORDS + 1).count() > WINDOW_WORDS {
            ClausesInner::Window {
                text,
                iter: text.split_word_bound_indices(),
            }
        } else {
            // One short cue-less block: a single sentence span.
            ClausesInner::Sentence {
                iter: text.split_sentence_bound_indices(),
            }
        };

        Ok(Clauses { inner })
    }
}

/// Lazy, restartable iterator of clause spans.
#[derive(Debug, Clone)]
pub struct Clauses<'a> {
    inner: ClausesInner<'a>,
}

#[derive(Debug, Clone)]
enum ClausesInner<'a> {
    Structural { text: &'a str, pos: usize },
    Sentence { iter: USentenceBoundIndices<'a> },
    Window { text: &'a str, iter: UWordBoundIndices<'a> },
}

impl<'a> Iterator for Clauses<'a> {
    type Item = ClauseSpan;

    fn next(&mut self) -> Option<ClauseSpan> {
        match &mut self.inner {
            ClausesInner::Structural { text, pos } => next_structural(text, pos),
            ClausesInner::Sentence { iter } => {
                for (off, raw) in iter.by_ref() {
                    if let Some(span) = trimmed_span(off, raw) {
                        return Some(span);
                    }
                }
                None
            }
            ClausesInner::Window { text, iter } => next_window(text, iter),
        }
    }
}

/// Advance through one structural block: from the current position to the
/// next blank line or heading line.
fn next_structural(text: &str, pos: &mut usize) -> Option<ClauseSpan> {
    loop {
        let rest = &text[*pos..];
        let skipped = rest.len() - rest.trim_start().len();
        *pos += skipped;
        if *pos >= text.len() {
            return None;
        }

        let rest = &text[*pos..];
        let mut end = rest.len();
        let mut line_start = match rest.find('\n') {
            Some(i) => i + 1,
            None => rest.len(),
        };
        while line_start < rest.len() {
            let line_end = rest[line_start..]
                .find('\n')
                .map(|i| line_start + i)
                .unwrap_or(rest.len());
            let line = &rest[line_start..line_end];
            if line.trim().is_empty() || is_heading(line) {
                end = line_start;
                break;
            }
            line_start = line_end + 1;
        }

        let span = trimmed_span(*pos, &rest[..end]);
        *pos += end;
        if let Some(span) = span {
            return Some(span);
        }
    }
}

/// Accumulate up to [`WINDOW_WORDS`] words into one span.
fn next_window(text: &str, iter: &mut UWordBoundIndices<'_>) -> Option<ClauseSpan> {
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut words = 0;

    for (off, chunk) in iter.by_ref() {
        if chunk.trim().is_empty() {
            continue;
        }
        if start.is_none() {
            start = Some(off);
        }
        end = off + chunk.len();
        if chunk.chars().any(char::is_alphanumeric) {
            words += 1;
            if words == WINDOW_WORDS {
                break;
            }
        }
    }

    // start/end already exclude surrounding whitespace.
    let start = start?;
    Some(ClauseSpan::new(start, end, &text[start..end]))
}

/// Trim a raw block and produce a span with offsets into the document.
fn trimmed_span(off: usize, raw: &str) -> Option<ClauseSpan> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = off + (raw.len() - raw.trim_start().len());
    let end = start + trimmed.len();
    Some(ClauseSpan::new(start, end, trimmed))
}

/// Structural cues: a heading line after earlier content, or a blank line
/// separating two content blocks.
fn has_structural_cues(text: &str) -> bool {
    let mut seen_content = false;
    let mut blank_after_content = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            if seen_content {
                blank_after_content = true;
            }
        } else {
            if seen_content && is_heading(line) {
                return true;
            }
            if blank_after_content {
                return true;
            }
            seen_content = true;
        }
    }
    false
}

/// Heading shapes: `3.` / `12)` / `4:`, `(a)` / `(iv)`, and
/// `Section 5` / `Article 12` / `Clause 3` (case-insensitive).
fn is_heading(line: &str) -> bool {
    let t = line.trim_start();
    let bytes = t.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    let digit_end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    if digit_end > 0 && digit_end < bytes.len() && matches!(bytes[digit_end], b'.' | b')' | b':') {
        return true;
    }

    if bytes[0] == b'(' {
        if let Some(close) = t.find(')') {
            let inner = &t[1..close];
            if (1..=4).contains(&inner.len()) && inner.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return true;
            }
        }
    }

    for kw in ["section ", "article ", "clause "] {
        if let Some(prefix) = t.get(..kw.len())
            && prefix.eq_ignore_ascii_case(kw)
        {
            let rest = t[kw.len()..].trim_start();
            if rest
                .bytes()
                .next()
                .is_some_and(|b| b.is_ascii_digit())
            {
                return true;
            }
        }
    }

    false
}

fn sentence_count_at_least(text: &str, n: usize) -> bool {
    text.split_sentence_bound_indices()
        .filter(|(_, s)| !s.trim().is_empty())
        .take(n)
        .count()
        >= n
}
