//! Keyword/pattern matching against the configured phrase table.
//!
//! Matching is categorical and strength-graded: canonical phrases hit at
//! strength 1.0, synonyms at their configured strength in [0.3, 0.9]. A
//! clause may hit several categories at once, and zero hits is the normal
//! outcome for boilerplate.

use lexplain_core::{ClauseSpan, PatternCategory, PatternMatch, PhraseTable};
use tracing::trace;

use crate::fold::Folded;

/// One pre-folded table phrase.
#[derive(Debug, Clone)]
struct CompiledPhrase {
    phrase: String,
    folded: String,
    strength: f32,
}

/// Phrase matcher compiled from a [`PhraseTable`].
///
/// Compilation folds every phrase once; matching then folds each clause and
/// scans for phrase occurrences that start on a word boundary, so `penalty`
/// hits `Penalty,` and `PÉNALTY` but not `subpenalty`.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    compiled: Vec<(PatternCategory, Vec<CompiledPhrase>)>,
}

impl PatternMatcher {
    pub fn new(table: &PhraseTable) -> Self {
        let compiled = PatternCategory::ALL
            .iter()
            .map(|&category| {
                let entry = table.phrases(category);
                let mut phrases = Vec::with_capacity(entry.canonical.len() + entry.synonyms.len());
                for phrase in &entry.canonical {
                    phrases.push(CompiledPhrase {
                        phrase: phrase.clone(),
                        folded: Folded::phrase(phrase),
                        strength: 1.0,
                    });
                }
                for syn in &entry.synonyms {
                    phrases.push(CompiledPhrase {
                        phrase: syn.phrase.clone(),
                        folded: Folded::phrase(&syn.phrase),
                        strength: syn.strength,
                    });
                }
                (category, phrases)
            })
            .collect();
        Self { compiled }
    }

    /// Find all pattern matches in one clause.
    ///
    /// At most one match is recorded per table phrase (its first
    /// occurrence), keeping records small and deterministic. Categories are
    /// scanned in tie-break order, phrases in table order.
    pub fn match_clause(&self, span: &ClauseSpan) -> Vec<PatternMatch> {
        let folded = Folded::fold(&span.text);
        let haystack = folded.text();
        let mut matches = Vec::new();

        for (category, phrases) in &self.compiled {
            for compiled in phrases {
                if let Some(pos) = find_word_start(haystack, &compiled.folded) {
                    let (start, end) = folded.source_range(pos, pos + compiled.folded.len());
                    matches.push(PatternMatch {
                        category: *category,
                        phrase: compiled.phrase.clone(),
                        matched_text: span.text[start..end].to_string(),
                        offset: start,
                        strength: compiled.strength,
                    });
                }
            }
        }

        trace!(
            clause_start = span.start,
            matches = matches.len(),
            "matched clause"
        );
        matches
    }
}

/// First occurrence of `needle` in `haystack` that starts on a word
/// boundary. The match may extend into a longer word (`cancel` hits
/// `cancelled`), mirroring the open-ended phrasing variants in contracts.
fn find_word_start(haystack: &str, needle: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let pos = from + rel;
        let at_word_start = pos == 0
            || !haystack.as_bytes()[pos - 1].is_ascii_alphanumeric();
        if at_word_start {
            return Some(pos);
        }
        // Advance past the first char of the rejected match, staying on a
        // char boundary.
        let step = haystack[pos..].chars().next().map_or(1, char::len_utf8);
        from = pos + step;
    }
    None
}
