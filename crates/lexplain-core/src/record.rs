//! Shared value types for clause analysis results.
//!
//! Everything here is an immutable value object: records are created once by
//! the analysis pipeline and superseded, never mutated. This is what makes
//! concurrent per-request processing safe without shared locks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document text handed in by the surrounding application.
///
/// The engine never mutates the text; extraction (upload, OCR) happens
/// upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    /// BCP-47 language tag, e.g. `en` or `fr-CA`.
    pub language: String,
}

impl Document {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

/// A contiguous substring of a document treated as one classifiable unit.
///
/// Offsets are byte offsets into the source document. Spans produced by the
/// segmenter are non-overlapping, ordered by `start`, and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl ClauseSpan {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The five clause-signaling pattern families.
///
/// Declaration order is the tie-break priority: when two categories
/// contribute equal weighted strength to a clause score, the earlier variant
/// is reported as the primary risk driver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Penalty,
    Indemnification,
    Termination,
    AutoRenewal,
    OneSidedObligation,
}

impl PatternCategory {
    /// All categories in tie-break priority order.
    pub const ALL: [PatternCategory; 5] = [
        Self::Penalty,
        Self::Indemnification,
        Self::Termination,
        Self::AutoRenewal,
        Self::OneSidedObligation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Penalty => "penalty",
            Self::Indemnification => "indemnification",
            Self::Termination => "termination",
            Self::AutoRenewal => "auto_renewal",
            Self::OneSidedObligation => "one_sided_obligation",
        }
    }

    /// Human-readable label for explanations, e.g. `auto-renewal`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Penalty => "penalty",
            Self::Indemnification => "indemnification",
            Self::Termination => "termination",
            Self::AutoRenewal => "auto-renewal",
            Self::OneSidedObligation => "one-sided obligation",
        }
    }
}

impl std::fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence that a clause belongs to a risk category, with graded strength.
///
/// `phrase` is the table phrase that fired; `matched_text` is the clause
/// substring it matched (original casing); `offset` is the byte offset of
/// the match within the clause text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub category: PatternCategory,
    pub phrase: String,
    pub matched_text: String,
    pub offset: usize,
    /// Match strength in [0, 1]: 1.0 for a canonical phrase, graded for
    /// synonyms.
    pub strength: f32,
}

/// Risk classification level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explanation detail profile requested by the caller.
///
/// Ordered from least to most complex; graceful degradation walks downward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    VerySimple,
    Simple,
    Medium,
    Detailed,
    LegalDetailed,
}

impl DetailLevel {
    pub const ALL: [DetailLevel; 5] = [
        Self::VerySimple,
        Self::Simple,
        Self::Medium,
        Self::Detailed,
        Self::LegalDetailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerySimple => "very_simple",
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Detailed => "detailed",
            Self::LegalDetailed => "legal_detailed",
        }
    }

    /// The next level down, or `None` at the bottom.
    pub fn lower(&self) -> Option<DetailLevel> {
        match self {
            Self::VerySimple => None,
            Self::Simple => Some(Self::VerySimple),
            Self::Medium => Some(Self::Simple),
            Self::Detailed => Some(Self::Medium),
            Self::LegalDetailed => Some(Self::Detailed),
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-citation evidence attached to a record: the strongest match,
/// with document-absolute offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// The final, immutable scored-and-explained result for one clause.
///
/// The stored `matches` plus `ruleset_version` reproduce `score` exactly;
/// no score is persisted without its derivation inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub span: ClauseSpan,
    pub level: RiskLevel,
    /// Normalized risk score in [0, 1].
    pub score: f32,
    pub matches: Vec<PatternMatch>,
    /// Category reported as the main reason for the score, `None` when no
    /// patterns matched.
    pub primary_driver: Option<PatternCategory>,
    /// Classification confidence in [0, 1]: the strongest match strength,
    /// 1.0 for a clean no-match (confidently boilerplate), 0.0 when
    /// analysis was incomplete.
    pub confidence: f32,
    pub explanation: String,
    pub citation: Option<Citation>,
    pub detail_level: DetailLevel,
    pub ruleset_version: String,
    pub created_at: DateTime<Utc>,
    /// Set when the clause could not be analysed cleanly; such records are
    /// Low/0.0 with an explicit marker rather than aborting the document.
    pub incomplete: bool,
}

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Freshly computed this call.
    Live,
    /// Served from a fresh cache entry while online.
    Cached,
    /// Served from cache (fresh or stale) while offline; potentially
    /// outdated.
    OfflineFallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Cached => "cached",
            Self::OfflineFallback => "offline-fallback",
        }
    }

    /// Degradation rank: live < cached < offline-fallback.
    fn rank(&self) -> u8 {
        match self {
            Self::Live => 0,
            Self::Cached => 1,
            Self::OfflineFallback => 2,
        }
    }

    /// The more degraded of two sources.
    pub fn worse(self, other: Source) -> Source {
        if other.rank() > self.rank() { other } else { self }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache-freshness metadata returned alongside results.
///
/// `source` is the most degraded source among the contributing records and
/// `as_of` the oldest creation time, so callers can badge outdated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: Source,
    pub as_of: DateTime<Utc>,
}

/// Document-level result: ordered clause records plus the aggregate.
///
/// Aggregate level is the maximum of clause levels (a single High clause
/// makes the document High); the numeric aggregate is the mean of clause
/// scores, reported separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAssessment {
    pub records: Vec<RiskRecord>,
    pub level: RiskLevel,
    pub score: f32,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub provenance: Provenance,
}
