//! Risk scoring: pattern matches → weighted clause score, level, and
//! document aggregate.
//!
//! Scoring is a pure function of the matches and the active ruleset, which
//! is what makes every stored score reproducible from its derivation
//! inputs.

use lexplain_core::{
    CategoryWeights, PatternCategory, PatternMatch, RiskLevel, RiskRecord, RiskThresholds,
};

/// Per-category strength sums cap here, so repeated hits in one category
/// cannot run the scale away.
const CATEGORY_STRENGTH_CAP: f32 = 2.0;

/// Scored outcome for one clause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClauseScore {
    pub score: f32,
    pub level: RiskLevel,
    pub primary_driver: Option<PatternCategory>,
}

/// Document-level aggregate.
///
/// The level is the maximum of clause levels — one High clause makes the
/// document High. The numeric score is the mean of clause scores and is
/// reported separately from the level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub level: RiskLevel,
    pub score: f32,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Weighted multi-factor scorer.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    weights: CategoryWeights,
    thresholds: RiskThresholds,
}

impl RiskScorer {
    pub fn new(weights: CategoryWeights, thresholds: RiskThresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    /// Score one clause from its pattern matches.
    ///
    /// Each category contributes `min(Σ strengths, 2.0) × weight`; the sum
    /// is normalized by the maximum theoretical single-category
    /// contribution (`2 × max weight`), so one strong match tops out at
    /// 0.5 and cannot saturate the scale alone. No matches → Low at 0.0,
    /// never an error.
    pub fn score_matches(&self, matches: &[PatternMatch]) -> ClauseScore {
        if matches.is_empty() {
            return ClauseScore {
                score: 0.0,
                level: self.thresholds.level_for(0.0),
                primary_driver: None,
            };
        }

        let mut strengths = [0.0f32; PatternCategory::ALL.len()];
        for m in matches {
            let idx = PatternCategory::ALL
                .iter()
                .position(|&c| c == m.category)
                .expect("category is one of the fixed five");
            strengths[idx] += m.strength.clamp(0.0, 1.0);
        }

        let mut total = 0.0f32;
        let mut primary: Option<(PatternCategory, f32)> = None;
        for (idx, &category) in PatternCategory::ALL.iter().enumerate() {
            if strengths[idx] == 0.0 {
                continue;
            }
            let contribution =
                strengths[idx].min(CATEGORY_STRENGTH_CAP) * self.weights.weight(category);
            total += contribution;

            // Strict `>` keeps the earlier category on ties: ALL is in
            // tie-break priority order.
            let stronger = match primary {
                None => true,
                Some((_, best)) => contribution > best,
            };
            if stronger {
                primary = Some((category, contribution));
            }
        }

        let normalizer = CATEGORY_STRENGTH_CAP * self.weights.max_weight();
        let score = (total / normalizer).clamp(0.0, 1.0);

        ClauseScore {
            score,
            level: self.thresholds.level_for(score),
            primary_driver: primary.map(|(c, _)| c),
        }
    }

    /// Recompute a stored record's score from its stored matches.
    ///
    /// Used to check the reproducibility invariant: this must equal the
    /// record's persisted score exactly when the ruleset is unchanged.
    pub fn reproduce(&self, record: &RiskRecord) -> ClauseScore {
        self.score_matches(&record.matches)
    }

    /// Aggregate clause records into the document-level result.
    pub fn aggregate(&self, records: &[RiskRecord]) -> Aggregate {
        if records.is_empty() {
            return Aggregate {
                level: RiskLevel::Low,
                score: 0.0,
                high: 0,
                medium: 0,
                low: 0,
            };
        }

        let mut high = 0;
        let mut medium = 0;
        let mut low = 0;
        let mut sum = 0.0f32;
        let mut level = RiskLevel::Low;

        for record in records {
            match record.level {
                RiskLevel::High => high += 1,
                RiskLevel::Medium => medium += 1,
                RiskLevel::Low => low += 1,
            }
            sum += record.score;
            level = level.max(record.level);
        }

        Aggregate {
            level,
            score: sum / records.len() as f32,
            high,
            medium,
            low,
        }
    }
}
