//! Engine configuration: scoring ruleset, detail levels, cache, and probe.
//!
//! Read from TOML at process start and validated eagerly — a malformed
//! weight or threshold is fatal at load, never silently defaulted. The
//! ruleset portion is versioned and can be swapped at runtime (remote sync);
//! everything is serde data so deployments retune without code changes.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::{DetailLevel, PatternCategory, RiskLevel};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ruleset: Ruleset,
    pub detail_levels: DetailLevels,
    pub transparency: TransparencyConfig,
    pub cache: CacheConfig,
    pub probe: ProbeConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML configuration string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Check every tunable for sanity. Called on every load; a failure here
    /// must abort startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ruleset.validate()?;
        self.detail_levels.validate()?;
        self.cache.validate()?;
        self.probe.validate()?;
        Ok(())
    }
}

/// The versioned scoring ruleset: weights, thresholds, and phrase table.
///
/// Every risk record stores the version it was scored under; cache entries
/// from a superseded version are stale immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub version: String,
    pub weights: CategoryWeights,
    pub thresholds: RiskThresholds,
    pub phrases: PhraseTable,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            weights: CategoryWeights::default(),
            thresholds: RiskThresholds::default(),
            phrases: PhraseTable::default(),
        }
    }
}

impl Ruleset {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::invalid("ruleset.version", "must not be empty"));
        }
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.phrases.validate()?;
        Ok(())
    }
}

/// Per-category scoring weights.
///
/// Defaults keep penalty and indemnification highest, termination and
/// auto-renewal medium, one-sided obligation lowest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub penalty: f32,
    pub indemnification: f32,
    pub termination: f32,
    pub auto_renewal: f32,
    pub one_sided_obligation: f32,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            penalty: 1.0,
            indemnification: 0.9,
            termination: 0.6,
            auto_renewal: 0.6,
            one_sided_obligation: 0.3,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: PatternCategory) -> f32 {
        match category {
            PatternCategory::Penalty => self.penalty,
            PatternCategory::Indemnification => self.indemnification,
            PatternCategory::Termination => self.termination,
            PatternCategory::AutoRenewal => self.auto_renewal,
            PatternCategory::OneSidedObligation => self.one_sided_obligation,
        }
    }

    /// The largest configured weight; the scorer's normalization anchor.
    pub fn max_weight(&self) -> f32 {
        PatternCategory::ALL
            .iter()
            .map(|c| self.weight(*c))
            .fold(f32::MIN, f32::max)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in PatternCategory::ALL {
            let w = self.weight(category);
            if !w.is_finite() || w <= 0.0 {
                return Err(ConfigError::invalid(
                    "ruleset.weights",
                    format!("weight for {category} must be finite and positive, got {w}"),
                ));
            }
        }
        Ok(())
    }
}

/// Score-to-level cutoffs. `score < low_cutoff` → Low,
/// `score < high_cutoff` → Medium, else High.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub low_cutoff: f32,
    pub high_cutoff: f32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_cutoff: 0.33,
            high_cutoff: 0.66,
        }
    }
}

impl RiskThresholds {
    /// Level as a pure function of score under these thresholds.
    pub fn level_for(&self, score: f32) -> RiskLevel {
        if score < self.low_cutoff {
            RiskLevel::Low
        } else if score < self.high_cutoff {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.low_cutoff > 0.0
            && self.low_cutoff < self.high_cutoff
            && self.high_cutoff < 1.0;
        if !ok {
            return Err(ConfigError::invalid(
                "ruleset.thresholds",
                format!(
                    "require 0 < low_cutoff < high_cutoff < 1, got {} and {}",
                    self.low_cutoff, self.high_cutoff
                ),
            ));
        }
        Ok(())
    }
}

/// A graded synonym: partial/equivalent phrasing with strength in
/// [0.3, 0.9].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synonym {
    pub phrase: String,
    pub strength: f32,
}

impl Synonym {
    fn new(phrase: &str, strength: f32) -> Self {
        Self {
            phrase: phrase.to_string(),
            strength,
        }
    }
}

/// Phrase inventory for one category: canonical phrases match at strength
/// 1.0, synonyms at their configured strength.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryPhrases {
    pub canonical: Vec<String>,
    pub synonyms: Vec<Synonym>,
}

/// Data-driven phrase lookup table, category → (phrase, strength).
///
/// Kept as configuration so new jurisdictions and languages extend matching
/// without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseTable {
    pub penalty: CategoryPhrases,
    pub indemnification: CategoryPhrases,
    pub termination: CategoryPhrases,
    pub auto_renewal: CategoryPhrases,
    pub one_sided_obligation: CategoryPhrases,
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self {
            penalty: CategoryPhrases {
                canonical: vec![
                    "penalty".into(),
                    "fine".into(),
                    "late fee".into(),
                    "liquidated damages".into(),
                ],
                synonyms: vec![
                    Synonym::new("forfeit", 0.8),
                    Synonym::new("default charge", 0.8),
                    Synonym::new("surcharge", 0.7),
                    Synonym::new("sanction", 0.5),
                ],
            },
            indemnification: CategoryPhrases {
                canonical: vec![
                    "indemnify".into(),
                    "indemnification".into(),
                    "hold harmless".into(),
                ],
                synonyms: vec![
                    Synonym::new("defend against any claim", 0.8),
                    Synonym::new("reimburse losses", 0.7),
                    Synonym::new("make whole", 0.6),
                ],
            },
            termination: CategoryPhrases {
                canonical: vec!["termination".into(), "terminate".into()],
                synonyms: vec![
                    Synonym::new("cancel", 0.8),
                    Synonym::new("end this agreement", 0.7),
                    Synonym::new("wind up", 0.4),
                ],
            },
            auto_renewal: CategoryPhrases {
                canonical: vec![
                    "automatic renewal".into(),
                    "automatically renew".into(),
                    "renews automatically".into(),
                    "auto-renew".into(),
                ],
                synonyms: vec![
                    Synonym::new("continue unless terminated", 0.8),
                    Synonym::new("evergreen", 0.7),
                    Synonym::new("successive term", 0.6),
                    Synonym::new("rollover", 0.4),
                ],
            },
            one_sided_obligation: CategoryPhrases {
                canonical: vec!["sole discretion".into(), "unilaterally".into()],
                synonyms: vec![
                    Synonym::new("waives any right", 0.8),
                    Synonym::new("without notice", 0.7),
                    Synonym::new("at any time for any reason", 0.7),
                    Synonym::new("no obligation to", 0.6),
                    Synonym::new("exclusive remedy", 0.6),
                ],
            },
        }
    }
}

impl PhraseTable {
    pub fn phrases(&self, category: PatternCategory) -> &CategoryPhrases {
        match category {
            PatternCategory::Penalty => &self.penalty,
            PatternCategory::Indemnification => &self.indemnification,
            PatternCategory::Termination => &self.termination,
            PatternCategory::AutoRenewal => &self.auto_renewal,
            PatternCategory::OneSidedObligation => &self.one_sided_obligation,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in PatternCategory::ALL {
            let entry = self.phrases(category);
            for phrase in &entry.canonical {
                if phrase.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        "ruleset.phrases",
                        format!("{category} has an empty canonical phrase"),
                    ));
                }
            }
            for syn in &entry.synonyms {
                if syn.phrase.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        "ruleset.phrases",
                        format!("{category} has an empty synonym phrase"),
                    ));
                }
                if !(0.3..=0.9).contains(&syn.strength) {
                    return Err(ConfigError::invalid(
                        "ruleset.phrases",
                        format!(
                            "synonym '{}' for {category} has strength {} outside [0.3, 0.9]",
                            syn.phrase, syn.strength
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Presentation options for one detail level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailLevelConfig {
    pub max_words_per_sentence: usize,
    pub include_analogies: bool,
    pub include_citation: bool,
    pub include_confidence: bool,
    pub include_technical_terms: bool,
    pub simplify_vocabulary: bool,
    pub avoid_legal_terms: bool,
}

impl Default for DetailLevelConfig {
    fn default() -> Self {
        // The `medium` profile.
        Self {
            max_words_per_sentence: 20,
            include_analogies: false,
            include_citation: true,
            include_confidence: true,
            include_technical_terms: false,
            simplify_vocabulary: false,
            avoid_legal_terms: false,
        }
    }
}

/// Per-level presentation profiles, very-simple through legal-detailed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailLevels {
    pub very_simple: DetailLevelConfig,
    pub simple: DetailLevelConfig,
    pub medium: DetailLevelConfig,
    pub detailed: DetailLevelConfig,
    pub legal_detailed: DetailLevelConfig,
}

impl Default for DetailLevels {
    fn default() -> Self {
        Self {
            very_simple: DetailLevelConfig {
                max_words_per_sentence: 10,
                include_analogies: true,
                include_citation: false,
                include_confidence: false,
                include_technical_terms: false,
                simplify_vocabulary: true,
                avoid_legal_terms: true,
            },
            simple: DetailLevelConfig {
                max_words_per_sentence: 15,
                include_analogies: true,
                include_citation: false,
                include_confidence: false,
                include_technical_terms: false,
                simplify_vocabulary: true,
                avoid_legal_terms: false,
            },
            medium: DetailLevelConfig::default(),
            detailed: DetailLevelConfig {
                max_words_per_sentence: 30,
                include_analogies: false,
                include_citation: true,
                include_confidence: true,
                include_technical_terms: true,
                simplify_vocabulary: false,
                avoid_legal_terms: false,
            },
            legal_detailed: DetailLevelConfig {
                max_words_per_sentence: 40,
                include_analogies: false,
                include_citation: true,
                include_confidence: true,
                include_technical_terms: true,
                simplify_vocabulary: false,
                avoid_legal_terms: false,
            },
        }
    }
}

impl DetailLevels {
    pub fn get(&self, level: DetailLevel) -> &DetailLevelConfig {
        match level {
            DetailLevel::VerySimple => &self.very_simple,
            DetailLevel::Simple => &self.simple,
            DetailLevel::Medium => &self.medium,
            DetailLevel::Detailed => &self.detailed,
            DetailLevel::LegalDetailed => &self.legal_detailed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for level in DetailLevel::ALL {
            let cfg = self.get(level);
            if cfg.max_words_per_sentence < 3 {
                return Err(ConfigError::invalid(
                    "detail_levels",
                    format!(
                        "{level} max_words_per_sentence must be at least 3, got {}",
                        cfg.max_words_per_sentence
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Per-request presentation preferences threaded through each call, so
/// concurrent requests with different preferences cannot interfere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransparencyConfig {
    pub detail_level: DetailLevel,
    pub show_confidence: bool,
    pub show_citations: bool,
}

impl Default for TransparencyConfig {
    fn default() -> Self {
        Self {
            detail_level: DetailLevel::Medium,
            show_confidence: true,
            show_citations: true,
        }
    }
}

/// Cached-feature families with independent time-to-live budgets.
///
/// Document summaries live longer than clause analysis; glossary terms
/// longest of all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    DocumentSummary,
    ClauseAnalysis,
    RiskAssessment,
    GlossaryTerm,
}

impl FeatureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentSummary => "document_summary",
            Self::ClauseAnalysis => "clause_analysis",
            Self::RiskAssessment => "risk_assessment",
            Self::GlossaryTerm => "glossary_term",
        }
    }
}

/// Per-feature TTLs, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    pub document_summary_secs: u64,
    pub clause_analysis_secs: u64,
    pub risk_assessment_secs: u64,
    pub glossary_term_secs: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            document_summary_secs: 24 * 60 * 60,
            clause_analysis_secs: 12 * 60 * 60,
            risk_assessment_secs: 12 * 60 * 60,
            glossary_term_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// Cache sizing and lifetime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry-count ceiling; least-recently-used entries are evicted beyond
    /// it.
    pub max_entries: usize,
    /// Interval for the proactive expired-entry sweep.
    pub sweep_interval_secs: u64,
    pub ttl: TtlConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 512,
            sweep_interval_secs: 300,
            ttl: TtlConfig::default(),
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, category: FeatureCategory) -> Duration {
        let secs = match category {
            FeatureCategory::DocumentSummary => self.ttl.document_summary_secs,
            FeatureCategory::ClauseAnalysis => self.ttl.clause_analysis_secs,
            FeatureCategory::RiskAssessment => self.ttl.risk_assessment_secs,
            FeatureCategory::GlossaryTerm => self.ttl.glossary_term_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::invalid("cache.max_entries", "must be positive"));
        }
        let ttls = [
            self.ttl.document_summary_secs,
            self.ttl.clause_analysis_secs,
            self.ttl.risk_assessment_secs,
            self.ttl.glossary_term_secs,
        ];
        if ttls.iter().any(|&t| t == 0) {
            return Err(ConfigError::invalid("cache.ttl", "all TTLs must be positive"));
        }
        Ok(())
    }
}

/// Connectivity probe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub endpoints: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            timeout_secs: 5,
            endpoints: vec![
                "https://www.google.com".to_string(),
                "https://api.openai.com".to_string(),
                "https://generativelanguage.googleapis.com".to_string(),
            ],
        }
    }
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::invalid("probe.interval_secs", "must be positive"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("probe.timeout_secs", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn level_for_is_threshold_pure() {
        let t = RiskThresholds::default();
        assert_eq!(t.level_for(0.0), RiskLevel::Low);
        assert_eq!(t.level_for(0.329), RiskLevel::Low);
        assert_eq!(t.level_for(0.33), RiskLevel::Medium);
        assert_eq!(t.level_for(0.659), RiskLevel::Medium);
        assert_eq!(t.level_for(0.66), RiskLevel::High);
        assert_eq!(t.level_for(1.0), RiskLevel::High);
    }

    #[test]
    fn retuned_thresholds_shift_levels() {
        let t = RiskThresholds {
            low_cutoff: 0.1,
            high_cutoff: 0.5,
        };
        assert_eq!(t.level_for(0.2), RiskLevel::Medium);
        assert_eq!(t.level_for(0.5), RiskLevel::High);
    }

    #[test]
    fn negative_weight_is_fatal() {
        let mut config = EngineConfig::default();
        config.ruleset.weights.penalty = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ruleset.weights"));
    }

    #[test]
    fn inverted_thresholds_are_fatal() {
        let mut config = EngineConfig::default();
        config.ruleset.thresholds = RiskThresholds {
            low_cutoff: 0.8,
            high_cutoff: 0.4,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn synonym_strength_out_of_band_is_fatal() {
        let mut config = EngineConfig::default();
        config
            .ruleset
            .phrases
            .penalty
            .synonyms
            .push(Synonym::new("overcharge", 0.95));
        assert!(config.validate().is_err());
    }

    #[test]
    fn max_weight_tracks_heaviest_category() {
        let weights = CategoryWeights::default();
        assert_eq!(weights.max_weight(), 1.0);

        let retuned = CategoryWeights {
            indemnification: 1.4,
            ..CategoryWeights::default()
        };
        assert_eq!(retuned.max_weight(), 1.4);
    }

    #[test]
    fn ttl_per_feature_category() {
        let cache = CacheConfig::default();
        assert_eq!(
            cache.ttl_for(FeatureCategory::DocumentSummary),
            Duration::from_secs(86_400)
        );
        assert_eq!(
            cache.ttl_for(FeatureCategory::ClauseAnalysis),
            Duration::from_secs(43_200)
        );
        assert!(
            cache.ttl_for(FeatureCategory::DocumentSummary)
                > cache.ttl_for(FeatureCategory::ClauseAnalysis)
        );
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [ruleset]
            version = "uk-2026-03"

            [ruleset.thresholds]
            low_cutoff = 0.25
            high_cutoff = 0.7
            "#,
        )
        .unwrap();

        assert_eq!(config.ruleset.version, "uk-2026-03");
        assert_eq!(config.ruleset.thresholds.low_cutoff, 0.25);
        // Untouched sections keep their defaults.
        assert_eq!(config.ruleset.weights.penalty, 1.0);
        assert_eq!(config.cache.max_entries, 512);
        assert_eq!(config.probe.interval_secs, 30);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("[ruleset\nversion = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_in_toml_are_fatal_not_defaulted() {
        let err = EngineConfig::from_toml_str(
            r#"
            [ruleset.weights]
            penalty = 0.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
