pub mod config;
pub mod error;
pub mod fingerprint;
pub mod record;
pub mod status;

pub use config::{
    CacheConfig, CategoryPhrases, CategoryWeights, DetailLevelConfig, DetailLevels, EngineConfig,
    FeatureCategory, PhraseTable, ProbeConfig, RiskThresholds, Ruleset, Synonym,
    TransparencyConfig, TtlConfig,
};
pub use error::ConfigError;
pub use fingerprint::Fingerprint;
pub use record::{
    Citation, ClauseSpan, DetailLevel, Document, DocumentAssessment, PatternCategory, PatternMatch,
    Provenance, RiskLevel, RiskRecord, Source,
};
pub use status::{ConnectionQuality, ConnectivityStatus, EndpointStatus};
