//! Resolution layer: connectivity-aware caching over the analysis pipeline.

mod cache;
mod engine;
mod error;

pub use cache::{AnalysisCache, CacheHit};
pub use engine::{Engine, Resolved, spawn_cache_sweeper};
pub use error::EngineError;
