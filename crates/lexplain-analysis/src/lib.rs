//! Analysis pipeline: clause segmentation, pattern matching, risk scoring,
//! and detail-level explanation adaptation.

pub mod adapter;
pub mod fold;
pub mod matcher;
pub mod scorer;
pub mod segment;

pub use adapter::{ContentAdapter, ExplanationInput, RenderedExplanation, TemplateRegistry};
pub use matcher::PatternMatcher;
pub use scorer::{Aggregate, ClauseScore, RiskScorer};
pub use segment::{Clauses, EmptyInputError, Segmenter};
