pub mod blends;
pub mod config;
pub mod engine;
pub mod factors;
pub mod frequency;
pub mod validation;

pub use blends::{is_symmetric, normalize_blends, BlendError};
pub use config::*;
pub use engine::{
    blend_frequency, calculate_beneficial_score, calculate_score, score_catalog, score_oils,
    FactorContribution, RankedOil, ScoreBreakdown, ScoreResult, ScoredCatalog,
};
pub use frequency::Frequency;
pub use validation::validate_scoring;
