pub mod baseline;
pub mod catalog;
pub mod engine;
pub mod evaluator;
pub mod filter;
pub mod formulas;
pub mod request;

pub use baseline::{
    nearest_sample, BaselineResolver, BaselineScalars, BASELINE_REQUEST_NAME,
    BASELINE_WINDOW_MINUTES,
};
pub use catalog::{BaselineScalar, Input, Quantity};
pub use engine::{NormalizationEngine, NormalizationReport, NORMALIZATION_REQUEST_NAME};
pub use evaluator::{ColumnCache, RowEvaluator};
pub use filter::{ColumnRange, FilterOutcome, QualityFilter, QualitySummary};
pub use formulas::DEGRADED_VALUE;
pub use request::NormalizationRequest;
