//! Normalized performance metrics for reverse-osmosis membrane systems.
//!
//! Raw sensor history is fetched through a [`acquisition::TimeseriesSource`],
//! screened by a quality filter and evaluated against a baseline operating
//! point, producing one column per requested [`domain::NormalizedMetric`].

pub mod acquisition;
pub mod config;
pub mod domain;
pub mod error;
pub mod normalization;
pub mod telemetry;

pub use error::{NormalizationError, Result};
pub use normalization::{NormalizationEngine, NormalizationRequest};
