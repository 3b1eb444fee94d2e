use thiserror::Error;

/// Failures raised by the statistical routines.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("dataset contains no records")]
    EmptyDataset,

    #[error("bayesian weight is zero: count {count} plus minimum count {min_count} must be positive")]
    ZeroWeight { count: f64, min_count: f64 },

    #[error("invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidence(f64),

    #[error("insufficient data for comparison: group {group} has {got} values, need at least {min}")]
    InsufficientData {
        group: &'static str,
        got: usize,
        min: usize,
    },

    #[error("both groups are constant with equal means; t statistic is undefined")]
    ZeroVariance,

    #[error("distribution error: {0}")]
    Distribution(String),
}

impl From<statrs::StatsError> for AnalysisError {
    fn from(err: statrs::StatsError) -> Self {
        AnalysisError::Distribution(err.to_string())
    }
}
