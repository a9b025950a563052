use serde::{Serialize, Serializer};
use thiserror::Error;

/// Rejected search parameters. Nothing is searched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocatorError {
    #[error("Minimum density cannot be greater than maximum density ({min} > {max})")]
    InvalidDensityBand { min: f64, max: f64 },

    #[error("Density bounds must be positive and finite (got {min}..={max})")]
    NonPositiveDensity { min: f64, max: f64 },

    #[error("Target station count must be at least 1")]
    ZeroTarget,

    #[error("Target of {target} stations exceeds the {available} stations in the dataset")]
    TargetExceedsDataset { target: usize, available: usize },

    #[error("Dataset contains no base stations")]
    EmptyDataset,
}

impl Serialize for LocatorError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
