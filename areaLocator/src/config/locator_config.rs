use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::constants::*;
use crate::core::locator::SearchLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeout must be a non-negative, representable number of seconds (got {0})")]
    InvalidTimeout(f64),
}

/// Everything the locator needs from its environment, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub dataset_path: PathBuf,
    pub max_attempts: usize,
    pub timeout_secs: Option<f64>,
    pub min_density: f64,
    pub max_density: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: None,
            min_density: DEFAULT_MIN_DENSITY,
            max_density: DEFAULT_MAX_DENSITY,
        }
    }
}

impl LocatorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: LocatorConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.timeout_secs {
            Some(secs) if Duration::try_from_secs_f64(secs).is_err() => Err(ConfigError::InvalidTimeout(secs)),
            _ => Ok(()),
        }
    }

    /// Points the dataset at its conventional location inside an ns-3 checkout.
    pub fn with_ns3_home(mut self, ns3_home: impl AsRef<Path>) -> Self {
        self.dataset_path = ns3_home.as_ref().join(NS3_DATASET_SUBPATH);
        self
    }

    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            max_attempts: self.max_attempts,
            timeout: self
                .timeout_secs
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: LocatorConfig =
            serde_json::from_str(r#"{"dataset_path": "/data/positions.jsonl", "timeout_secs": 2.5}"#).unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("/data/positions.jsonl"));
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.limits().timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn ns3_home_resolves_dataset() {
        let config = LocatorConfig::default().with_ns3_home("/opt/ns-3-dev");
        assert_eq!(
            config.dataset_path,
            PathBuf::from("/opt/ns-3-dev/contrib/defiance/utils/data/positions.jsonl")
        );
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let config = LocatorConfig { timeout_secs: Some(-1.0), ..LocatorConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
    }

    #[test]
    fn unrepresentable_timeouts_are_rejected() {
        for secs in [1e20, f64::INFINITY, f64::NAN] {
            let config = LocatorConfig { timeout_secs: Some(secs), ..LocatorConfig::default() };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))), "{}", secs);
            assert_eq!(config.limits().timeout, None);
        }
    }

    #[test]
    fn huge_finite_timeout_is_accepted() {
        let config = LocatorConfig { timeout_secs: Some(1e19), ..LocatorConfig::default() };
        assert!(config.validate().is_ok());
        assert!(config.limits().timeout.is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            LocatorConfig::from_file("/nonexistent/locator.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
