//! Sieve configuration
use serde::{Deserialize, Serialize};

use crate::error::SieveError;

/// First prime; emitted by the driver itself, never by a stage.
pub const BASE_PRIME: u32 = 2;

/// Largest candidate fed into the pipeline by default.
pub const DEFAULT_LIMIT: u32 = 35;

/// Values buffered per inter-stage channel by default.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
    /// Candidates `BASE_PRIME..=limit` are fed into the pipeline
    pub limit: u32,
    /// Buffered values per channel (at least 1)
    pub channel_capacity: usize,
    /// Ceiling on concurrently live stage workers; `None` is unlimited
    pub max_workers: Option<usize>,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_workers: None,
        }
    }
}

impl SieveConfig {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    pub fn validate(&self) -> Result<(), SieveError> {
        if self.channel_capacity == 0 {
            return Err(SieveError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_workers == Some(0) {
            return Err(SieveError::Config(
                "max_workers must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_run() {
        let config = SieveConfig::default();
        assert_eq!(config.limit, 35);
        assert_eq!(config.max_workers, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = SieveConfig::new(10).with_channel_capacity(0);
        assert!(matches!(config.validate(), Err(SieveError::Config(_))));

        let config = SieveConfig::new(10).with_max_workers(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SieveConfig = serde_json::from_str(r#"{ "limit": 100 }"#).unwrap();
        assert_eq!(config.limit, 100);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }
}
