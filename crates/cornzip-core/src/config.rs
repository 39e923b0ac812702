//! Pipeline configuration types.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration shared by every operation runner.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PipelineConfig {
    /// Capacity of the engine-to-runner progress channel.
    #[builder(default = "100")]
    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,

    /// Deadline for a single run in milliseconds (None = no deadline).
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Destination used when an extraction does not name one.
    #[builder(default = "default_extract_path()")]
    #[serde(default = "default_extract_path")]
    pub default_extract_path: PathBuf,

    /// Percentage step between extraction log milestones.
    #[builder(default = "20")]
    #[serde(default = "default_milestone_step")]
    pub log_milestone_step: u8,
}

fn default_progress_capacity() -> usize {
    100
}

fn default_extract_path() -> PathBuf {
    PathBuf::from("Downloads/CornZip_Extracted")
}

fn default_milestone_step() -> u8 {
    20
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.progress_capacity {
            return Err("Progress capacity must be at least 1".to_string());
        }
        if let Some(step) = self.log_milestone_step {
            if step == 0 || step > 100 {
                return Err("Log milestone step must be between 1 and 100".to_string());
            }
        }
        if let Some(Some(0)) = self.timeout_ms {
            return Err("Timeout must be positive".to_string());
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Create a new config builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.check()?;
        Ok(config)
    }

    /// The run deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::Invalid {
            message: message.to_string(),
        };

        if self.progress_capacity == 0 {
            return Err(invalid("progress_capacity must be at least 1"));
        }
        if self.log_milestone_step == 0 || self.log_milestone_step > 100 {
            return Err(invalid("log_milestone_step must be between 1 and 100"));
        }
        if self.timeout_ms == Some(0) {
            return Err(invalid("timeout_ms must be positive"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            progress_capacity: default_progress_capacity(),
            timeout_ms: None,
            default_extract_path: default_extract_path(),
            log_milestone_step: default_milestone_step(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::builder()
            .timeout_ms(5_000u64)
            .progress_capacity(8usize)
            .build()
            .unwrap();

        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.progress_capacity, 8);
        assert_eq!(config.log_milestone_step, 20);
    }

    #[test]
    fn test_config_builder_rejects_zero_capacity() {
        assert!(
            PipelineConfig::builder()
                .progress_capacity(0usize)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.timeout(), None);
        assert_eq!(
            config.default_extract_path,
            PathBuf::from("Downloads/CornZip_Extracted")
        );
    }

    #[test]
    fn test_config_from_toml() {
        let config = PipelineConfig::from_toml(
            r#"
            timeout_ms = 30000
            default_extract_path = "/tmp/out"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.default_extract_path, PathBuf::from("/tmp/out"));
        assert_eq!(config.progress_capacity, 100);
    }

    #[test]
    fn test_config_from_toml_rejects_bad_step() {
        assert!(matches!(
            PipelineConfig::from_toml("log_milestone_step = 0"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            PipelineConfig::from_toml("progress_capacity = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
