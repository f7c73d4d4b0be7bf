//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.provider.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.provider must not be empty".into(),
            ));
        }
        if self.llm.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_ms must be > 0".into(),
            ));
        }
        if self.tts.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tts.timeout_ms must be > 0".into(),
            ));
        }
        if self.tts.max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "tts.max_chars must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
