//! Configuration management for Amplify.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Secrets are never stored in plain form by default: API keys use
//! `${ENV_VAR}` references that are resolved each time they are needed.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Amplify.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings
    pub logging: LoggingConfig,

    /// Story enhancement provider settings
    pub llm: LlmConfig,

    /// Text-to-speech settings
    pub tts: TtsConfig,

    /// Prompt template settings
    pub prompts: PromptsConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.amplify.amplify/config.toml
    /// - Linux: ~/.config/amplify/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\amplify\config\config.toml
    ///
    /// Falls back to ~/.amplify/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "amplify", "amplify")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".amplify").join("config.toml")
            })
    }

    /// Resolved prompt directory (with ~ expansion), if one is configured.
    pub fn prompts_dir(&self) -> Option<PathBuf> {
        let dir = self.prompts.dir.trim();
        if dir.is_empty() {
            return None;
        }
        let expanded = shellexpand::tilde(dir);
        Some(PathBuf::from(expanded.into_owned()))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Returns `None` for empty values and unset variables, which callers treat
/// as "credential absent".
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
    } else if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "gemini");
        assert!(config.llm.enable_fallback);
        assert_eq!(config.llm.timeout_ms, 30_000);
        assert_eq!(config.tts.max_chars, 4096);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[llm]"));
        assert!(toml.contains("[llm.gemini]"));
        assert!(toml.contains("[tts.elevenlabs]"));
    }

    #[test]
    fn test_load_from_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[llm]\nprovider = \"openai\"\n\n[llm.openai]\nmodel = \"gpt-4\"\n"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.openai.model, "gpt-4");
        assert_eq!(config.llm.openai.api_key, "${OPENAI_API_KEY}");
        assert_eq!(config.tts.provider, "openai");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm]\ntimeout_ms = 0\n").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_prompts_dir_disabled_when_empty() {
        let config = Config::default();
        assert!(config.prompts_dir().is_none());

        let mut config = Config::default();
        config.prompts.dir = "/srv/prompts".to_string();
        assert_eq!(config.prompts_dir(), Some(PathBuf::from("/srv/prompts")));
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        assert_eq!(resolve_env_var("   "), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }
}
