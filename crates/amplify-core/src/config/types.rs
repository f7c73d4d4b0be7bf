//! Configuration section types with their defaults.

use serde::{Deserialize, Serialize};

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Story enhancement provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Preferred provider ("gemini" or "openai")
    pub provider: String,

    /// Try the other available providers when the preferred one cannot be built
    pub enable_fallback: bool,

    /// Skip fallback candidates that cannot read images when the preferred
    /// provider can. Off by default: an image request may be served text-only.
    pub require_vision_fallback: bool,

    /// Per-request timeout for provider calls in milliseconds
    pub timeout_ms: u64,

    /// Google Gemini configuration
    pub gemini: GeminiConfig,

    /// OpenAI configuration
    pub openai: OpenAiConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            enable_fallback: true,
            require_vision_fallback: false,
            timeout_ms: 30_000,
            gemini: GeminiConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

/// Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-2.5-flash-lite".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// OpenAI configuration, shared by chat completions and speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Chat model name
    pub model: String,

    /// API base URL
    pub endpoint: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Speech provider: "openai", "elevenlabs" or "mock"
    pub provider: String,

    /// Default voice (provider-specific); empty means provider default
    pub voice: String,

    /// OpenAI speech model
    pub openai_model: String,

    /// Longer input is truncated before synthesis
    pub max_chars: usize,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// ElevenLabs configuration
    pub elevenlabs: ElevenLabsConfig,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            voice: "alloy".to_string(),
            openai_model: "tts-1".to_string(),
            max_chars: 4096,
            timeout_ms: 30_000,
            elevenlabs: ElevenLabsConfig::default(),
        }
    }
}

/// ElevenLabs configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model id
    pub model: String,

    /// API base URL
    pub endpoint: String,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: "${ELEVENLABS_API_KEY}".to_string(),
            model: "eleven_monolingual_v1".to_string(),
            endpoint: "https://api.elevenlabs.io/v1".to_string(),
        }
    }
}

/// Prompt template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory holding config.yaml and category files. Empty disables
    /// the library and the built-in templates are used.
    pub dir: String,

    /// Re-read template files whose modification time changed
    pub hot_reload: bool,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            hot_reload: true,
        }
    }
}
