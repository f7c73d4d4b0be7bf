//! Error types for story enhancement and speech synthesis.
//!
//! Errors are split by concern so callers can always tell "your request was
//! malformed" apart from "the AI backend is down". Each provider-facing error
//! carries a [`FailureKind`] that survives up to the request boundary and maps
//! to a distinct HTTP status via `http_status()`.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Amplify operations.
#[derive(Error, Debug)]
pub enum AmplifyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Story enhancement errors
    #[error("Enhancement error: {0}")]
    Enhancement(#[from] EnhancementError),

    /// Text-to-speech errors
    #[error("TTS error: {0}")]
    Tts(#[from] TtsError),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Classification of a failed provider call.
///
/// Rate limiting and quota exhaustion are kept apart so the HTTP layer can
/// answer 429 for one and 503 for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider throttled the request (HTTP 429 without a quota marker)
    RateLimited,
    /// Account quota or credit exhausted
    QuotaExceeded,
    /// Credential rejected (HTTP 401/403)
    Authentication,
    /// Request exceeded the configured timeout
    Timeout,
    /// Payload could not be parsed or lacked required fields
    MalformedResponse,
    /// Anything else: connection errors, 5xx, unexpected 4xx
    Other,
}

impl FailureKind {
    /// Classify a failure from its HTTP status (when one was received) and
    /// the error text returned by the provider.
    ///
    /// Status codes win when present; the message is only inspected to tell
    /// quota exhaustion from plain throttling, or when no status exists.
    pub fn classify(status_code: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();
        let mentions_quota = lower.contains("quota") || lower.contains("insufficient_quota");

        match status_code {
            Some(429) if mentions_quota => Self::QuotaExceeded,
            Some(429) => Self::RateLimited,
            Some(401) | Some(403) => Self::Authentication,
            Some(402) => Self::QuotaExceeded,
            Some(408) | Some(504) => Self::Timeout,
            Some(_) if mentions_quota => Self::QuotaExceeded,
            Some(_) => Self::Other,
            None => {
                if lower.contains("rate limit") {
                    Self::RateLimited
                } else if mentions_quota {
                    Self::QuotaExceeded
                } else if lower.contains("api key") || lower.contains("unauthorized") {
                    Self::Authentication
                } else if lower.contains("timed out") || lower.contains("timeout") {
                    Self::Timeout
                } else {
                    Self::Other
                }
            }
        }
    }

    /// HTTP status a request handler should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::Timeout => 504,
            _ => 503,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RateLimited => "rate limited",
            Self::QuotaExceeded => "quota exceeded",
            Self::Authentication => "authentication failed",
            Self::Timeout => "timed out",
            Self::MalformedResponse => "malformed response",
            Self::Other => "request failed",
        };
        f.write_str(label)
    }
}

/// Errors raised by enhancement providers and the provider factory.
#[derive(Error, Debug)]
pub enum EnhancementError {
    /// Caller-supplied text, photo or language failed a structural rule.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A constructed provider's remote call failed or returned unusable output.
    #[error("{provider} {kind}: {message}")]
    Invocation {
        provider: String,
        kind: FailureKind,
        message: String,
        status_code: Option<u16>,
    },

    /// The provider does not implement the requested operation.
    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },

    /// No usable provider could be constructed.
    #[error("{0}")]
    Factory(String),

    /// A provider name the factory does not recognize.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl EnhancementError {
    /// Shorthand for an invocation failure whose kind is derived from the
    /// HTTP status and message.
    pub fn invocation(
        provider: &str,
        status_code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self::Invocation {
            provider: provider.to_string(),
            kind: FailureKind::classify(status_code, &message),
            message,
            status_code,
        }
    }

    /// An invocation failure caused by a response that violates the
    /// `enhanced_transcript` + `insights` contract.
    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::Invocation {
            provider: provider.to_string(),
            kind: FailureKind::MalformedResponse,
            message: message.into(),
            status_code: None,
        }
    }

    /// True for errors the caller can fix by changing the request.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Unsupported { .. })
    }

    /// HTTP status a request handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 422,
            Self::Unsupported { .. } => 400,
            Self::Invocation { kind, .. } => kind.http_status(),
            Self::Factory(_) => 503,
            Self::UnknownProvider(_) => 500,
        }
    }

    /// The failure kind for invocation errors.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Invocation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Errors raised by the text-to-speech service.
#[derive(Error, Debug)]
pub enum TtsError {
    /// Empty text or otherwise unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The selected speech provider failed.
    #[error("{message}")]
    Provider {
        provider: String,
        kind: FailureKind,
        message: String,
    },
}

impl TtsError {
    /// Build a provider error with a message matching its classification.
    pub fn provider(provider_label: &str, status_code: Option<u16>, detail: &str) -> Self {
        let kind = FailureKind::classify(status_code, detail);
        let message = match kind {
            FailureKind::RateLimited => {
                format!("{provider_label} TTS rate limit exceeded, please try again later")
            }
            FailureKind::QuotaExceeded => format!("{provider_label} TTS quota exceeded"),
            FailureKind::Authentication => format!("{provider_label} TTS authentication failed"),
            _ => format!("{provider_label} TTS generation failed: {detail}"),
        };
        Self::Provider {
            provider: provider_label.to_lowercase(),
            kind,
            message,
        }
    }

    /// HTTP status a request handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 422,
            Self::Provider { kind, .. } => kind.http_status(),
        }
    }
}

/// Prompt library errors.
#[derive(Error, Debug)]
pub enum PromptError {
    /// Directory or file missing
    #[error("Prompt file not found: {0}")]
    NotFound(PathBuf),

    /// Category not declared in config.yaml
    #[error("Unknown prompt category: {0}")]
    UnknownCategory(String),

    /// YAML could not be read or parsed
    #[error("Failed to load prompt file {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Template formatting was missing declared variables
    #[error("Missing required variables: {0:?}")]
    MissingVariables(Vec<String>),

    /// Template syntax or rendering failure reported by Tera
    #[error("Failed to render prompt template: {0}")]
    Render(String),
}

impl From<tera::Error> for PromptError {
    fn from(e: tera::Error) -> Self {
        // Tera's top-level message only names the template; the cause is
        // further down the source chain.
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Render(message)
    }
}

/// Convenience type alias for Amplify results.
pub type Result<T> = std::result::Result<T, AmplifyError>;
