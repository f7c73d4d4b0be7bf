//! Story enhancement providers.
//!
//! Provides a uniform [`StoryEnhancer`] interface over the AI backends
//! (Gemini, OpenAI) and a caching factory that selects the configured
//! primary backend and falls back to the others when it cannot be built.

pub(crate) mod factory;
pub(crate) mod gemini;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod response;

pub use factory::{
    HealthStatus, ProviderBuilder, ProviderFactory, ProviderHealth, ProviderKind,
    RemoteProviderBuilder,
};
pub use gemini::GeminiProvider;
pub use openai::{model_supports_vision, OpenAiProvider, VISION_MODELS};
pub use provider::{ImageInput, StoryEnhancer};

use crate::error::{EnhancementError, FailureKind};

/// Map a transport-level reqwest failure (no HTTP status received).
pub(crate) fn request_error(provider: &str, label: &str, e: reqwest::Error) -> EnhancementError {
    if e.is_timeout() {
        EnhancementError::Invocation {
            provider: provider.to_string(),
            kind: FailureKind::Timeout,
            message: format!("{label} request timed out: {e}"),
            status_code: None,
        }
    } else {
        EnhancementError::invocation(provider, None, format!("{label} request failed: {e}"))
    }
}
