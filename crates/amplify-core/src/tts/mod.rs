//! Text-to-speech with provider selection and a mock fallback.
//!
//! Clients are constructed once from configuration. A provider whose client
//! could not be built (no credential, client init failure) is simply absent,
//! and requests for it are served by the mock generator instead. Provider
//! unavailability never fails a request; a constructed provider's runtime
//! failure does.

mod elevenlabs;
mod mock;
mod openai;

pub use elevenlabs::ElevenLabsSpeech;
pub use mock::{MockSpeech, SILENT_MP3_FRAME};
pub use openai::{OpenAiSpeech, OPENAI_VOICES};

use crate::config::{resolve_env_var, Config};
use crate::error::TtsError;
use crate::types::TtsOutput;
use async_trait::async_trait;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

/// Languages accepted for speech synthesis.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "ja", "ko", "zh", "ar", "hi", "nl", "pl", "ru",
];

const TEST_PHRASE: &str = "Hello, this is a test.";

/// A voice offered by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Trait that all speech providers implement.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Provider name (e.g., "openai", "elevenlabs", "mock").
    fn provider_name(&self) -> &str;

    /// Synthesize `text`. `voice` is provider-specific; `None` selects the
    /// provider's default for `language`.
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        voice: Option<&str>,
    ) -> Result<TtsOutput, TtsError>;
}

/// Per-provider result of [`TtsService::test_service`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    /// Client was constructed
    pub available: bool,
    /// A sample synthesis succeeded
    pub working: bool,
}

/// Speech generation front door.
pub struct TtsService {
    provider: String,
    max_chars: usize,
    openai: Option<OpenAiSpeech>,
    elevenlabs: Option<ElevenLabsSpeech>,
    mock: MockSpeech,
}

impl TtsService {
    /// Build clients for every provider with a configured credential.
    ///
    /// OpenAI speech shares the `[llm.openai]` key and endpoint.
    pub fn new(config: &Config) -> Self {
        let timeout = Duration::from_millis(config.tts.timeout_ms);

        let openai = resolve_env_var(&config.llm.openai.api_key).and_then(|key| {
            OpenAiSpeech::new(
                &key,
                &config.llm.openai.endpoint,
                &config.tts.openai_model,
                &config.tts.voice,
                timeout,
            )
            .inspect(|_| tracing::info!("OpenAI TTS client initialized"))
            .inspect_err(|e| tracing::warn!("Failed to initialize OpenAI TTS client: {e}"))
            .ok()
        });

        let elevenlabs = resolve_env_var(&config.tts.elevenlabs.api_key).and_then(|key| {
            ElevenLabsSpeech::new(&key, &config.tts.elevenlabs, timeout)
                .inspect(|_| tracing::info!("ElevenLabs TTS client initialized"))
                .inspect_err(|e| tracing::warn!("Failed to initialize ElevenLabs TTS client: {e}"))
                .ok()
        });

        Self::from_parts(&config.tts.provider, config.tts.max_chars, openai, elevenlabs)
    }

    /// Assemble a service from already-constructed clients.
    pub fn from_parts(
        provider: &str,
        max_chars: usize,
        openai: Option<OpenAiSpeech>,
        elevenlabs: Option<ElevenLabsSpeech>,
    ) -> Self {
        Self {
            provider: provider.trim().to_lowercase(),
            max_chars,
            openai,
            elevenlabs,
            mock: MockSpeech,
        }
    }

    /// The synthesizer `generate_audio` will dispatch to.
    fn selected(&self) -> &dyn SpeechSynthesizer {
        let client = match self.provider.as_str() {
            "openai" => self.openai.as_ref().map(|c| c as &dyn SpeechSynthesizer),
            "elevenlabs" => self
                .elevenlabs
                .as_ref()
                .map(|c| c as &dyn SpeechSynthesizer),
            _ => None,
        };
        client.unwrap_or(&self.mock)
    }

    /// Name of the provider requests are currently served by.
    pub fn active_provider(&self) -> &str {
        self.selected().provider_name()
    }

    /// Convert text to speech.
    ///
    /// Text longer than the configured limit is cut to that many characters
    /// and suffixed with `"..."`.
    pub async fn generate_audio(
        &self,
        text: &str,
        language: &str,
        voice: Option<&str>,
    ) -> Result<TtsOutput, TtsError> {
        if text.trim().is_empty() {
            return Err(TtsError::InvalidInput("Text content is required".to_string()));
        }

        let text = truncate_text(text, self.max_chars);
        let synthesizer = self.selected();
        if synthesizer.provider_name() == self.mock.provider_name() {
            tracing::info!(
                "Using mock TTS (provider: {}, openai: {}, elevenlabs: {})",
                self.provider,
                self.openai.is_some(),
                self.elevenlabs.is_some()
            );
        }
        synthesizer.synthesize(&text, language, voice).await
    }

    /// Language codes accepted for synthesis.
    pub fn supported_languages(&self) -> &'static [&'static str] {
        SUPPORTED_LANGUAGES
    }

    /// Voice catalogue per provider, for constructed clients and the
    /// explicitly requested provider.
    pub fn available_voices(
        &self,
        provider: Option<&str>,
    ) -> BTreeMap<String, Vec<VoiceInfo>> {
        let mut voices = BTreeMap::new();
        if self.openai.is_some() || provider == Some("openai") {
            voices.insert("openai".to_string(), openai::VOICES.to_vec());
        }
        if self.elevenlabs.is_some() || provider == Some("elevenlabs") {
            voices.insert("elevenlabs".to_string(), elevenlabs::VOICES.to_vec());
        }
        voices
    }

    /// Run a short sample synthesis against every constructed provider.
    pub async fn test_service(&self) -> BTreeMap<String, ProviderStatus> {
        let mut results = BTreeMap::new();

        let mut openai_status = ProviderStatus::default();
        if let Some(client) = &self.openai {
            openai_status.available = true;
            match client.synthesize(TEST_PHRASE, "en", None).await {
                Ok(_) => openai_status.working = true,
                Err(e) => tracing::error!("OpenAI TTS test failed: {e}"),
            }
        }
        results.insert("openai".to_string(), openai_status);

        let mut elevenlabs_status = ProviderStatus::default();
        if let Some(client) = &self.elevenlabs {
            elevenlabs_status.available = true;
            match client.synthesize(TEST_PHRASE, "en", None).await {
                Ok(_) => elevenlabs_status.working = true,
                Err(e) => tracing::error!("ElevenLabs TTS test failed: {e}"),
            }
        }
        results.insert("elevenlabs".to_string(), elevenlabs_status);

        results
    }
}

/// Keep the first `max_chars` characters and append `"..."` when longer.
pub fn truncate_text(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            tracing::warn!(
                "Text truncated from {} to {max_chars} characters",
                text.chars().count()
            );
            Cow::Owned(format!("{}...", &text[..cut]))
        }
        None => Cow::Borrowed(text),
    }
}

/// Map a transport-level reqwest failure.
fn request_error(label: &str, e: reqwest::Error) -> TtsError {
    let detail = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    TtsError::provider(label, None, &detail)
}
