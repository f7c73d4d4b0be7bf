//! Amplify Core - AI story enhancement with provider fallback and narration.
//!
//! Amplify takes a photo (or a video transcript) plus a user's narrative,
//! asks a generative AI backend to enhance it, and can narrate the result
//! through a text-to-speech provider.
//!
//! # Architecture
//!
//! ```text
//! Request → ProviderFactory (primary → fallback, cached) → StoryEnhancer → EnhancementResult
//!                                                                              ↓
//!                                               TtsService (openai | elevenlabs | mock) → audio
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use amplify_core::{Amplify, Config};
//!
//! #[tokio::main]
//! async fn main() -> amplify_core::Result<()> {
//!     let amplify = Amplify::new(Config::load()?)?;
//!
//!     let photo = std::fs::read("beach.jpg")?;
//!     let result = amplify.enhance_photo(&photo, "We built a sandcastle", "en").await?;
//!     println!("{}", result.enhanced_text());
//!
//!     let audio = amplify.narrate(&result, "en", None).await?;
//!     std::fs::write("story.mp3", &audio.audio)?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod tts;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    AmplifyError, ConfigError, EnhancementError, FailureKind, PromptError, Result, TtsError,
};
pub use llm::{ProviderFactory, ProviderKind, StoryEnhancer};
pub use prompts::{PromptLibrary, PromptSet};
pub use tts::TtsService;
pub use types::{EnhancementResult, Insights, Language, ProviderDescriptor, TtsOutput};

use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Amplify service - the one object a request handler holds.
///
/// Bundles the configuration, the provider factory, the TTS service and the
/// optional prompt library.
pub struct Amplify {
    config: Config,
    factory: ProviderFactory,
    tts: TtsService,
    prompts: Option<Arc<PromptLibrary>>,
}

impl Amplify {
    /// Create an instance from configuration.
    ///
    /// Fails only when a prompt directory is configured but cannot be loaded;
    /// missing provider credentials are reported at request time.
    pub fn new(config: Config) -> Result<Self> {
        tracing::debug!("Initializing Amplify v{}", VERSION);

        let prompts = match config.prompts_dir() {
            Some(dir) => Some(Arc::new(PromptLibrary::open(&dir, config.prompts.hot_reload)?)),
            None => None,
        };
        let prompt_set = prompts
            .as_ref()
            .map(|library| PromptSet::with_library(Arc::clone(library)))
            .unwrap_or_default();

        let factory = ProviderFactory::new(config.llm.clone(), prompt_set);
        let tts = TtsService::new(&config);

        Ok(Self {
            config,
            factory,
            tts,
            prompts,
        })
    }

    /// Create an instance with the configuration from the default location.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::load()?)
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The provider factory.
    pub fn factory(&self) -> &ProviderFactory {
        &self.factory
    }

    /// The text-to-speech service.
    pub fn tts(&self) -> &TtsService {
        &self.tts
    }

    /// The prompt library, when a prompt directory is configured.
    pub fn prompts(&self) -> Option<&PromptLibrary> {
        self.prompts.as_deref()
    }

    /// Enhance a story told about a photo.
    pub async fn enhance_photo(
        &self,
        photo: &[u8],
        transcript: &str,
        language: &str,
    ) -> Result<EnhancementResult> {
        let service = self.factory.create_service()?;
        tracing::debug!(
            provider = service.provider_name(),
            vision = service.supports_vision(),
            "Enhancing photo story"
        );
        Ok(service
            .enhance_story_with_photo(photo, transcript, language)
            .await?)
    }

    /// Enhance a summary of a video clip.
    pub async fn enhance_video_summary(
        &self,
        source_transcript: &str,
        summary: &str,
        language: &str,
    ) -> Result<EnhancementResult> {
        let service = self.factory.create_service()?;
        Ok(service
            .enhance_video_summary(source_transcript, summary, language)
            .await?)
    }

    /// Narrate an enhanced story.
    pub async fn narrate(
        &self,
        result: &EnhancementResult,
        language: &str,
        voice: Option<&str>,
    ) -> Result<TtsOutput> {
        Ok(self
            .tts
            .generate_audio(result.enhanced_text(), language, voice)
            .await?)
    }
}
