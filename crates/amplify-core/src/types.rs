//! Core data types shared by enhancement providers, the factory and TTS.

use crate::error::EnhancementError;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum transcript length accepted for enhancement, in characters.
pub const MAX_TRANSCRIPT_CHARS: usize = 5000;

/// Insight category → explanation, in the order the model produced them.
pub type Insights = IndexMap<String, String>;

/// The validated output of any enhancement provider.
///
/// Both fields are guaranteed non-empty: a provider payload that lacks
/// either is rejected during construction, never returned partially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnhancementResult {
    /// Enhanced version of the user's narrative
    #[serde(rename = "enhanced_transcript")]
    enhanced_text: String,

    /// Insight category → explanation (e.g. "plot", "character")
    insights: Insights,
}

impl EnhancementResult {
    /// Build a result, enforcing the non-empty invariants.
    ///
    /// `provider` is only used to attribute the error.
    pub fn new(
        provider: &str,
        enhanced_text: impl Into<String>,
        insights: Insights,
    ) -> Result<Self, EnhancementError> {
        let enhanced_text = enhanced_text.into();
        if enhanced_text.trim().is_empty() {
            return Err(EnhancementError::malformed(
                provider,
                "Invalid response format: 'enhanced_transcript' is empty",
            ));
        }
        if insights.is_empty() {
            return Err(EnhancementError::malformed(
                provider,
                "Invalid response format: 'insights' is empty",
            ));
        }
        Ok(Self {
            enhanced_text,
            insights,
        })
    }

    /// The enhanced narrative.
    pub fn enhanced_text(&self) -> &str {
        &self.enhanced_text
    }

    /// Insight category → explanation.
    pub fn insights(&self) -> &Insights {
        &self.insights
    }
}

/// Languages accepted for enhancement (ISO 639-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ja,
    Ko,
    Zh,
    Ru,
    Ar,
    Hi,
}

impl Language {
    /// Every supported language in declaration order.
    pub const ALL: [Language; 12] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Pt,
        Language::Ja,
        Language::Ko,
        Language::Zh,
        Language::Ru,
        Language::Ar,
        Language::Hi,
    ];

    /// Two-letter code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Zh => "zh",
            Language::Ru => "ru",
            Language::Ar => "ar",
            Language::Hi => "hi",
        }
    }

    /// English name, used inside prompts.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::It => "Italian",
            Language::Pt => "Portuguese",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
            Language::Zh => "Chinese",
            Language::Ru => "Russian",
            Language::Ar => "Arabic",
            Language::Hi => "Hindi",
        }
    }
}

impl FromStr for Language {
    type Err = EnhancementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == s)
            .ok_or_else(|| EnhancementError::InvalidInput(format!("Invalid language code: {s}")))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Static description of a provider + model combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    /// Provider name ("gemini", "openai")
    pub name: String,

    /// Whether the configured model accepts images
    pub supports_vision: bool,

    /// Model identifier passed to the backend
    pub model: String,

    /// Human-readable summary
    pub description: String,
}

/// Audio container of a synthesized clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
}

impl AudioFormat {
    /// File extension / format tag.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesized speech, produced fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsOutput {
    /// Raw audio bytes
    pub audio: Vec<u8>,
    /// Container format
    pub format: AudioFormat,
}

impl TtsOutput {
    pub fn new(audio: Vec<u8>, format: AudioFormat) -> Self {
        Self { audio, format }
    }

    /// Base64 text-safe encoding of the audio.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.audio)
    }

    /// JSON-friendly view: `{"audio_base64": ..., "audio_format": "mp3"}`.
    pub fn encoded(&self) -> EncodedAudio {
        EncodedAudio {
            audio_base64: self.to_base64(),
            audio_format: self.format,
        }
    }
}

/// Base64 form of [`TtsOutput`] for JSON responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedAudio {
    pub audio_base64: String,
    pub audio_format: AudioFormat,
}
