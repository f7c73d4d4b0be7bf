//! Story enhancer trait, request validation and image encoding.
//!
//! Defines the interface every enhancement backend implements. Input rules
//! live here so that every provider rejects the same requests with the same
//! messages before any network call is made.

use crate::error::EnhancementError;
use crate::types::{EnhancementResult, Language, MAX_TRANSCRIPT_CHARS};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

/// Base64-encoded image ready to send to a model API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Encode raw photo bytes, sniffing the MIME type from magic bytes.
    ///
    /// Unrecognized formats are sent as `image/jpeg`; the backend is the
    /// final judge of whether it can decode them.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let media_type = sniff_media_type(bytes).unwrap_or_else(|| {
            tracing::debug!("Unrecognized photo format, defaulting to image/jpeg");
            "image/jpeg"
        });

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

/// Trait that all story enhancement providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the factory hands out `Arc<dyn StoryEnhancer>`).
#[async_trait]
pub trait StoryEnhancer: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn provider_name(&self) -> &str;

    /// Whether this provider + model combination can analyze images.
    ///
    /// Static: never makes a network call.
    fn supports_vision(&self) -> bool;

    /// Enhance a narrative told about a photo.
    ///
    /// `language` is an ISO 639-1 code. Returns an [`EnhancementResult`]
    /// or an error; never a partial result.
    async fn enhance_story_with_photo(
        &self,
        photo: &[u8],
        transcript: &str,
        language: &str,
    ) -> Result<EnhancementResult, EnhancementError>;

    /// Enhance a user's summary of a video clip, using the clip's own
    /// transcript as context.
    async fn enhance_video_summary(
        &self,
        _source_transcript: &str,
        _summary: &str,
        _language: &str,
    ) -> Result<EnhancementResult, EnhancementError> {
        Err(EnhancementError::Unsupported {
            provider: self.provider_name().to_string(),
            operation: "video summary enhancement",
        })
    }

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Validate a photo enhancement request.
///
/// Checks run in a fixed order (photo, transcript, length, language) so the
/// first violation reported is stable.
pub fn validate_photo_request(
    photo: &[u8],
    transcript: &str,
    language: &str,
) -> Result<Language, EnhancementError> {
    if photo.is_empty() {
        return Err(EnhancementError::InvalidInput(
            "Photo data is required".to_string(),
        ));
    }
    validate_transcript(transcript)?;
    language.parse()
}

/// Validate a video summary enhancement request.
pub fn validate_summary_request(
    source_transcript: &str,
    summary: &str,
    language: &str,
) -> Result<Language, EnhancementError> {
    if source_transcript.trim().is_empty() {
        return Err(EnhancementError::InvalidInput(
            "Source transcript is required".to_string(),
        ));
    }
    validate_transcript(summary)?;
    language.parse()
}

fn validate_transcript(transcript: &str) -> Result<(), EnhancementError> {
    if transcript.trim().is_empty() {
        return Err(EnhancementError::InvalidInput(
            "Transcript is required".to_string(),
        ));
    }
    if transcript.chars().count() > MAX_TRANSCRIPT_CHARS {
        return Err(EnhancementError::InvalidInput(format!(
            "Transcript too long (max {MAX_TRANSCRIPT_CHARS} characters)"
        )));
    }
    Ok(())
}
