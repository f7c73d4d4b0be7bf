//! Offline speech generator used when no provider is available.

use super::SpeechSynthesizer;
use crate::error::TtsError;
use crate::types::{AudioFormat, TtsOutput};
use async_trait::async_trait;

/// A single silent MPEG-1 Layer III frame header plus padding.
pub const SILENT_MP3_FRAME: [u8; 36] = {
    let mut frame = [0u8; 36];
    frame[0] = 0xFF;
    frame[1] = 0xFB;
    frame[2] = 0x90;
    frame
};

/// Returns [`SILENT_MP3_FRAME`] for every request without touching the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSpeech;

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        _voice: Option<&str>,
    ) -> Result<TtsOutput, TtsError> {
        tracing::info!("Using mock TTS for {} characters in {language}", text.chars().count());
        Ok(TtsOutput::new(SILENT_MP3_FRAME.to_vec(), AudioFormat::Mp3))
    }
}
