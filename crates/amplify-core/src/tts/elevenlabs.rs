//! ElevenLabs text-to-speech.
//!
//! Voices can be given as a premade voice name ("Rachel") or a raw voice
//! id. Without one, a default voice is chosen per language.

use super::{request_error, SpeechSynthesizer, VoiceInfo};
use crate::config::ElevenLabsConfig;
use crate::error::TtsError;
use crate::types::{AudioFormat, TtsOutput};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use std::time::Duration;

const RACHEL: &str = "21m00Tcm4TlvDq8ikWAM";

/// Premade voice name → voice id.
const PREMADE_VOICES: &[(&str, &str)] = &[
    ("Rachel", RACHEL),
    ("Domi", "AZnzlk1XvdvUeBnXmlld"),
    ("Bella", "EXAVITQu4vr4xnSDxMaL"),
    ("Antoni", "ErXwobaYiN019PkySvjV"),
    ("Elli", "MF3mGyEYCl7XYWbV9V6O"),
    ("Josh", "TxGEqnHWrfWFTfGW9XjX"),
    ("Arnold", "VR6AewLTigWG4xSOukaG"),
    ("Adam", "pNInz6obpgDQGcFmaJgB"),
    ("Sam", "yoZ06aMxZJJ28mfd3POQ"),
];

/// Language code → default voice id.
const LANGUAGE_VOICES: &[(&str, &str)] = &[
    ("en", RACHEL),
    ("es", "VR6AewLTigWG4xSOukaG"),
    ("fr", "XB0fDUnXU5powFXDhCwa"),
    ("de", "jBpfuIE2acCO8z3wKNLl"),
    ("it", "oWAxZDx7w5VEj9dCyTzz"),
    ("pt", "pMsXgVXv3BLzUgSXRplE"),
];

pub(super) const VOICES: &[VoiceInfo] = &[
    VoiceInfo {
        name: "Rachel",
        description: "Clear female American voice",
    },
    VoiceInfo {
        name: "Domi",
        description: "Strong female American voice",
    },
    VoiceInfo {
        name: "Bella",
        description: "Soft female American voice",
    },
    VoiceInfo {
        name: "Antoni",
        description: "Well-rounded male American voice",
    },
    VoiceInfo {
        name: "Elli",
        description: "Emotional female American voice",
    },
    VoiceInfo {
        name: "Josh",
        description: "Deep male American voice",
    },
    VoiceInfo {
        name: "Arnold",
        description: "Crisp male American voice",
    },
    VoiceInfo {
        name: "Adam",
        description: "Deep male American voice",
    },
    VoiceInfo {
        name: "Sam",
        description: "Raspy male American voice",
    },
];

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsSpeech {
    api_key: String,
    endpoint: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl ElevenLabsSpeech {
    pub fn new(
        api_key: &str,
        config: &ElevenLabsConfig,
        timeout: Duration,
    ) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TtsError::provider(
                    "ElevenLabs",
                    None,
                    &format!("client initialization failed: {e}"),
                )
            })?;

        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            timeout,
        })
    }
}

/// Default voice id for a language; Rachel for anything unmapped.
pub fn voice_for_language(language: &str) -> &'static str {
    let language = language.to_lowercase();
    LANGUAGE_VOICES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, id)| *id)
        .unwrap_or(RACHEL)
}

/// Resolve a voice name or id to a voice id.
fn resolve_voice(voice: Option<&str>, language: &str) -> String {
    let Some(voice) = voice.map(str::trim).filter(|v| !v.is_empty()) else {
        return voice_for_language(language).to_string();
    };

    if let Some((_, id)) = PREMADE_VOICES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(voice))
    {
        return (*id).to_string();
    }
    if is_voice_id(voice) {
        return voice.to_string();
    }

    let fallback = voice_for_language(language);
    tracing::warn!("Unknown ElevenLabs voice '{voice}', using {fallback}");
    fallback.to_string()
}

fn is_voice_id(value: &str) -> bool {
    value.len() == 20 && value.chars().all(|c| c.is_ascii_alphanumeric())
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeech {
    fn provider_name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        voice: Option<&str>,
    ) -> Result<TtsOutput, TtsError> {
        let voice_id = resolve_voice(voice, language);
        tracing::info!(
            "Generating ElevenLabs TTS audio: {} chars, voice: {voice_id}",
            text.chars().count()
        );

        let resp = self
            .client
            .post(format!("{}/text-to-speech/{voice_id}", self.endpoint))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &self.model,
            })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error("ElevenLabs", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("ElevenLabs TTS generation failed: HTTP {status}: {text}");
            return Err(TtsError::provider("ElevenLabs", Some(status.as_u16()), &text));
        }

        let mut audio = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| request_error("ElevenLabs", e))?;
            audio.extend_from_slice(&chunk);
        }

        tracing::info!("ElevenLabs audio generated successfully ({} bytes)", audio.len());
        Ok(TtsOutput::new(audio, AudioFormat::Mp3))
    }
}
