//! OpenAI speech endpoint (`/audio/speech`).

use super::{request_error, SpeechSynthesizer, VoiceInfo};
use crate::error::TtsError;
use crate::types::{AudioFormat, TtsOutput};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Voice names accepted by the OpenAI speech API.
pub const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

const FALLBACK_VOICE: &str = "alloy";

pub(super) const VOICES: &[VoiceInfo] = &[
    VoiceInfo {
        name: "alloy",
        description: "Balanced, neutral voice",
    },
    VoiceInfo {
        name: "echo",
        description: "Deep, authoritative voice",
    },
    VoiceInfo {
        name: "fable",
        description: "Expressive, storytelling voice",
    },
    VoiceInfo {
        name: "onyx",
        description: "Deep, professional voice",
    },
    VoiceInfo {
        name: "nova",
        description: "Bright, energetic voice",
    },
    VoiceInfo {
        name: "shimmer",
        description: "Soft, gentle voice",
    },
];

/// OpenAI text-to-speech client.
pub struct OpenAiSpeech {
    api_key: String,
    endpoint: String,
    model: String,
    default_voice: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OpenAiSpeech {
    pub fn new(
        api_key: &str,
        endpoint: &str,
        model: &str,
        default_voice: &str,
        timeout: Duration,
    ) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TtsError::provider(
                    "OpenAI",
                    None,
                    &format!("client initialization failed: {e}"),
                )
            })?;

        Ok(Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            default_voice: default_voice.to_string(),
            client,
            timeout,
        })
    }

    /// Requested voice, else the configured default; invalid names fall
    /// back to `alloy`.
    fn resolve_voice<'a>(&'a self, voice: Option<&'a str>) -> &'a str {
        let requested = voice.unwrap_or(self.default_voice.as_str()).trim();
        if requested.is_empty() {
            FALLBACK_VOICE
        } else if OPENAI_VOICES.contains(&requested) {
            requested
        } else {
            tracing::warn!("Invalid OpenAI voice '{requested}', using '{FALLBACK_VOICE}'");
            FALLBACK_VOICE
        }
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn synthesize(
        &self,
        text: &str,
        _language: &str,
        voice: Option<&str>,
    ) -> Result<TtsOutput, TtsError> {
        let voice = self.resolve_voice(voice);
        tracing::info!(
            "Generating OpenAI TTS audio: {} chars, voice: {voice}",
            text.chars().count()
        );

        let body = SpeechRequest {
            model: &self.model,
            voice,
            input: text,
            response_format: AudioFormat::Mp3.as_str(),
        };

        let resp = self
            .client
            .post(format!("{}/audio/speech", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error("OpenAI", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("OpenAI TTS generation failed: HTTP {status}: {text}");
            return Err(TtsError::provider("OpenAI", Some(status.as_u16()), &text));
        }

        let audio = resp
            .bytes()
            .await
            .map_err(|e| request_error("OpenAI", e))?;
        tracing::info!("OpenAI audio generated successfully ({} bytes)", audio.len());
        Ok(TtsOutput::new(audio.to_vec(), AudioFormat::Mp3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn speech(server: &MockServer) -> OpenAiSpeech {
        OpenAiSpeech::new(
            "sk-test",
            &server.uri(),
            "tts-1",
            "nova",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "tts-1",
                "voice": "nova",
                "input": "Once upon a time",
                "response_format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x10]))
            .expect(1)
            .mount(&server)
            .await;

        let output = speech(&server)
            .synthesize("Once upon a time", "en", None)
            .await
            .unwrap();
        assert_eq!(output.audio, vec![0xFF, 0xFB, 0x10]);
    }

    #[tokio::test]
    async fn test_invalid_voice_falls_back_to_alloy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1]))
            .mount(&server)
            .await;

        speech(&server).synthesize("Hi", "en", Some("Rachel")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["voice"], "alloy");
    }

    #[tokio::test]
    async fn test_failures_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key provided"))
            .mount(&server)
            .await;

        let err = speech(&server).synthesize("Hi", "en", None).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI TTS authentication failed");
        assert!(matches!(err, TtsError::Provider { kind: FailureKind::Authentication, .. }));
    }

    #[tokio::test]
    async fn test_quota_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).set_body_string("You exceeded your current quota"),
            )
            .mount(&server)
            .await;

        let err = speech(&server).synthesize("Hi", "en", None).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI TTS quota exceeded");
        assert_eq!(err.http_status(), 503);
    }
}
