//! Google Gemini provider using the `generateContent` REST API.
//!
//! The photo travels inline as base64 alongside the text prompt. Gemini
//! models are always treated as vision-capable.

use super::provider::{
    validate_photo_request, validate_summary_request, ImageInput, StoryEnhancer,
};
use super::request_error;
use super::response::parse_enhancement;
use crate::config::GeminiConfig;
use crate::error::EnhancementError;
use crate::prompts::PromptSet;
use crate::types::EnhancementResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const PROVIDER: &str = "gemini";

/// Gemini provider.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
    prompts: PromptSet,
}

impl GeminiProvider {
    /// Create a provider. Fails when the key is empty or the HTTP client
    /// cannot be initialized.
    pub fn new(
        api_key: &str,
        config: &GeminiConfig,
        timeout: Duration,
        prompts: PromptSet,
    ) -> Result<Self, EnhancementError> {
        if api_key.trim().is_empty() {
            return Err(EnhancementError::Factory(
                "Gemini API key is required but not provided".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                EnhancementError::Factory(format!("Failed to initialize Gemini client: {e}"))
            })?;

        let model = config.model.trim_start_matches("models/").to_string();
        tracing::info!("Gemini service initialized with model: {model}");

        Ok(Self {
            api_key: api_key.to_string(),
            model,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
            timeout,
            prompts,
        })
    }

    async fn generate(
        &self,
        prompt: String,
        image: Option<ImageInput>,
    ) -> Result<String, EnhancementError> {
        let start = Instant::now();

        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(image) = image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type,
                    data: image.data,
                },
            });
        }

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySetting::defaults(),
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, "Gemini", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(EnhancementError::invocation(
                PROVIDER,
                Some(status.as_u16()),
                format!("Gemini HTTP {status}: {text}"),
            ));
        }

        let parsed: GenerateResponse = resp.json().await.map_err(|e| {
            EnhancementError::malformed(PROVIDER, format!("Failed to parse Gemini response: {e}"))
        })?;

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!(" (blocked: {r})"))
                .unwrap_or_default();
            EnhancementError::malformed(PROVIDER, format!("Gemini returned no candidates{reason}"))
        })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(EnhancementError::malformed(
                PROVIDER,
                format!("Empty response from Gemini (finish reason: {reason})"),
            ));
        }

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Gemini reply received"
        );
        Ok(text)
    }
}

#[async_trait]
impl StoryEnhancer for GeminiProvider {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn supports_vision(&self) -> bool {
        true
    }

    async fn enhance_story_with_photo(
        &self,
        photo: &[u8],
        transcript: &str,
        language: &str,
    ) -> Result<EnhancementResult, EnhancementError> {
        let language = validate_photo_request(photo, transcript, language)?;
        let prompt = self.prompts.photo(transcript, language);
        let reply = self.generate(prompt, Some(ImageInput::from_bytes(photo))).await?;
        parse_enhancement(PROVIDER, &reply)
    }

    async fn enhance_video_summary(
        &self,
        source_transcript: &str,
        summary: &str,
        language: &str,
    ) -> Result<EnhancementResult, EnhancementError> {
        let language = validate_summary_request(source_transcript, summary, language)?;
        let prompt = self.prompts.youtube(source_transcript, summary, language);
        let reply = self.generate(prompt, None).await?;
        parse_enhancement(PROVIDER, &reply)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl SafetySetting {
    fn defaults() -> Vec<Self> {
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| Self {
            category,
            threshold: "BLOCK_MEDIUM_AND_ABOVE",
        })
        .collect()
    }
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
    const MODEL_PATH: &str = "/models/gemini-2.5-flash-lite:generateContent";

    fn provider(server: &MockServer) -> GeminiProvider {
        let config = GeminiConfig {
            api_key: "unused".to_string(),
            model: "models/gemini-2.5-flash-lite".to_string(),
            endpoint: server.uri(),
        };
        GeminiProvider::new(
            "test-key",
            &config,
            Duration::from_secs(5),
            PromptSet::builtin(),
        )
        .unwrap()
    }

    fn reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = GeminiProvider::new(
            " ",
            &GeminiConfig::default(),
            Duration::from_secs(1),
            PromptSet::builtin(),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("Gemini API key is required"));
    }

    #[test]
    fn test_request_serialization() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: "hi".into() },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySetting::defaults(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["safetySettings"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_enhance_story_with_photo() {
        let server = MockServer::start().await;
        let payload = r#"```json
{"enhanced_transcript": "The sun dipped low over the lake.", "insights": {"setting": "Golden light"}}
```"#;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({"generationConfig": {"topK": 40}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(payload)))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server)
            .enhance_story_with_photo(JPEG, "We watched the sunset", "en")
            .await
            .unwrap();
        assert_eq!(result.enhanced_text(), "The sun dipped low over the lake.");
        assert_eq!(result.insights()["setting"], "Golden light");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("We watched the sunset"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("{}")))
            .expect(0)
            .mount(&server)
            .await;

        let gemini = provider(&server);
        let err = gemini.enhance_story_with_photo(JPEG, "", "en").await.unwrap_err();
        assert!(err.to_string().contains("Transcript is required"));

        let err = gemini.enhance_story_with_photo(JPEG, "story", "xx").await.unwrap_err();
        assert!(err.to_string().contains("Invalid language code: xx"));
    }

    #[tokio::test]
    async fn test_missing_field_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reply(r#"{"insights": {"plot": "x"}}"#)),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .enhance_story_with_photo(JPEG, "story", "en")
            .await
            .unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::MalformedResponse));
        assert!(err.to_string().contains("missing 'enhanced_transcript' field"));
    }

    #[tokio::test]
    async fn test_quota_error_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Resource has been exhausted (e.g. check quota).", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .enhance_story_with_photo(JPEG, "story", "en")
            .await
            .unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::QuotaExceeded));
        assert_eq!(err.http_status(), 503);
    }

    #[tokio::test]
    async fn test_blocked_prompt_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .enhance_story_with_photo(JPEG, "story", "en")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("blocked: SAFETY"));
    }

    #[tokio::test]
    async fn test_video_summary_sends_text_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                r#"{"enhanced_transcript": "Sharper summary", "insights": {"accuracy": "Good"}}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server)
            .enhance_video_summary("The clip explains tides.", "It is about the sea", "en")
            .await
            .unwrap();
        assert_eq!(result.enhanced_text(), "Sharper summary");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_supports_vision_is_static() {
        let config = GeminiConfig::default();
        let gemini =
            GeminiProvider::new("k", &config, Duration::from_secs(1), PromptSet::builtin())
                .unwrap();
        assert!(gemini.supports_vision());
        assert_eq!(gemini.provider_name(), "gemini");
    }
}
