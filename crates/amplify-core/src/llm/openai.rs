//! OpenAI provider using the Chat Completions API.
//!
//! Vision-capable models receive the photo as a data URL in the user
//! message content array. Text-only models get the prompt alone, with a
//! note that an image was supplied but cannot be analyzed.

use super::provider::{
    validate_photo_request, validate_summary_request, ImageInput, StoryEnhancer,
};
use super::request_error;
use super::response::parse_enhancement;
use crate::config::OpenAiConfig;
use crate::error::EnhancementError;
use crate::prompts::PromptSet;
use crate::types::EnhancementResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const PROVIDER: &str = "openai";

/// Models known to accept image input.
pub const VISION_MODELS: &[&str] = &[
    "gpt-4-vision-preview",
    "gpt-4-turbo",
    "gpt-4o",
    "gpt-4o-mini",
];

const TEXT_ONLY_NOTE: &str = "Note: An image was provided but cannot be analyzed with this model. \
Please enhance the story based on the transcript alone.";

const SYSTEM_PROMPT: &str =
    "You are a creative story enhancement assistant. Always respond with valid JSON.";

/// Whether `model` is in the vision allowlist.
pub fn model_supports_vision(model: &str) -> bool {
    VISION_MODELS.contains(&model)
}

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
    prompts: PromptSet,
}

impl OpenAiProvider {
    /// Create a provider. Fails when the key is empty or the HTTP client
    /// cannot be initialized.
    pub fn new(
        api_key: &str,
        config: &OpenAiConfig,
        timeout: Duration,
        prompts: PromptSet,
    ) -> Result<Self, EnhancementError> {
        if api_key.trim().is_empty() {
            return Err(EnhancementError::Factory(
                "OpenAI API key is required but not provided".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                EnhancementError::Factory(format!("Failed to initialize OpenAI client: {e}"))
            })?;

        tracing::info!(
            "OpenAI service initialized with model: {} (vision: {})",
            config.model,
            model_supports_vision(&config.model)
        );

        Ok(Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
            timeout,
            prompts,
        })
    }

    async fn complete(&self, user: MessageContent) -> Result<String, EnhancementError> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: 2000,
            temperature: 0.7,
            // JSON mode is only offered by the newer (vision-era) models
            response_format: self
                .supports_vision()
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, "OpenAI", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(EnhancementError::invocation(
                PROVIDER,
                Some(status.as_u16()),
                format!("OpenAI HTTP {status}: {text}"),
            ));
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| {
            EnhancementError::malformed(PROVIDER, format!("Failed to parse OpenAI response: {e}"))
        })?;

        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| EnhancementError::malformed(PROVIDER, "Empty response from OpenAI"))?;

        tracing::debug!(
            model = %self.model,
            tokens = chat_resp.usage.map(|u| u.total_tokens),
            latency_ms = start.elapsed().as_millis() as u64,
            "OpenAI reply received"
        );
        Ok(text)
    }
}

#[async_trait]
impl StoryEnhancer for OpenAiProvider {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn supports_vision(&self) -> bool {
        model_supports_vision(&self.model)
    }

    async fn enhance_story_with_photo(
        &self,
        photo: &[u8],
        transcript: &str,
        language: &str,
    ) -> Result<EnhancementResult, EnhancementError> {
        let language = validate_photo_request(photo, transcript, language)?;
        let prompt = self.prompts.photo(transcript, language);

        let content = if self.supports_vision() {
            MessageContent::Parts(vec![
                ChatContent::Text { text: prompt },
                ChatContent::ImageUrl {
                    image_url: ImageUrl {
                        url: ImageInput::from_bytes(photo).data_url(),
                    },
                },
            ])
        } else {
            tracing::debug!("Model {} has no vision support, sending transcript only", self.model);
            MessageContent::Text(format!("{prompt}\n\n{TEXT_ONLY_NOTE}"))
        };

        let reply = self.complete(content).await?;
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
        let reply = self.complete(MessageContent::Text(prompt)).await?;
        parse_enhancement(PROVIDER, &reply)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ChatContent>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}
