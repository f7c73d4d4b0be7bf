//! Extracting and validating the JSON payload of a model reply.
//!
//! Models are asked for a JSON object but routinely wrap it in prose or a
//! markdown fence. Extraction tries, in order: the whole text, the first
//! fenced block, the outermost `{...}` span.

use crate::error::EnhancementError;
use crate::types::{EnhancementResult, Insights};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("Invalid fenced block regex")
});

/// Parse a model reply into an [`EnhancementResult`].
pub fn parse_enhancement(
    provider: &str,
    text: &str,
) -> Result<EnhancementResult, EnhancementError> {
    let payload = extract_json(text).ok_or_else(|| {
        tracing::debug!(provider, "Unparseable model reply: {}", preview(text));
        EnhancementError::malformed(provider, "Failed to parse AI response as JSON")
    })?;
    validate_payload(provider, payload)
}

/// Locate the JSON object in a model reply.
fn extract_json(text: &str) -> Option<Value> {
    let text = text.trim();

    if let Some(value) = parse_object(text) {
        return Some(value);
    }

    if let Some(block) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        if let Some(value) = parse_object(block.as_str()) {
            return Some(value);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&text[start..=end])
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Enforce the `enhanced_transcript` + `insights` contract.
fn validate_payload(
    provider: &str,
    payload: Value,
) -> Result<EnhancementResult, EnhancementError> {
    let text = payload
        .get("enhanced_transcript")
        .or_else(|| payload.get("enhanced_text"))
        .ok_or_else(|| {
            EnhancementError::malformed(
                provider,
                "Invalid response format: missing 'enhanced_transcript' field",
            )
        })?
        .as_str()
        .ok_or_else(|| {
            EnhancementError::malformed(
                provider,
                "Invalid response format: 'enhanced_transcript' must be a string",
            )
        })?;

    let raw_insights = payload.get("insights").ok_or_else(|| {
        EnhancementError::malformed(provider, "Invalid response format: missing 'insights' field")
    })?;
    let object = raw_insights.as_object().ok_or_else(|| {
        EnhancementError::malformed(
            provider,
            "Invalid response format: 'insights' must be an object",
        )
    })?;

    // Object iteration follows the reply's key order
    let mut insights = Insights::with_capacity(object.len());
    for (category, explanation) in object {
        let explanation = explanation.as_str().ok_or_else(|| {
            EnhancementError::malformed(
                provider,
                format!("Invalid response format: insight '{category}' must be a string"),
            )
        })?;
        if !explanation.trim().is_empty() {
            insights.insert(category.clone(), explanation.to_string());
        }
    }

    EnhancementResult::new(provider, text.trim(), insights)
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}
