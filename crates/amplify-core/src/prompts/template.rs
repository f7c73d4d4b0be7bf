//! Prompt templates and the built-in defaults.

use crate::error::PromptError;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

/// A prompt template loaded from a category file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub category: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Variables that must be supplied to `format`
    #[serde(default)]
    pub variables: Vec<String>,
    pub template: String,
}

impl PromptTemplate {
    /// Parse the template body, reporting syntax errors.
    pub fn compile(&self) -> Result<Tera, PromptError> {
        let mut tera = Tera::default();
        // Prompts are plain text sent to a model, never HTML
        tera.autoescape_on(Vec::new());
        tera.add_raw_template(&self.name, &self.template)?;
        Ok(tera)
    }

    /// Render the template with `{{ name }}` placeholders filled from `vars`.
    ///
    /// Every declared variable must be present in `vars`.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        let missing: Vec<String> = self
            .variables
            .iter()
            .filter(|var| !vars.iter().any(|(name, _)| name == var))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PromptError::MissingVariables(missing));
        }

        let mut context = Context::new();
        for (name, value) in vars {
            context.insert(*name, value);
        }
        Ok(self.compile()?.render(&self.name, &context)?)
    }
}

/// Category used for photo-based story enhancement.
pub const PHOTO_CATEGORY: &str = "photo";

/// Category used for YouTube summary enhancement.
pub const YOUTUBE_CATEGORY: &str = "youtube";

const PHOTO_TEMPLATE: &str = r#"You are a creative story enhancement AI assistant specializing in enriching narratives through visual analysis.

TASK: Analyze the provided photo and enhance the user's story transcript with rich, immersive details.

ORIGINAL STORY:
"{{ transcript }}"

LANGUAGE: {{ language_name }}

INSTRUCTIONS:
1. Carefully analyze the uploaded photo for visual elements, mood, setting details and the narrative possibilities the image suggests.
2. Enhance the original story with richer descriptive language, atmospheric details matching the visual mood, character development, improved plot structure and pacing, and sensory details.
3. Keep the core narrative intact while making it more engaging and vivid.
4. Generate specific insights about what improvements were made.

IMPORTANT:
- Maintain the original story's essence and intent
- Respond in {{ language_name }}
- Keep enhancements appropriate for all audiences

OUTPUT FORMAT (valid JSON):
```json
{
  "enhanced_transcript": "Your enhanced story here with rich details...",
  "insights": {
    "plot": "Explanation of plot improvements made",
    "character": "Character development enhancements",
    "setting": "Setting and atmosphere improvements",
    "mood": "Tone and mood enhancements based on the photo"
  }
}
```"#;

const YOUTUBE_TEMPLATE: &str = r#"You are a communication coach helping a user practise summarizing what they watched.

TASK: Improve the user's spoken summary of a video clip, using the clip's transcript as the source of truth.

CLIP TRANSCRIPT:
"{{ source_transcript }}"

USER SUMMARY:
"{{ transcript }}"

LANGUAGE: {{ language_name }}

INSTRUCTIONS:
1. Keep the user's voice and main takeaway.
2. Correct facts that contradict the clip transcript.
3. Improve structure, clarity and flow; add the key points the user missed.
4. Respond in {{ language_name }}.

OUTPUT FORMAT (valid JSON):
```json
{
  "enhanced_transcript": "The improved summary...",
  "insights": {
    "accuracy": "How well the summary matched the clip",
    "structure": "Structural improvements made",
    "clarity": "Wording and clarity improvements"
  }
}
```"#;

/// The template shipped with the crate for `category`, if any.
pub fn builtin(category: &str) -> Option<PromptTemplate> {
    let (template, variables) = match category {
        PHOTO_CATEGORY => (PHOTO_TEMPLATE, vec!["transcript", "language_name"]),
        YOUTUBE_CATEGORY => (
            YOUTUBE_TEMPLATE,
            vec!["source_transcript", "transcript", "language_name"],
        ),
        _ => return None,
    };
    Some(PromptTemplate {
        category: category.to_string(),
        name: format!("builtin-{category}"),
        version: "1.0".to_string(),
        description: "Built-in default template".to_string(),
        last_updated: String::new(),
        tags: vec!["builtin".to_string()],
        variables: variables.into_iter().map(String::from).collect(),
        template: template.to_string(),
    })
}
