//! The `amplify enhance` command: enhance a story told about a photo.

use super::{apply_llm_overrides, expand_path, print_json};
use amplify_core::{Amplify, AmplifyError, Config, EnhancementResult, Insights};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the `enhance` command.
#[derive(Args, Debug)]
pub struct EnhanceArgs {
    /// Photo the story is about (JPEG, PNG, GIF or WebP)
    #[arg(required = true)]
    pub photo: PathBuf,

    /// The user's story
    #[arg(short, long)]
    pub transcript: String,

    /// Language code (ISO 639-1)
    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Preferred AI provider (overrides config)
    #[arg(long)]
    pub provider: Option<String>,

    /// Fail instead of falling back to another provider
    #[arg(long)]
    pub no_fallback: bool,

    /// Also narrate the enhanced story into this MP3 file
    #[arg(long)]
    pub audio: Option<PathBuf>,

    /// Voice for narration (provider-specific)
    #[arg(long, requires = "audio")]
    pub voice: Option<String>,
}

/// JSON written to stdout.
#[derive(Serialize)]
pub(crate) struct EnhanceOutput<'a> {
    pub provider: Option<String>,
    pub enhanced_transcript: &'a str,
    pub insights: &'a Insights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}

impl<'a> EnhanceOutput<'a> {
    pub(crate) fn new(provider: Option<String>, result: &'a EnhancementResult) -> Self {
        Self {
            provider,
            enhanced_transcript: result.enhanced_text(),
            insights: result.insights(),
            audio_file: None,
        }
    }
}

/// Execute the enhance command.
pub async fn execute(args: EnhanceArgs, mut config: Config) -> anyhow::Result<()> {
    let photo_path = expand_path(&args.photo);
    let photo = std::fs::read(&photo_path).map_err(|e| {
        anyhow::anyhow!("Failed to read photo {}: {e}", photo_path.display())
    })?;
    tracing::debug!("Read {} bytes from {:?}", photo.len(), photo_path);

    apply_llm_overrides(&mut config, args.provider.as_deref(), args.no_fallback);
    let amplify = Amplify::new(config)?;

    let result = match amplify
        .enhance_photo(&photo, &args.transcript, &args.language)
        .await
    {
        Ok(result) => result,
        Err(AmplifyError::Enhancement(e)) if e.is_caller_error() => {
            anyhow::bail!("{e}");
        }
        Err(e) => return Err(e.into()),
    };

    let mut output = EnhanceOutput::new(amplify.factory().current_provider(), &result);

    if let Some(audio_path) = args.audio {
        let audio_path = expand_path(&audio_path);
        let audio = amplify
            .narrate(&result, &args.language, args.voice.as_deref())
            .await?;
        std::fs::write(&audio_path, &audio.audio)?;
        tracing::info!(
            "Narration written to {:?} ({} bytes, {})",
            audio_path,
            audio.audio.len(),
            amplify.tts().active_provider()
        );
        output.audio_file = Some(audio_path.display().to_string());
    }

    print_json(&output)
}
