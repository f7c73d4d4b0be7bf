//! The `amplify speak` command: text to an MP3 file.

use super::{expand_path, print_json};
use amplify_core::{Config, TtsService};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

/// Arguments for the `speak` command.
#[derive(Args, Debug)]
pub struct SpeakArgs {
    /// Text to narrate
    #[arg(short, long)]
    pub text: String,

    /// Output audio file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Language code
    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// Voice (provider-specific)
    #[arg(long)]
    pub voice: Option<String>,

    /// TTS provider: openai or elevenlabs (overrides config)
    #[arg(long)]
    pub provider: Option<String>,
}

/// Execute the speak command.
pub async fn execute(args: SpeakArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(provider) = args.provider {
        config.tts.provider = provider;
    }
    let service = TtsService::new(&config);

    let audio = service
        .generate_audio(&args.text, &args.language, args.voice.as_deref())
        .await?;

    let output = expand_path(&args.output);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, &audio.audio)?;
    tracing::info!("Audio written to {:?}", output);

    print_json(&json!({
        "provider": service.active_provider(),
        "audio_file": output.display().to_string(),
        "audio_format": audio.format,
        "bytes": audio.audio.len(),
    }))
}
