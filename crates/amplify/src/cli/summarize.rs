//! The `amplify summarize` command: improve a summary of a video clip.

use super::enhance::EnhanceOutput;
use super::{apply_llm_overrides, expand_path, print_json};
use amplify_core::{Amplify, Config};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the `summarize` command.
#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Text file holding the clip's transcript
    #[arg(short, long)]
    pub source: PathBuf,

    /// The user's summary of the clip
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
}

/// Execute the summarize command.
pub async fn execute(args: SummarizeArgs, mut config: Config) -> anyhow::Result<()> {
    let source_path = expand_path(&args.source);
    let source = std::fs::read_to_string(&source_path).map_err(|e| {
        anyhow::anyhow!("Failed to read transcript {}: {e}", source_path.display())
    })?;

    apply_llm_overrides(&mut config, args.provider.as_deref(), args.no_fallback);
    let amplify = Amplify::new(config)?;

    let result = amplify
        .enhance_video_summary(&source, &args.transcript, &args.language)
        .await?;

    print_json(&EnhanceOutput::new(
        amplify.factory().current_provider(),
        &result,
    ))
}
