//! The `amplify tts` command for speech provider diagnostics.

use super::print_json;
use amplify_core::{Config, TtsService};
use clap::{Args, Subcommand};
use serde_json::json;

/// Arguments for the `tts` command.
#[derive(Args, Debug)]
pub struct TtsArgs {
    #[command(subcommand)]
    pub command: TtsCommand,
}

/// Subcommands for TTS diagnostics.
#[derive(Subcommand, Debug)]
pub enum TtsCommand {
    /// Show the active provider and test every configured one
    Status,

    /// List voices per provider
    Voices {
        /// Include this provider even when it has no client
        #[arg(long)]
        provider: Option<String>,
    },
}

/// Execute the tts command.
pub async fn execute(args: TtsArgs, config: Config) -> anyhow::Result<()> {
    let service = TtsService::new(&config);

    match args.command {
        TtsCommand::Status => {
            let providers = service.test_service().await;
            print_json(&json!({
                "configured_provider": config.tts.provider,
                "active_provider": service.active_provider(),
                "supported_languages": service.supported_languages(),
                "providers": providers,
            }))
        }

        TtsCommand::Voices { provider } => {
            print_json(&service.available_voices(provider.as_deref()))
        }
    }
}
