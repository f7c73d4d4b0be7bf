//! Amplify CLI - AI story enhancement with provider fallback and narration.
//!
//! Amplify sends a photo (or a video transcript) and a user's story to a
//! generative AI backend, prints the enhanced story with insights as JSON,
//! and can narrate the result to an MP3 file.
//!
//! # Usage
//!
//! ```bash
//! # Enhance a story about a photo
//! amplify enhance beach.jpg --transcript "We built a sandcastle"
//!
//! # Enhance and narrate
//! amplify enhance beach.jpg -t "We built a sandcastle" --audio story.mp3
//!
//! # Which providers are usable right now?
//! amplify providers list
//!
//! # View configuration
//! amplify config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Amplify - AI story enhancement with provider fallback and narration.
#[derive(Parser, Debug)]
#[command(name = "amplify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Enhance a story told about a photo
    Enhance(cli::enhance::EnhanceArgs),

    /// Improve a summary of a video clip using its transcript
    Summarize(cli::summarize::SummarizeArgs),

    /// Convert text to speech
    Speak(cli::speak::SpeakArgs),

    /// Inspect enhancement providers
    Providers(cli::providers::ProvidersArgs),

    /// Text-to-speech diagnostics
    Tts(cli::tts::TtsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match amplify_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `amplify config path`."
            );
            amplify_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Amplify v{}", amplify_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Enhance(args) => cli::enhance::execute(args, config).await,
        Commands::Summarize(args) => cli::summarize::execute(args, config).await,
        Commands::Speak(args) => cli::speak::execute(args, config).await,
        Commands::Providers(args) => cli::providers::execute(args, config).await,
        Commands::Tts(args) => cli::tts::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_enhance_with_defaults() {
        let cli =
            Cli::try_parse_from(["amplify", "enhance", "photo.jpg", "-t", "A story"]).unwrap();
        match cli.command {
            Commands::Enhance(args) => {
                assert_eq!(args.language, "en");
                assert!(!args.no_fallback);
                assert!(args.provider.is_none());
                assert!(args.audio.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn voice_requires_audio() {
        let result = Cli::try_parse_from([
            "amplify", "enhance", "photo.jpg", "-t", "A story", "--voice", "nova",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["amplify", "providers", "list", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
