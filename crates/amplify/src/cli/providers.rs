//! The `amplify providers` command for inspecting enhancement backends.

use super::print_json;
use amplify_core::llm::ProviderKind;
use amplify_core::{Config, PromptSet, ProviderFactory};
use clap::{Args, Subcommand};
use serde_json::json;

/// Arguments for the `providers` command.
#[derive(Args, Debug)]
pub struct ProvidersArgs {
    #[command(subcommand)]
    pub command: ProvidersCommand,
}

/// Subcommands for provider inspection.
#[derive(Subcommand, Debug)]
pub enum ProvidersCommand {
    /// List providers and whether their credentials are configured
    List,

    /// Show static capabilities of a provider
    Capabilities {
        /// Provider name (gemini, openai)
        name: String,
    },

    /// Construct every available provider and report its status
    Health,
}

/// Execute the providers command.
pub async fn execute(args: ProvidersArgs, config: Config) -> anyhow::Result<()> {
    let llm = config.llm.clone();
    let factory = ProviderFactory::new(config.llm, PromptSet::builtin());

    match args.command {
        ProvidersCommand::List => {
            let available = factory.get_available_providers();
            let providers: Vec<_> = ProviderKind::ALL
                .into_iter()
                .map(|kind| {
                    let descriptor = kind.descriptor(&llm);
                    json!({
                        "name": kind.as_str(),
                        "available": available.iter().any(|name| name == kind.as_str()),
                        "supports_vision": descriptor.supports_vision,
                        "model": descriptor.model,
                    })
                })
                .collect();

            print_json(&json!({
                "primary": llm.provider,
                "enable_fallback": llm.enable_fallback,
                "available": available,
                "providers": providers,
            }))
        }

        ProvidersCommand::Capabilities { name } => {
            let descriptor = factory.get_provider_capabilities(&name)?;
            print_json(&descriptor)
        }

        ProvidersCommand::Health => print_json(&factory.health_check()),
    }
}
