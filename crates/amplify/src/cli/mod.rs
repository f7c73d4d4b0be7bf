//! Command implementations for the `amplify` binary.

pub mod config;
pub mod enhance;
pub mod providers;
pub mod speak;
pub mod summarize;
pub mod tts;

use amplify_core::Config;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Expand `~` in a user-supplied path.
pub(crate) fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Apply `--provider` / `--no-fallback` on top of the loaded config.
pub(crate) fn apply_llm_overrides(config: &mut Config, provider: Option<&str>, no_fallback: bool) {
    if let Some(provider) = provider {
        config.llm.provider = provider.to_string();
    }
    if no_fallback {
        config.llm.enable_fallback = false;
    }
}
