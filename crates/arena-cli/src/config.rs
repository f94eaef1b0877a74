//! Configuration loading for the CLI

use anyhow::{Context, Result};
use arena_core::ArenaConfig;
use std::path::Path;

/// Load configuration from `path` (defaults when absent), then apply
/// `ARENA_*` overrides and validate.
pub fn load_config(path: Option<&Path>) -> Result<ArenaConfig> {
    let mut config = match path {
        Some(path) => ArenaConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ArenaConfig::default(),
    };

    config
        .merge_with_env()
        .context("invalid ARENA_* environment override")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}
