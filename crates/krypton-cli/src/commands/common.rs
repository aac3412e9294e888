//! Shared helpers for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use krypton_runtime::RuntimeConfig;
use tracing::debug;

/// Build the runtime configuration: file and environment first, then flags.
pub fn build_config(
    config_file: Option<&Path>,
    import_root: Option<PathBuf>,
    max_frames: Option<usize>,
) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::load(config_file).with_context(|| match config_file {
        Some(path) => format!("Failed to load config: {}", path.display()),
        None => "Invalid configuration".to_string(),
    })?;

    if let Some(root) = import_root {
        config.import_root = Some(root);
    }
    if let Some(frames) = max_frames {
        config.limits.max_frames = frames;
    }
    config.validate()?;

    debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Fail early with a readable message when the input file is missing.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(())
}
