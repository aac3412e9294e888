//! IR dump implementation.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use krypton_runtime::{Runtime, RuntimeConfig};

use super::common::ensure_exists;

/// Output format for `--emit-ir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IrFormat {
    /// One `OPCODE arg` line per instruction
    Text,
    /// The lowered program as JSON
    Json,
}

/// Load, check and lower a file, then print the result without running it.
pub fn execute(path: &Path, config: RuntimeConfig, format: IrFormat) -> Result<()> {
    ensure_exists(path)?;

    let runtime = Runtime::new(config);
    let module = runtime.load_file(path)?;
    let program = runtime.compile(&module)?;

    match format {
        IrFormat::Text => print!("{program}"),
        IrFormat::Json => {
            let json = serde_json::to_string_pretty(&program)
                .context("Failed to serialize program")?;
            println!("{json}");
        }
    }
    Ok(())
}
