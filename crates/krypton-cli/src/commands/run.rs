//! Run command implementation.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use krypton_runtime::{Runtime, RuntimeConfig};
use tracing::info;

use super::common::ensure_exists;

/// Run the `main` process of a file, writing program output to stdout.
pub fn execute(path: &Path, config: RuntimeConfig) -> Result<()> {
    ensure_exists(path)?;

    let mut runtime = Runtime::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = runtime.run_file(path, &mut out);
    out.flush()?;
    let report = result?;

    info!(
        "{} finished, {} measurements",
        path.display(),
        report.measurements.len()
    );
    Ok(())
}
