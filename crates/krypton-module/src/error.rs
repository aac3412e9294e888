//! Error types for import resolution and module loading.

use std::io;
use std::path::PathBuf;

use krypton_syntax::ParseError;
use thiserror::Error;

/// Errors that can occur while resolving or loading modules.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    /// The resolved file does not exist.
    #[error("import not found: {import} (looked for {})", path.display())]
    NotFound { import: String, path: PathBuf },

    /// A module imports itself, directly or transitively.
    #[error("cyclic import detected: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file could not be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Result type for module operations.
pub type ImportResult<T> = Result<T, ImportError>;
