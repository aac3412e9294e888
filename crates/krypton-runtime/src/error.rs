//! Umbrella error for the whole pipeline.

use krypton_compile::{LoweringError, TypeError};
use krypton_module::ImportError;
use krypton_syntax::ParseError;
use krypton_vm::RuntimeError;
use thiserror::Error;

use crate::config::ConfigError;

/// Any error raised while loading, checking, lowering or running a program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Lowering(#[from] LoweringError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
