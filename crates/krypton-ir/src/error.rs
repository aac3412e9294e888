//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur when building or validating instruction streams.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Instruction index outside the stream.
    #[error("instruction index {index} out of range (stream length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Attempted to patch an instruction that is not a jump.
    #[error("instruction {index} is {opcode}, not a jump")]
    NotAJump { index: usize, opcode: &'static str },

    /// Jump lands beyond the end of the stream.
    #[error("jump at {index} targets {target}, beyond stream length {len}")]
    JumpOutOfRange {
        index: usize,
        target: usize,
        len: usize,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
