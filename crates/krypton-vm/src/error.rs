//! Error types for execution.

use std::io;

use thiserror::Error;

/// Errors that halt a classical or quantum run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("stack underflow in {opcode}")]
    StackUnderflow { opcode: &'static str },

    #[error("function table not set")]
    MissingFunctionTable,

    #[error("no '{0}' process")]
    MissingProcess(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("stack overflow: call depth exceeded {limit} frames")]
    StackOverflow { limit: usize },

    #[error("evaluation stack overflow: more than {limit} values")]
    EvalStackOverflow { limit: usize },

    #[error("cannot apply {opcode} to {operands}")]
    TypeMismatch {
        opcode: &'static str,
        operands: String,
    },

    #[error("integer overflow in {opcode}")]
    IntegerOverflow { opcode: &'static str },

    #[error("qubit not allocated: {qubit} ({opcode})")]
    QubitNotAllocated {
        qubit: String,
        opcode: &'static str,
    },

    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

/// Result type for execution.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
