//! Error types for checking and lowering.

use krypton_ir::IrError;
use krypton_syntax::ast::{BinaryOp, LiteralKind, UnaryOp};
use krypton_syntax::Type;
use thiserror::Error;

/// Errors raised by the type checker and the boundary checker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TypeError {
    #[error("quantum parameter in classical function '{function}': {param}")]
    QuantumParameter { function: String, param: String },

    #[error("non-quantum parameter in qpute '{procedure}': {param}")]
    ClassicalParameter { procedure: String, param: String },

    #[error("logical operators require bool operands, found {left} {op} {right}")]
    LogicalOperands { op: BinaryOp, left: Type, right: Type },

    #[error("comparison operators require numeric operands, found {left} {op} {right}")]
    ComparisonOperands { op: BinaryOp, left: Type, right: Type },

    #[error("arithmetic operators require numeric operands, found {left} {op} {right}")]
    ArithmeticOperands { op: BinaryOp, left: Type, right: Type },

    #[error("unary '{op}' requires {expected} operand, found {found}")]
    UnaryOperand {
        op: UnaryOp,
        expected: &'static str,
        found: Type,
    },

    #[error("use of undeclared variable: {0}")]
    UndeclaredVariable(String),

    #[error("measure of undeclared variable: {0}")]
    MeasureUndeclared(String),

    #[error("can only measure qbit, '{name}' is {found}")]
    MeasureNonQubit { name: String, found: Type },

    #[error("if condition must be bool, found {0}")]
    NonBoolCondition(Type),

    #[error("quantum procedures cannot contain classical branching")]
    QuantumBranching,

    #[error("quantum procedures cannot declare classical variables: {0}")]
    QuantumVariable(String),
}

/// Result type for type checking.
pub type TypeResult<T> = Result<T, TypeError>;

/// Errors raised while lowering a checked module into instruction streams.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoweringError {
    #[error("quantum operation '{operation}' in classical function '{unit}'")]
    NoQuantumTarget {
        unit: String,
        operation: &'static str,
    },

    #[error("classical operation '{operation}' in quantum procedure '{unit}'")]
    NoClassicalTarget {
        unit: String,
        operation: &'static str,
    },

    #[error("{what} does not produce a value (in '{unit}')")]
    NoValue { unit: String, what: String },

    #[error("qubit '{name}' used as a classical value (in '{unit}')")]
    QubitAsValue { unit: String, name: String },

    #[error("cannot measure '{name}': not a qubit (in '{unit}')")]
    NotAQubit { unit: String, name: String },

    #[error("quantum procedure '{procedure}' expects qubit arguments (in '{unit}')")]
    QubitArgumentExpected { unit: String, procedure: String },

    #[error("quantum operation '{operation}' inside a conditional block (in '{unit}')")]
    QuantumInBranch {
        unit: String,
        operation: &'static str,
    },

    #[error("'{callee}' expects {expected} arguments, found {found} (in '{unit}')")]
    ArityMismatch {
        unit: String,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("malformed {kind:?} literal: {text}")]
    MalformedLiteral { kind: LiteralKind, text: String },

    #[error("IR error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for lowering.
pub type LoweringResult<T> = Result<T, LoweringError>;
