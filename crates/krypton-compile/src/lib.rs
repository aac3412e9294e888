//! Checking and lowering for Krypton.
//!
//! The pipeline over a parsed, import-merged [`Module`](krypton_syntax::Module):
//!
//! 1. [`check_module`] enforces parameter and body boundaries between
//!    classical and quantum code and infers expression types.
//! 2. [`lower_functions`], [`lower_module`] and [`lower_quantum_procedures`]
//!    turn the checked tree into instruction streams.
//!
//! # Example
//!
//! ```rust
//! use krypton_compile::{check_module, lower_module};
//!
//! let module = krypton_syntax::parse("process main { let x = 2; kp(x + 3); }").unwrap();
//! check_module(&module).unwrap();
//!
//! let processes = lower_module(&module).unwrap();
//! assert_eq!(processes["main"].classical.len(), 6);
//! ```

pub mod boundary;
mod error;
pub mod lowering;
pub mod typecheck;

pub use boundary::check_quantum_procedure_block;
pub use error::{LoweringError, LoweringResult, TypeError, TypeResult};
pub use lowering::{Lowerer, lower_functions, lower_module, lower_quantum_procedures};
pub use typecheck::{TypeChecker, check_module};
