//! Execution engines for lowered Krypton programs.
//!
//! - [`Interpreter`] runs classical streams on a call stack of frames and a
//!   shared evaluation stack, resolving `CALL` through a
//!   [`FunctionTable`](krypton_ir::FunctionTable).
//! - [`QuantumSimulator`] replays quantum streams against a table of boolean
//!   qubit flags.

mod error;
mod interpreter;
mod simulator;
mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use interpreter::{Interpreter, Limits};
pub use simulator::{Measurement, QuantumSimulator};
pub use value::Value;
