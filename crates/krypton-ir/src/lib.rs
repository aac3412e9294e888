//! Krypton intermediate representation.
//!
//! Lowering produces two instruction streams per process: a classical
//! stack-machine stream executed by the interpreter and a quantum stream
//! replayed by the simulator. Classical functions are lowered once into a
//! shared [`FunctionTable`].

mod classical;
mod error;
mod function;
mod quantum;

pub use classical::{ClassicalStream, Constant, Instruction};
pub use error::{IrError, IrResult};
pub use function::{CompiledFunction, FunctionTable, LoweredProcess};
pub use quantum::{QuantumInstruction, QuantumStream};
