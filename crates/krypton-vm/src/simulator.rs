//! Simplified qubit simulator.
//!
//! Each qubit is a single boolean flag rather than an amplitude vector.
//! Gates are recorded but do not change state, so every measurement reads
//! `0`.

use std::fmt;
use std::io::Write;

use krypton_ir::{QuantumInstruction, QuantumStream};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{RuntimeError, RuntimeResult};

/// Outcome of one `MEASURE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub qubit: String,
    pub outcome: bool,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.qubit, u8::from(self.outcome))
    }
}

/// Executes quantum instruction streams against a qubit table.
#[derive(Debug, Default)]
pub struct QuantumSimulator {
    qubits: FxHashMap<String, bool>,
}

impl QuantumSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every allocated qubit.
    pub fn reset(&mut self) {
        self.qubits.clear();
    }

    pub fn num_allocated(&self) -> usize {
        self.qubits.len()
    }

    /// Current state of a qubit, if allocated.
    pub fn state(&self, qubit: &str) -> Option<bool> {
        self.qubits.get(qubit).copied()
    }

    /// Execute a stream, writing one event line per instruction.
    #[instrument(skip_all, fields(instructions = stream.len()))]
    pub fn run(
        &mut self,
        stream: &QuantumStream,
        out: &mut dyn Write,
    ) -> RuntimeResult<Vec<Measurement>> {
        let mut measurements = Vec::new();

        for inst in stream {
            match inst {
                QuantumInstruction::AllocQubit(qubit) => {
                    self.qubits.insert(qubit.clone(), false);
                    writeln!(out, "[Quantum] Allocated qbit {qubit}")?;
                }
                QuantumInstruction::ApplyGate { gate, qubit } => {
                    self.lookup(qubit, inst)?;
                    writeln!(out, "[Quantum] Applying gate {gate} to {qubit}")?;
                }
                QuantumInstruction::Measure(qubit) => {
                    let measurement = Measurement {
                        qubit: qubit.clone(),
                        outcome: self.lookup(qubit, inst)?,
                    };
                    writeln!(out, "[Quantum] Measured {measurement}")?;
                    measurements.push(measurement);
                }
                QuantumInstruction::DeallocQubit(qubit) => {
                    self.qubits
                        .remove(qubit)
                        .ok_or_else(|| not_allocated(qubit, inst))?;
                    writeln!(out, "[Quantum] Deallocated qbit {qubit}")?;
                }
            }
            debug!("{inst}");
        }

        Ok(measurements)
    }

    fn lookup(&self, qubit: &str, inst: &QuantumInstruction) -> RuntimeResult<bool> {
        self.state(qubit).ok_or_else(|| not_allocated(qubit, inst))
    }
}

fn not_allocated(qubit: &str, inst: &QuantumInstruction) -> RuntimeError {
    RuntimeError::QubitNotAllocated {
        qubit: qubit.to_string(),
        opcode: inst.opcode(),
    }
}
