//! Quantum instruction stream.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A qubit lifecycle instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantumInstruction {
    /// Register a qubit in state |0⟩.
    AllocQubit(String),
    /// Apply a gate (or quantum procedure) to a qubit.
    ApplyGate { gate: String, qubit: String },
    /// Read the qubit's state.
    Measure(String),
    /// Release a qubit.
    DeallocQubit(String),
}

impl QuantumInstruction {
    /// The opcode mnemonic.
    pub fn opcode(&self) -> &'static str {
        match self {
            QuantumInstruction::AllocQubit(_) => "ALLOC_QBIT",
            QuantumInstruction::ApplyGate { .. } => "APPLY_GATE",
            QuantumInstruction::Measure(_) => "MEASURE",
            QuantumInstruction::DeallocQubit(_) => "DEALLOC_QBIT",
        }
    }

    /// The qubit this instruction addresses.
    pub fn qubit(&self) -> &str {
        match self {
            QuantumInstruction::AllocQubit(q)
            | QuantumInstruction::Measure(q)
            | QuantumInstruction::DeallocQubit(q) => q,
            QuantumInstruction::ApplyGate { qubit, .. } => qubit,
        }
    }
}

impl fmt::Display for QuantumInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantumInstruction::ApplyGate { gate, qubit } => {
                write!(f, "{} {gate} {qubit}", self.opcode())
            }
            other => write!(f, "{} {}", other.opcode(), other.qubit()),
        }
    }
}

/// An ordered sequence of quantum instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumStream {
    instructions: Vec<QuantumInstruction>,
}

impl QuantumStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, instruction: QuantumInstruction) {
        self.instructions.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuantumInstruction> {
        self.instructions.iter()
    }

    pub fn instructions(&self) -> &[QuantumInstruction] {
        &self.instructions
    }
}

impl From<Vec<QuantumInstruction>> for QuantumStream {
    fn from(instructions: Vec<QuantumInstruction>) -> Self {
        Self { instructions }
    }
}

impl<'a> IntoIterator for &'a QuantumStream {
    type Item = &'a QuantumInstruction;
    type IntoIter = std::slice::Iter<'a, QuantumInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl fmt::Display for QuantumStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, inst) in self.instructions.iter().enumerate() {
            writeln!(f, "{i:>4}  {inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantum_display() {
        assert_eq!(
            QuantumInstruction::AllocQubit("q0".into()).to_string(),
            "ALLOC_QBIT q0"
        );
        assert_eq!(
            QuantumInstruction::ApplyGate {
                gate: "bell".into(),
                qubit: "q1".into()
            }
            .to_string(),
            "APPLY_GATE bell q1"
        );
        assert_eq!(
            QuantumInstruction::DeallocQubit("q0".into()).qubit(),
            "q0"
        );
    }
}
