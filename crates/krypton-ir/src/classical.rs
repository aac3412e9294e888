//! Classical instruction stream.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// A constant operand of `LOAD_CONST`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Float(v) => write!(f, "{v:?}"),
            Constant::Bool(v) => write!(f, "{v}"),
            Constant::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// A classical stack-machine instruction.
///
/// Binary operators pop the right operand first, then the left, and push
/// the result. Jump targets are absolute instruction indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Push a constant.
    LoadConst(Constant),
    /// Push the value bound to a local variable.
    LoadVar(String),
    /// Pop a value and bind it to a local variable.
    StoreVar(String),
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    /// Arithmetic negation of the top value.
    Neg,
    /// Logical negation of the top value.
    Not,
    /// Discard the top value.
    Pop,
    /// Print embedded text, or pop and print the top value when `None`.
    Print(Option<String>),
    /// Invoke a function from the function table.
    Call(String),
    /// Leave the current frame.
    Return,
    /// Unconditional jump.
    Jump(usize),
    /// Pop a value and jump if it is falsy.
    JumpIfFalse(usize),
}

impl Instruction {
    /// The opcode mnemonic.
    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::LoadConst(_) => "LOAD_CONST",
            Instruction::LoadVar(_) => "LOAD_VAR",
            Instruction::StoreVar(_) => "STORE_VAR",
            Instruction::Add => "ADD",
            Instruction::Sub => "SUB",
            Instruction::Mul => "MUL",
            Instruction::Div => "DIV",
            Instruction::Eq => "EQ",
            Instruction::NotEq => "NE",
            Instruction::Lt => "LT",
            Instruction::Gt => "GT",
            Instruction::LtEq => "LE",
            Instruction::GtEq => "GE",
            Instruction::And => "AND",
            Instruction::Or => "OR",
            Instruction::Neg => "NEG",
            Instruction::Not => "NOT",
            Instruction::Pop => "POP",
            Instruction::Print(_) => "PRINT",
            Instruction::Call(_) => "CALL",
            Instruction::Return => "RETURN",
            Instruction::Jump(_) => "JUMP",
            Instruction::JumpIfFalse(_) => "JUMP_IF_FALSE",
        }
    }

    /// The jump target, if this is a jump.
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Instruction::Jump(t) | Instruction::JumpIfFalse(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode();
        match self {
            Instruction::LoadConst(c) => write!(f, "{op} {c}"),
            Instruction::LoadVar(name) | Instruction::StoreVar(name) | Instruction::Call(name) => {
                write!(f, "{op} {name}")
            }
            Instruction::Print(Some(text)) => write!(f, "{op} {text:?}"),
            Instruction::Jump(t) | Instruction::JumpIfFalse(t) => write!(f, "{op} {t}"),
            _ => write!(f, "{op}"),
        }
    }
}

/// An ordered sequence of classical instructions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassicalStream {
    instructions: Vec<Instruction>,
}

impl ClassicalStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction and return its index.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// Rewrite the target of the jump at `index`.
    pub fn patch_jump(&mut self, index: usize, target: usize) -> IrResult<()> {
        match self.instructions.get_mut(index) {
            Some(Instruction::Jump(t) | Instruction::JumpIfFalse(t)) => {
                *t = target;
                Ok(())
            }
            Some(other) => Err(IrError::NotAJump {
                index,
                opcode: other.opcode(),
            }),
            None => Err(IrError::IndexOutOfRange {
                index,
                len: self.instructions.len(),
            }),
        }
    }

    /// Check that every jump lands inside the stream or exactly at its end.
    pub fn validate(&self) -> IrResult<()> {
        let len = self.instructions.len();
        for (index, inst) in self.instructions.iter().enumerate() {
            if let Some(target) = inst.jump_target() {
                if target > len {
                    return Err(IrError::JumpOutOfRange { index, target, len });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn last(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl From<Vec<Instruction>> for ClassicalStream {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl<'a> IntoIterator for &'a ClassicalStream {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl fmt::Display for ClassicalStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, inst) in self.instructions.iter().enumerate() {
            writeln!(f, "{i:>4}  {inst}")?;
        }
        Ok(())
    }
}
