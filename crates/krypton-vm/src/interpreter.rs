//! Frame-based classical interpreter.

use std::io::Write;
use std::sync::Arc;

use krypton_ir::{ClassicalStream, FunctionTable, Instruction};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{Arith, Compare, Value};

/// Execution limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of live call frames.
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    /// Maximum number of values on the evaluation stack.
    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: usize,
}

fn default_max_frames() -> usize {
    1024
}

fn default_max_stack_depth() -> usize {
    65536
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frames: default_max_frames(),
            max_stack_depth: default_max_stack_depth(),
        }
    }
}

/// One activation record.
struct Frame<'p> {
    name: &'p str,
    code: &'p ClassicalStream,
    ip: usize,
    locals: FxHashMap<String, Value>,
}

impl<'p> Frame<'p> {
    fn new(name: &'p str, code: &'p ClassicalStream) -> Self {
        Self {
            name,
            code,
            ip: 0,
            locals: FxHashMap::default(),
        }
    }
}

/// Executes classical instruction streams.
///
/// The call stack lives only for the duration of [`Interpreter::run`], so
/// every frame is dropped when a run ends, successfully or not. The
/// evaluation stack is shared by all frames of a run and cleared when the
/// next run starts.
#[derive(Debug, Default)]
pub struct Interpreter {
    functions: Option<Arc<FunctionTable>>,
    stack: Vec<Value>,
    limits: Limits,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Set the table used to resolve `CALL`.
    pub fn set_function_table(&mut self, functions: Arc<FunctionTable>) {
        self.functions = Some(functions);
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Values left on the evaluation stack by the last run.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Clear the evaluation stack.
    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Run `entry` until its frame and every frame it called have returned.
    #[instrument(skip_all, fields(instructions = entry.len()))]
    pub fn run(&mut self, entry: &ClassicalStream, out: &mut dyn Write) -> RuntimeResult<()> {
        let functions = Arc::clone(
            self.functions
                .as_ref()
                .ok_or(RuntimeError::MissingFunctionTable)?,
        );
        self.stack.clear();

        let mut frames = vec![Frame::new("<entry>", entry)];
        let mut executed = 0usize;

        while let Some(frame) = frames.last_mut() {
            let code = frame.code;
            let Some(inst) = code.get(frame.ip) else {
                trace!("Implicit return from {}", frame.name);
                frames.pop();
                continue;
            };
            frame.ip += 1;
            executed += 1;

            match inst {
                Instruction::LoadConst(constant) => self.push(Value::from(constant))?,

                Instruction::LoadVar(name) => {
                    let value = match frame.locals.get(name) {
                        Some(value) => value.clone(),
                        None => Value::parse_numeric(name)
                            .ok_or_else(|| RuntimeError::UnknownVariable(name.clone()))?,
                    };
                    self.push(value)?;
                }

                Instruction::StoreVar(name) => {
                    let value = self.pop("STORE_VAR")?;
                    frame.locals.insert(name.clone(), value);
                }

                Instruction::Add => self.arithmetic(Arith::Add)?,
                Instruction::Sub => self.arithmetic(Arith::Sub)?,
                Instruction::Mul => self.arithmetic(Arith::Mul)?,
                Instruction::Div => self.arithmetic(Arith::Div)?,

                Instruction::Lt => self.compare(Compare::Lt)?,
                Instruction::Gt => self.compare(Compare::Gt)?,
                Instruction::LtEq => self.compare(Compare::LtEq)?,
                Instruction::GtEq => self.compare(Compare::GtEq)?,

                Instruction::Eq | Instruction::NotEq => {
                    let opcode = inst.opcode();
                    let b = self.pop(opcode)?;
                    let a = self.pop(opcode)?;
                    let equal = a.loose_eq(&b);
                    self.push(Value::Bool(equal == matches!(inst, Instruction::Eq)))?;
                }

                Instruction::And | Instruction::Or => {
                    let opcode = inst.opcode();
                    let b = self.pop(opcode)?.is_truthy();
                    let a = self.pop(opcode)?.is_truthy();
                    let result = if matches!(inst, Instruction::And) {
                        a && b
                    } else {
                        a || b
                    };
                    self.push(Value::Bool(result))?;
                }

                Instruction::Neg => {
                    let value = self.pop("NEG")?.negate()?;
                    self.push(value)?;
                }

                Instruction::Not => {
                    let value = self.pop("NOT")?;
                    self.push(Value::Bool(!value.is_truthy()))?;
                }

                Instruction::Pop => {
                    self.pop("POP")?;
                }

                Instruction::Print(Some(text)) => writeln!(out, "{text}")?,
                Instruction::Print(None) => {
                    let value = self.pop("PRINT")?;
                    writeln!(out, "{value}")?;
                }

                Instruction::Call(name) => {
                    let function = functions
                        .get(name)
                        .ok_or_else(|| RuntimeError::UnknownFunction(name.clone()))?;
                    if frames.len() >= self.limits.max_frames {
                        return Err(RuntimeError::StackOverflow {
                            limit: self.limits.max_frames,
                        });
                    }

                    let arity = function.arity();
                    let split = self
                        .stack
                        .len()
                        .checked_sub(arity)
                        .ok_or(RuntimeError::StackUnderflow { opcode: "CALL" })?;

                    let mut callee = Frame::new(&function.name, &function.code);
                    callee
                        .locals
                        .extend(function.params.iter().cloned().zip(self.stack.drain(split..)));

                    trace!(depth = frames.len() + 1, "Calling {}", function.name);
                    frames.push(callee);
                }

                Instruction::Return => {
                    trace!("Return from {}", frame.name);
                    frames.pop();
                }

                Instruction::Jump(target) => frame.ip = *target,

                Instruction::JumpIfFalse(target) => {
                    if !self.pop("JUMP_IF_FALSE")?.is_truthy() {
                        frame.ip = *target;
                    }
                }
            }
        }

        debug!(executed, "Classical run finished");
        Ok(())
    }

    fn push(&mut self, value: Value) -> RuntimeResult<()> {
        if self.stack.len() >= self.limits.max_stack_depth {
            return Err(RuntimeError::EvalStackOverflow {
                limit: self.limits.max_stack_depth,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, opcode: &'static str) -> RuntimeResult<Value> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { opcode })
    }

    fn arithmetic(&mut self, op: Arith) -> RuntimeResult<()> {
        let opcode = op.opcode();
        let b = self.pop(opcode)?;
        let a = self.pop(opcode)?;
        let result = Value::arithmetic(op, a, b)?;
        self.push(result)
    }

    fn compare(&mut self, op: Compare) -> RuntimeResult<()> {
        let opcode = op.opcode();
        let b = self.pop(opcode)?;
        let a = self.pop(opcode)?;
        let result = Value::compare(op, &a, &b)?;
        self.push(result)
    }
}
