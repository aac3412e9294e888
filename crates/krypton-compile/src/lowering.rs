//! Lowering of checked modules into classical and quantum instruction streams.
//!
//! Every unit (function, process, quantum procedure) is lowered with its own
//! [`LoweringContext`], passed explicitly through the recursive walk. A
//! function context owns only a classical stream, a quantum procedure context
//! owns only a quantum stream, and a process context owns both.

use krypton_ir::{
    ClassicalStream, CompiledFunction, Constant, FunctionTable, Instruction, LoweredProcess,
    QuantumInstruction, QuantumStream,
};
use krypton_syntax::ast::{
    BinaryOp, Block, Declaration, Expr, Literal, LiteralKind, Statement, UnaryOp,
};
use krypton_syntax::{Module, PRINT_BUILTIN};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::error::{LoweringError, LoweringResult};

/// Lower every process of a module.
pub fn lower_module(module: &Module) -> LoweringResult<FxHashMap<String, LoweredProcess>> {
    Lowerer::new(module).lower_module()
}

/// Lower every classical function of a module into a function table.
pub fn lower_functions(module: &Module) -> LoweringResult<FunctionTable> {
    Lowerer::new(module).lower_functions()
}

/// Lower every quantum procedure of a module into its own quantum stream.
pub fn lower_quantum_procedures(
    module: &Module,
) -> LoweringResult<FxHashMap<String, QuantumStream>> {
    Lowerer::new(module).lower_quantum_procedures()
}

/// Per-unit lowering state.
struct LoweringContext {
    /// Name of the unit being lowered, for error messages.
    unit: String,
    classical: Option<ClassicalStream>,
    quantum: Option<QuantumStream>,
    /// Block scopes, innermost last.
    scopes: Vec<FxHashMap<String, Binding>>,
    /// Qubits allocated by this unit, in allocation order.
    allocated: Vec<String>,
    /// Number of enclosing `if` branches.
    branch_depth: usize,
}

/// What a source-level name refers to.
#[derive(Debug, Clone)]
enum Binding {
    Qubit(String),
    Classical,
}

impl LoweringContext {
    fn function(unit: &str) -> Self {
        Self::new(unit, Some(ClassicalStream::new()), None)
    }

    fn procedure(unit: &str) -> Self {
        Self::new(unit, None, Some(QuantumStream::new()))
    }

    fn process(unit: &str) -> Self {
        Self::new(unit, Some(ClassicalStream::new()), Some(QuantumStream::new()))
    }

    fn new(unit: &str, classical: Option<ClassicalStream>, quantum: Option<QuantumStream>) -> Self {
        Self {
            unit: unit.to_string(),
            classical,
            quantum,
            scopes: vec![FxHashMap::default()],
            allocated: Vec::new(),
            branch_depth: 0,
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), binding);
        }
    }

    /// The qubit id `name` refers to, if the innermost binding is a qubit.
    fn qubit(&self, name: &str) -> Option<String> {
        match self.scopes.iter().rev().find_map(|scope| scope.get(name))? {
            Binding::Qubit(id) => Some(id.clone()),
            Binding::Classical => None,
        }
    }

    fn classical(&mut self, operation: &'static str) -> LoweringResult<&mut ClassicalStream> {
        self.classical
            .as_mut()
            .ok_or_else(|| LoweringError::NoClassicalTarget {
                unit: self.unit.clone(),
                operation,
            })
    }

    /// The quantum stream, provided quantum code may be emitted here.
    ///
    /// Quantum streams carry no control flow, so an operation inside an
    /// `if` branch has no faithful lowering.
    fn quantum(&mut self, operation: &'static str) -> LoweringResult<&mut QuantumStream> {
        let Some(stream) = self.quantum.as_mut() else {
            return Err(LoweringError::NoQuantumTarget {
                unit: self.unit.clone(),
                operation,
            });
        };
        if self.branch_depth > 0 {
            return Err(LoweringError::QuantumInBranch {
                unit: self.unit.clone(),
                operation,
            });
        }
        Ok(stream)
    }

    fn emit(&mut self, instruction: Instruction) -> LoweringResult<usize> {
        let operation = instruction.opcode();
        Ok(self.classical(operation)?.emit(instruction))
    }

    fn emit_quantum(&mut self, instruction: QuantumInstruction) -> LoweringResult<()> {
        let operation = instruction.opcode();
        self.quantum(operation)?.emit(instruction);
        Ok(())
    }

    /// Point the jump at `index` to the next instruction to be emitted.
    fn patch_to_here(&mut self, index: usize) -> LoweringResult<()> {
        let stream = self.classical("JUMP")?;
        let target = stream.len();
        stream.patch_jump(index, target)?;
        Ok(())
    }

    fn alloc_qubit(&mut self) -> LoweringResult<String> {
        let id = format!("q{}", self.allocated.len());
        self.emit_quantum(QuantumInstruction::AllocQubit(id.clone()))?;
        self.allocated.push(id.clone());
        Ok(id)
    }
}

/// What lowering an expression produced.
#[derive(Debug, PartialEq, Eq)]
enum Lowered {
    /// One value was pushed onto the evaluation stack.
    Value,
    /// The expression names a qubit; nothing was pushed.
    Qubit(String),
    /// Only side effects were emitted.
    Nothing,
}

/// Lowers the units of one module.
///
/// Declarations are deduplicated by name up front: after import merging the
/// first declaration with a given name wins.
pub struct Lowerer<'m> {
    units: Vec<&'m Declaration>,
    procedures: FxHashSet<&'m str>,
    /// Parameter count of every function and quantum procedure.
    arities: FxHashMap<&'m str, usize>,
}

impl<'m> Lowerer<'m> {
    pub fn new(module: &'m Module) -> Self {
        let mut seen = FxHashSet::default();
        let mut units = Vec::new();
        let mut procedures = FxHashSet::default();
        let mut arities = FxHashMap::default();

        for decl in &module.declarations {
            let Some(name) = decl.name() else { continue };
            if !seen.insert(name) {
                debug!("Skipping duplicate declaration {name}");
                continue;
            }
            match decl.as_ref() {
                Declaration::Function(function) => {
                    arities.insert(name, function.params.len());
                }
                Declaration::QuantumProcedure(procedure) => {
                    procedures.insert(name);
                    arities.insert(name, procedure.params.len());
                }
                _ => {}
            }
            units.push(decl.as_ref());
        }

        Self {
            units,
            procedures,
            arities,
        }
    }

    /// Lower every process into a classical and quantum stream pair.
    #[instrument(skip(self))]
    pub fn lower_module(&self) -> LoweringResult<FxHashMap<String, LoweredProcess>> {
        let mut processes = FxHashMap::default();

        for decl in &self.units {
            let Declaration::Process(process) = decl else {
                continue;
            };
            let mut ctx = LoweringContext::process(&process.name);
            self.lower_block(&mut ctx, &process.body)?;

            for qubit in ctx.allocated.clone().into_iter().rev() {
                ctx.emit_quantum(QuantumInstruction::DeallocQubit(qubit))?;
            }

            let lowered = LoweredProcess {
                classical: ctx.classical.take().unwrap_or_default(),
                quantum: ctx.quantum.take().unwrap_or_default(),
            };
            lowered.classical.validate()?;
            debug!(
                "Lowered process {}: {} classical, {} quantum instructions",
                process.name,
                lowered.classical.len(),
                lowered.quantum.len()
            );
            processes.insert(process.name.clone(), lowered);
        }

        Ok(processes)
    }

    /// Lower every classical function into a function table.
    #[instrument(skip(self))]
    pub fn lower_functions(&self) -> LoweringResult<FunctionTable> {
        let mut table = FunctionTable::new();

        for decl in &self.units {
            let Declaration::Function(function) = decl else {
                continue;
            };
            let mut ctx = LoweringContext::function(&function.name);
            self.lower_block(&mut ctx, &function.body)?;

            let mut code = ctx.classical.take().unwrap_or_default();
            // Falling off the end returns 0.
            if !matches!(function.body.statements.last(), Some(Statement::Return(_))) {
                code.emit(Instruction::LoadConst(Constant::Int(0)));
                code.emit(Instruction::Return);
            }
            code.validate()?;
            debug!("Lowered function {}: {} instructions", function.name, code.len());

            table.insert(CompiledFunction {
                name: function.name.clone(),
                params: function.params.iter().map(|p| p.name.clone()).collect(),
                code,
            });
        }

        Ok(table)
    }

    /// Lower every quantum procedure into its own quantum stream.
    #[instrument(skip(self))]
    pub fn lower_quantum_procedures(&self) -> LoweringResult<FxHashMap<String, QuantumStream>> {
        let mut procedures = FxHashMap::default();

        for decl in &self.units {
            let Declaration::QuantumProcedure(procedure) = decl else {
                continue;
            };
            let mut ctx = LoweringContext::procedure(&procedure.name);
            for param in &procedure.params {
                ctx.bind(&param.name, Binding::Qubit(param.name.clone()));
            }
            self.lower_block(&mut ctx, &procedure.body)?;

            let stream = ctx.quantum.take().unwrap_or_default();
            debug!(
                "Lowered quantum procedure {}: {} instructions",
                procedure.name,
                stream.len()
            );
            procedures.insert(procedure.name.clone(), stream);
        }

        Ok(procedures)
    }

    /// Lower a single expression into a fresh classical stream.
    pub fn lower_expression(&self, expr: &Expr) -> LoweringResult<ClassicalStream> {
        let mut ctx = LoweringContext::function("<expression>");
        self.lower_expr(&mut ctx, expr)?;
        Ok(ctx.classical.take().unwrap_or_default())
    }

    fn lower_block(&self, ctx: &mut LoweringContext, block: &Block) -> LoweringResult<()> {
        ctx.push_scope();
        let result = block
            .statements
            .iter()
            .try_for_each(|stmt| self.lower_statement(ctx, stmt));
        ctx.pop_scope();
        result
    }

    fn lower_branch(&self, ctx: &mut LoweringContext, block: &Block) -> LoweringResult<()> {
        ctx.branch_depth += 1;
        let result = self.lower_block(ctx, block);
        ctx.branch_depth -= 1;
        result
    }

    /// Reject a call to a known unit with the wrong number of arguments.
    ///
    /// Unknown callees are left to the runtime.
    fn check_arity(
        &self,
        ctx: &LoweringContext,
        callee: &str,
        found: usize,
    ) -> LoweringResult<()> {
        match self.arities.get(callee) {
            Some(&expected) if expected != found => Err(LoweringError::ArityMismatch {
                unit: ctx.unit.clone(),
                callee: callee.to_string(),
                expected,
                found,
            }),
            _ => Ok(()),
        }
    }

    fn lower_statement(&self, ctx: &mut LoweringContext, stmt: &Statement) -> LoweringResult<()> {
        match stmt {
            Statement::Let { name, value } => match self.lower_expr(ctx, value)? {
                Lowered::Value => {
                    ctx.emit(Instruction::StoreVar(name.clone()))?;
                    ctx.bind(name, Binding::Classical);
                    Ok(())
                }
                Lowered::Qubit(id) => {
                    ctx.bind(name, Binding::Qubit(id));
                    Ok(())
                }
                Lowered::Nothing => Err(no_value(ctx, value)),
            },

            Statement::Return(expr) => {
                self.lower_value(ctx, expr)?;
                ctx.emit(Instruction::Return)?;
                Ok(())
            }

            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                self.lower_value(ctx, condition)?;
                let skip_then = ctx.emit(Instruction::JumpIfFalse(0))?;
                self.lower_branch(ctx, then_block)?;

                match else_block {
                    Some(else_block) => {
                        let skip_else = ctx.emit(Instruction::Jump(0))?;
                        ctx.patch_to_here(skip_then)?;
                        self.lower_branch(ctx, else_block)?;
                        ctx.patch_to_here(skip_else)
                    }
                    None => ctx.patch_to_here(skip_then),
                }
            }

            Statement::Expr(expr) => {
                if self.lower_expr(ctx, expr)? == Lowered::Value {
                    ctx.emit(Instruction::Pop)?;
                }
                Ok(())
            }
        }
    }

    /// Lower an expression that must leave exactly one value on the stack.
    fn lower_value(&self, ctx: &mut LoweringContext, expr: &Expr) -> LoweringResult<()> {
        match self.lower_expr(ctx, expr)? {
            Lowered::Value => Ok(()),
            Lowered::Qubit(_) => Err(LoweringError::QubitAsValue {
                unit: ctx.unit.clone(),
                name: describe(expr),
            }),
            Lowered::Nothing => Err(no_value(ctx, expr)),
        }
    }

    fn lower_expr(&self, ctx: &mut LoweringContext, expr: &Expr) -> LoweringResult<Lowered> {
        match expr {
            Expr::Literal(literal) => {
                ctx.emit(Instruction::LoadConst(constant(literal)?))?;
                Ok(Lowered::Value)
            }

            Expr::Identifier(name) => {
                if let Some(id) = ctx.qubit(name) {
                    return Ok(Lowered::Qubit(id));
                }
                ctx.emit(Instruction::LoadVar(name.clone()))?;
                Ok(Lowered::Value)
            }

            Expr::Binary { op, left, right } => {
                self.lower_value(ctx, left)?;
                self.lower_value(ctx, right)?;
                ctx.emit(binary_instruction(*op))?;
                Ok(Lowered::Value)
            }

            Expr::Unary { op, operand } => {
                self.lower_value(ctx, operand)?;
                match op {
                    UnaryOp::Plus => {}
                    UnaryOp::Neg => {
                        ctx.emit(Instruction::Neg)?;
                    }
                    UnaryOp::Not => {
                        ctx.emit(Instruction::Not)?;
                    }
                }
                Ok(Lowered::Value)
            }

            Expr::Call { name, args } if name == PRINT_BUILTIN => {
                ctx.classical("PRINT")?;
                for arg in args {
                    if let Expr::Literal(literal) = arg {
                        ctx.emit(Instruction::Print(Some(literal.text.clone())))?;
                    } else {
                        self.lower_value(ctx, arg)?;
                        ctx.emit(Instruction::Print(None))?;
                    }
                }
                Ok(Lowered::Nothing)
            }

            Expr::Call { name, args } if self.procedures.contains(name.as_str()) => {
                ctx.quantum("APPLY_GATE")?;
                self.check_arity(ctx, name, args.len())?;
                for arg in args {
                    let qubit = qubit_argument(ctx, arg).ok_or_else(|| {
                        LoweringError::QubitArgumentExpected {
                            unit: ctx.unit.clone(),
                            procedure: name.clone(),
                        }
                    })?;
                    ctx.emit_quantum(QuantumInstruction::ApplyGate {
                        gate: name.clone(),
                        qubit,
                    })?;
                }
                Ok(Lowered::Nothing)
            }

            Expr::Call { name, args } => {
                ctx.classical("CALL")?;
                self.check_arity(ctx, name, args.len())?;
                for arg in args {
                    self.lower_value(ctx, arg)?;
                }
                ctx.emit(Instruction::Call(name.clone()))?;
                Ok(Lowered::Value)
            }

            Expr::Prepare => Ok(Lowered::Qubit(ctx.alloc_qubit()?)),

            Expr::Measure(name) => {
                ctx.quantum("MEASURE")?;
                let id = ctx.qubit(name).ok_or_else(|| LoweringError::NotAQubit {
                    unit: ctx.unit.clone(),
                    name: name.clone(),
                })?;
                ctx.emit_quantum(QuantumInstruction::Measure(id))?;
                Ok(Lowered::Nothing)
            }

            Expr::Grouping(inner) => self.lower_expr(ctx, inner),
        }
    }
}

/// Resolve a quantum procedure argument to a qubit id without emitting code.
fn qubit_argument(ctx: &LoweringContext, arg: &Expr) -> Option<String> {
    match arg {
        Expr::Identifier(name) => ctx.qubit(name),
        Expr::Grouping(inner) => qubit_argument(ctx, inner),
        _ => None,
    }
}

fn constant(literal: &Literal) -> LoweringResult<Constant> {
    let malformed = || LoweringError::MalformedLiteral {
        kind: literal.kind,
        text: literal.text.clone(),
    };
    match literal.kind {
        LiteralKind::Int => literal.text.parse().map(Constant::Int).map_err(|_| malformed()),
        LiteralKind::Float => literal.text.parse().map(Constant::Float).map_err(|_| malformed()),
        LiteralKind::Bool => match literal.text.as_str() {
            "true" => Ok(Constant::Bool(true)),
            "false" => Ok(Constant::Bool(false)),
            _ => Err(malformed()),
        },
        LiteralKind::String => Ok(Constant::Str(literal.text.clone())),
    }
}

fn binary_instruction(op: BinaryOp) -> Instruction {
    match op {
        BinaryOp::Add => Instruction::Add,
        BinaryOp::Sub => Instruction::Sub,
        BinaryOp::Mul => Instruction::Mul,
        BinaryOp::Div => Instruction::Div,
        BinaryOp::Eq => Instruction::Eq,
        BinaryOp::NotEq => Instruction::NotEq,
        BinaryOp::Lt => Instruction::Lt,
        BinaryOp::Gt => Instruction::Gt,
        BinaryOp::LtEq => Instruction::LtEq,
        BinaryOp::GtEq => Instruction::GtEq,
        BinaryOp::And => Instruction::And,
        BinaryOp::Or => Instruction::Or,
    }
}

fn no_value(ctx: &LoweringContext, expr: &Expr) -> LoweringError {
    LoweringError::NoValue {
        unit: ctx.unit.clone(),
        what: describe(expr),
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Measure(name) => format!("measure {name}"),
        Expr::Call { name, .. } => format!("call to '{name}'"),
        Expr::Identifier(name) => name.clone(),
        Expr::Prepare => "prepare qbit".to_string(),
        Expr::Grouping(inner) => describe(inner),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krypton_syntax::parse;
    use proptest::prelude::*;

    fn process(source: &str) -> LoweredProcess {
        let module = parse(source).unwrap();
        lower_module(&module).unwrap().remove("main").unwrap()
    }

    fn opcodes(stream: &ClassicalStream) -> Vec<String> {
        stream.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_lower_let_and_print() {
        let main = process("process main { let x = 2; let y = x + 3; kp(y); }");
        assert_eq!(
            opcodes(&main.classical),
            vec![
                "LOAD_CONST 2",
                "STORE_VAR x",
                "LOAD_VAR x",
                "LOAD_CONST 3",
                "ADD",
                "STORE_VAR y",
                "LOAD_VAR y",
                "PRINT",
            ]
        );
        assert!(main.quantum.is_empty());
    }

    #[test]
    fn test_print_literal_embeds_text() {
        let main = process(r#"process main { kp("hello", 7); }"#);
        assert_eq!(
            main.classical.instructions(),
            &[
                Instruction::Print(Some("hello".into())),
                Instruction::Print(Some("7".into())),
            ]
        );
    }

    #[test]
    fn test_nested_operands() {
        let main = process("process main { kp(1 * (2 + 3) - -4); }");
        assert_eq!(
            opcodes(&main.classical),
            vec![
                "LOAD_CONST 1",
                "LOAD_CONST 2",
                "LOAD_CONST 3",
                "ADD",
                "MUL",
                "LOAD_CONST 4",
                "NEG",
                "SUB",
                "PRINT",
            ]
        );
    }

    #[test]
    fn test_unary_plus_is_transparent() {
        let main = process("process main { kp(+5); }");
        assert_eq!(opcodes(&main.classical), vec!["LOAD_CONST 5", "PRINT"]);
    }

    #[test]
    fn test_if_without_else() {
        let main = process("process main { if (false) { kp(1); } kp(2); }");
        assert_eq!(
            main.classical.instructions(),
            &[
                Instruction::LoadConst(Constant::Bool(false)),
                Instruction::JumpIfFalse(3),
                Instruction::Print(Some("1".into())),
                Instruction::Print(Some("2".into())),
            ]
        );
    }

    #[test]
    fn test_if_with_else() {
        let main = process("process main { if (true) { kp(1); } else { kp(2); } }");
        assert_eq!(
            main.classical.instructions(),
            &[
                Instruction::LoadConst(Constant::Bool(true)),
                Instruction::JumpIfFalse(4),
                Instruction::Print(Some("1".into())),
                Instruction::Jump(5),
                Instruction::Print(Some("2".into())),
            ]
        );
        assert!(main.classical.validate().is_ok());
    }

    #[test]
    fn test_function_gets_trailing_return() {
        let module = parse(
            "fn add(a: int, b: int) -> int { return a + b; } fn noop() -> int { kp(1); }",
        )
        .unwrap();
        let table = lower_functions(&module).unwrap();

        let add = table.get("add").unwrap();
        assert_eq!(add.params, vec!["a", "b"]);
        assert_eq!(
            opcodes(&add.code),
            vec!["LOAD_VAR a", "LOAD_VAR b", "ADD", "RETURN"]
        );

        let noop = table.get("noop").unwrap();
        assert_eq!(
            opcodes(&noop.code),
            vec!["PRINT \"1\"", "LOAD_CONST 0", "RETURN"]
        );
    }

    #[test]
    fn test_qubit_lifecycle() {
        let main = process(
            "qpute bell(q: qbit) { measure q; } process main { let a = prepare qbit; let b = prepare qbit; bell(a); measure b; }",
        );
        let quantum: Vec<String> = main.quantum.iter().map(ToString::to_string).collect();
        assert_eq!(
            quantum,
            vec![
                "ALLOC_QBIT q0",
                "ALLOC_QBIT q1",
                "APPLY_GATE bell q0",
                "MEASURE q1",
                "DEALLOC_QBIT q1",
                "DEALLOC_QBIT q0",
            ]
        );
        assert!(main.classical.is_empty());
    }

    #[test]
    fn test_quantum_procedures_lowered_separately() {
        let module = parse("quantum qpute bell(q: qbit) { measure q; }").unwrap();
        let procedures = lower_quantum_procedures(&module).unwrap();
        assert_eq!(
            procedures["bell"].instructions(),
            &[QuantumInstruction::Measure("q".into())]
        );
    }

    #[test]
    fn test_quantum_op_in_function_fails() {
        let module = parse("fn f() -> int { let q = prepare qbit; return 1; }").unwrap();
        let err = lower_functions(&module).unwrap_err();
        assert!(matches!(err, LoweringError::NoQuantumTarget { .. }));
    }

    #[test]
    fn test_classical_op_in_procedure_fails() {
        let module = parse(r#"qpute g(q: qbit) { kp("x"); }"#).unwrap();
        let err = lower_quantum_procedures(&module).unwrap_err();
        assert!(matches!(err, LoweringError::NoClassicalTarget { .. }));
    }

    #[test]
    fn test_measure_as_value_fails() {
        let module = parse("process main { let q = prepare qbit; let r = measure q; }").unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(matches!(err, LoweringError::NoValue { .. }));
    }

    #[test]
    fn test_qubit_as_value_fails() {
        let module = parse("process main { let q = prepare qbit; kp(q); }").unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(matches!(err, LoweringError::QubitAsValue { .. }));
    }

    #[test]
    fn test_measure_non_qubit_fails() {
        let module = parse("process main { let x = 1; measure x; }").unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(matches!(err, LoweringError::NotAQubit { .. }));
    }

    #[test]
    fn test_first_declaration_wins() {
        let module = parse(
            "fn f() -> int { return 1; } fn f() -> int { return 2; } process main { kp(f()); }",
        )
        .unwrap();
        let table = lower_functions(&module).unwrap();
        assert_eq!(
            table.get("f").unwrap().code.get(0),
            Some(&Instruction::LoadConst(Constant::Int(1)))
        );
    }

    #[test]
    fn test_classical_let_shadows_qubit() {
        let main = process("process main { let q = prepare qbit; let q = 5; kp(q); }");
        assert_eq!(
            opcodes(&main.classical),
            vec!["LOAD_CONST 5", "STORE_VAR q", "LOAD_VAR q", "PRINT"]
        );
        let quantum: Vec<String> = main.quantum.iter().map(ToString::to_string).collect();
        assert_eq!(quantum, vec!["ALLOC_QBIT q0", "DEALLOC_QBIT q0"]);
    }

    #[test]
    fn test_shadowing_ends_with_block() {
        let main = process(
            "process main { let q = prepare qbit; if (true) { let q = 5; kp(q); } measure q; }",
        );
        assert_eq!(
            opcodes(&main.classical),
            vec![
                "LOAD_CONST true",
                "JUMP_IF_FALSE 6",
                "LOAD_CONST 5",
                "STORE_VAR q",
                "LOAD_VAR q",
                "PRINT",
            ]
        );
        let quantum: Vec<String> = main.quantum.iter().map(ToString::to_string).collect();
        assert_eq!(quantum, vec!["ALLOC_QBIT q0", "MEASURE q0", "DEALLOC_QBIT q0"]);
    }

    #[test]
    fn test_measure_shadowed_qubit_fails() {
        let module =
            parse("process main { let q = prepare qbit; let q = 1; measure q; }").unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(matches!(err, LoweringError::NotAQubit { .. }));
    }

    #[test]
    fn test_quantum_op_in_branch_fails() {
        let module =
            parse("process main { let q = prepare qbit; if (false) { measure q; } kp(2); }")
                .unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(matches!(
            err,
            LoweringError::QuantumInBranch { operation: "MEASURE", .. }
        ));
        assert_eq!(
            err.to_string(),
            "quantum operation 'MEASURE' inside a conditional block (in 'main')"
        );

        for body in [
            "if (true) { let q = prepare qbit; }",
            "if (false) { kp(1); } else { let q = prepare qbit; }",
            "let q = prepare qbit; if (true) { if (true) { bell(q); } }",
        ] {
            let source = format!("qpute bell(q: qbit) {{ measure q; }} process main {{ {body} }}");
            let err = lower_module(&parse(&source).unwrap()).unwrap_err();
            assert!(matches!(err, LoweringError::QuantumInBranch { .. }), "{body}");
        }
    }

    #[test]
    fn test_call_arity_checked() {
        for (call, found) in [("add(5)", 1), ("add(5, 6, 7)", 3)] {
            let source = format!(
                "fn add(a: int, b: int) -> int {{ return a + b; }} process main {{ kp({call}); }}"
            );
            let err = lower_module(&parse(&source).unwrap()).unwrap_err();
            assert!(
                matches!(
                    err,
                    LoweringError::ArityMismatch { expected: 2, found: f, .. } if f == found
                ),
                "{call}: {err}"
            );
        }

        let module = parse(
            "fn add(a: int, b: int) -> int { return a + b; } fn f() -> int { return add(1); }",
        )
        .unwrap();
        let err = lower_functions(&module).unwrap_err();
        assert_eq!(err.to_string(), "'add' expects 2 arguments, found 1 (in 'f')");
    }

    #[test]
    fn test_procedure_arity_checked() {
        let module = parse(
            "qpute bell(q: qbit) { measure q; } process main { let a = prepare qbit; let b = prepare qbit; bell(a, b); }",
        )
        .unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(matches!(
            err,
            LoweringError::ArityMismatch { expected: 1, found: 2, .. }
        ));
    }

    #[test]
    fn test_discarded_call_result_is_popped() {
        let main = process("fn one() -> int { return 1; } process main { one(); kp(2); }");
        assert_eq!(
            opcodes(&main.classical),
            vec!["CALL one", "POP", "PRINT \"2\""]
        );
    }

    fn arb_expr() -> impl Strategy<Value = Expr> {
        let leaf = prop_oneof![
            (0i64..1000).prop_map(Expr::int),
            any::<bool>().prop_map(Expr::bool),
            "[a-z]{1,3}".prop_map(|name: String| Expr::ident(name)),
        ];
        leaf.prop_recursive(4, 32, 3, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::binary(BinaryOp::Add, l, r)),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::binary(BinaryOp::Lt, l, r)),
                inner.clone().prop_map(|e| Expr::unary(UnaryOp::Neg, e)),
                inner.clone().prop_map(|e| Expr::Grouping(Box::new(e))),
                prop::collection::vec(inner, 0..3).prop_map(|args| Expr::call("f", args)),
            ]
        })
    }

    proptest! {
        #[test]
        fn lowering_is_idempotent(expr in arb_expr()) {
            let module = Module::new([]);
            let lowerer = Lowerer::new(&module);
            let copy = expr.clone();
            prop_assert_eq!(
                lowerer.lower_expression(&expr).unwrap(),
                lowerer.lower_expression(&copy).unwrap()
            );
        }

        #[test]
        fn jump_targets_in_range(conds in prop::collection::vec(any::<bool>(), 1..6), with_else in any::<bool>()) {
            let mut body = String::new();
            for c in &conds {
                body.push_str(&format!("if ({c}) {{ kp(1); if ({c}) {{ kp(2); }} }}"));
                if with_else {
                    body.push_str(" else { kp(3); }");
                }
            }
            let main = process(&format!("process main {{ {body} }}"));
            prop_assert!(main.classical.validate().is_ok());
            for inst in main.classical.iter() {
                if let Some(target) = inst.jump_target() {
                    prop_assert!(target <= main.classical.len());
                }
            }
        }
    }
}
