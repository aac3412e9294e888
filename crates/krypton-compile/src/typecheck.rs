//! Type checker.
//!
//! Walks a module once and stops at the first error. Bindings live in a
//! stack of scopes: every declaration opens a scope holding its parameters
//! and every block nests another one, so inner blocks may shadow outer names.

use krypton_syntax::ast::{
    BinaryOp, Block, Declaration, Expr, Literal, LiteralKind, Param, Statement, UnaryOp,
};
use krypton_syntax::{Module, Type};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::boundary::check_quantum_procedure_block;
use crate::error::{TypeError, TypeResult};

/// Type check a whole module.
pub fn check_module(module: &Module) -> TypeResult<()> {
    TypeChecker::new().check_module(module)
}

/// Scoped type environment and checking rules.
#[derive(Debug, Default)]
pub struct TypeChecker {
    scopes: Vec<FxHashMap<String, Type>>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every non-import declaration in order.
    #[instrument(skip_all, fields(module = module.name.as_deref().unwrap_or("<anonymous>")))]
    pub fn check_module(&mut self, module: &Module) -> TypeResult<()> {
        for decl in &module.declarations {
            self.check_declaration(decl)?;
        }
        debug!("Type checked {} declarations", module.declarations.len());
        Ok(())
    }

    fn check_declaration(&mut self, decl: &Declaration) -> TypeResult<()> {
        match decl {
            Declaration::Import(_) => Ok(()),
            Declaration::Function(function) => {
                debug!("Checking function {}", function.name);
                if let Some(param) = function.params.iter().find(|p| p.ty.is_quantum()) {
                    return Err(TypeError::QuantumParameter {
                        function: function.name.clone(),
                        param: param.name.clone(),
                    });
                }
                self.with_params(&function.params, |checker| checker.check_block(&function.body))
            }
            Declaration::QuantumProcedure(procedure) => {
                debug!("Checking quantum procedure {}", procedure.name);
                if let Some(param) = procedure.params.iter().find(|p| !p.ty.is_quantum()) {
                    return Err(TypeError::ClassicalParameter {
                        procedure: procedure.name.clone(),
                        param: param.name.clone(),
                    });
                }
                check_quantum_procedure_block(&procedure.body)?;
                self.with_params(&procedure.params, |checker| {
                    checker.check_block(&procedure.body)
                })
            }
            Declaration::Process(process) => {
                debug!("Checking process {}", process.name);
                self.check_block(&process.body)
            }
        }
    }

    fn with_params(
        &mut self,
        params: &[Param],
        check: impl FnOnce(&mut Self) -> TypeResult<()>,
    ) -> TypeResult<()> {
        self.scopes.push(
            params
                .iter()
                .map(|p| (p.name.clone(), p.ty.clone()))
                .collect(),
        );
        let result = check(self);
        self.scopes.pop();
        result
    }

    fn check_block(&mut self, block: &Block) -> TypeResult<()> {
        self.scopes.push(FxHashMap::default());
        let result = block
            .statements
            .iter()
            .try_for_each(|stmt| self.check_statement(stmt));
        self.scopes.pop();
        result
    }

    fn check_statement(&mut self, stmt: &Statement) -> TypeResult<()> {
        match stmt {
            Statement::Let { name, value } => {
                let ty = self.check_expr(value)?;
                self.bind(name, ty);
                Ok(())
            }
            Statement::Return(expr) | Statement::Expr(expr) => self.check_expr(expr).map(|_| ()),
            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                let ty = self.check_expr(condition)?;
                if !ty.is_bool() {
                    return Err(TypeError::NonBoolCondition(ty));
                }
                self.check_block(then_block)?;
                if let Some(else_block) = else_block {
                    self.check_block(else_block)?;
                }
                Ok(())
            }
        }
    }

    /// Infer the type of an expression in the current scope.
    pub fn check_expr(&self, expr: &Expr) -> TypeResult<Type> {
        match expr {
            Expr::Literal(literal) => Ok(literal_type(literal)),
            Expr::Identifier(name) => self
                .lookup(name)
                .cloned()
                .ok_or_else(|| TypeError::UndeclaredVariable(name.clone())),
            Expr::Binary { op, left, right } => {
                let left = self.check_expr(left)?;
                let right = self.check_expr(right)?;
                binary_type(*op, left, right)
            }
            Expr::Unary { op, operand } => {
                let ty = self.check_expr(operand)?;
                match op {
                    UnaryOp::Not if ty.is_bool() => Ok(ty),
                    UnaryOp::Not => Err(TypeError::UnaryOperand {
                        op: *op,
                        expected: "bool",
                        found: ty,
                    }),
                    UnaryOp::Plus | UnaryOp::Neg if ty.is_numeric() => Ok(ty),
                    UnaryOp::Plus | UnaryOp::Neg => Err(TypeError::UnaryOperand {
                        op: *op,
                        expected: "numeric",
                        found: ty,
                    }),
                }
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    self.check_expr(arg)?;
                }
                // No signature registry: every call is an int.
                Ok(Type::INT)
            }
            Expr::Prepare => Ok(Type::Quantum),
            Expr::Measure(name) => match self.lookup(name) {
                None => Err(TypeError::MeasureUndeclared(name.clone())),
                Some(Type::Quantum) => Ok(Type::BOOL),
                Some(other) => Err(TypeError::MeasureNonQubit {
                    name: name.clone(),
                    found: other.clone(),
                }),
            },
            Expr::Grouping(inner) => self.check_expr(inner),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn bind(&mut self, name: &str, ty: Type) {
        if self.scopes.is_empty() {
            self.scopes.push(FxHashMap::default());
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal.kind {
        LiteralKind::Int => Type::INT,
        LiteralKind::Float => Type::FLOAT,
        LiteralKind::Bool => Type::BOOL,
        LiteralKind::String => Type::STRING,
    }
}

fn binary_type(op: BinaryOp, left: Type, right: Type) -> TypeResult<Type> {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => Ok(Type::BOOL),
        BinaryOp::And | BinaryOp::Or => {
            if left.is_bool() && right.is_bool() {
                Ok(Type::BOOL)
            } else {
                Err(TypeError::LogicalOperands { op, left, right })
            }
        }
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
            if left.is_numeric() && right.is_numeric() {
                Ok(Type::BOOL)
            } else {
                Err(TypeError::ComparisonOperands { op, left, right })
            }
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            if !(left.is_numeric() && right.is_numeric()) {
                Err(TypeError::ArithmeticOperands { op, left, right })
            } else if left.is_float() || right.is_float() {
                Ok(Type::FLOAT)
            } else {
                Ok(Type::INT)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krypton_syntax::parse;

    fn check(source: &str) -> TypeResult<()> {
        check_module(&parse(source).unwrap())
    }

    fn expr_type(expr: Expr) -> TypeResult<Type> {
        TypeChecker::new().check_expr(&expr)
    }

    #[test]
    fn test_valid_program() {
        check(
            r#"
            fn add(a: int, b: float) -> float { return a + b; }
            quantum qpute flip(q: qbit) { measure q; }
            process main {
                let q = prepare qbit;
                let ok = measure q;
                if (ok && 1 < 2) { kp("yes"); } else { kp(add(1, 2.5)); }
            }
            "#,
        )
        .unwrap();
    }

    #[test]
    fn test_quantum_parameter_in_function() {
        let err = check("fn f(q: qbit) -> int { return 1; }").unwrap_err();
        assert!(err.to_string().starts_with("quantum parameter in classical function"));
    }

    #[test]
    fn test_classical_parameter_in_qpute() {
        let err = check("qpute g(x: int) { }").unwrap_err();
        assert!(err.to_string().starts_with("non-quantum parameter in qpute"));
    }

    #[test]
    fn test_boundary_runs_inside_check() {
        let err = check("qpute g(q: qbit) { if (true) { } }").unwrap_err();
        assert!(matches!(err, TypeError::QuantumBranching));
    }

    #[test]
    fn test_literal_kinds() {
        assert_eq!(expr_type(Expr::int(3)).unwrap(), Type::INT);
        assert_eq!(expr_type(Expr::Literal(Literal::float("2.5"))).unwrap(), Type::FLOAT);
        assert_eq!(expr_type(Expr::bool(true)).unwrap(), Type::BOOL);
        // Quoted digits stay a string.
        assert_eq!(expr_type(Expr::string("12")).unwrap(), Type::STRING);
    }

    #[test]
    fn test_operator_rules() {
        assert_eq!(
            expr_type(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::Literal(Literal::float("1.0"))))
                .unwrap(),
            Type::FLOAT
        );
        assert_eq!(
            expr_type(Expr::binary(BinaryOp::Eq, Expr::string("a"), Expr::int(1))).unwrap(),
            Type::BOOL
        );

        let err = expr_type(Expr::binary(BinaryOp::And, Expr::int(1), Expr::bool(true))).unwrap_err();
        assert!(err.to_string().starts_with("logical operators require bool operands"));

        let err = expr_type(Expr::binary(BinaryOp::Lt, Expr::bool(true), Expr::int(1))).unwrap_err();
        assert!(err.to_string().starts_with("comparison operators require numeric operands"));

        let err = expr_type(Expr::binary(BinaryOp::Mul, Expr::string("a"), Expr::int(1))).unwrap_err();
        assert!(err.to_string().starts_with("arithmetic operators require numeric operands"));
    }

    #[test]
    fn test_unary_rules() {
        assert_eq!(expr_type(Expr::unary(UnaryOp::Not, Expr::bool(false))).unwrap(), Type::BOOL);
        assert_eq!(expr_type(Expr::unary(UnaryOp::Neg, Expr::int(4))).unwrap(), Type::INT);
        assert!(expr_type(Expr::unary(UnaryOp::Not, Expr::int(4))).is_err());
        assert!(expr_type(Expr::unary(UnaryOp::Neg, Expr::bool(true))).is_err());
    }

    #[test]
    fn test_call_is_int() {
        assert_eq!(
            expr_type(Expr::call("anything", vec![Expr::string("x")])).unwrap(),
            Type::INT
        );
    }

    #[test]
    fn test_measure_rules() {
        let err = check("process main { measure q; }").unwrap_err();
        assert!(err.to_string().starts_with("measure of undeclared variable"));

        let err = check("process main { let x = 1; measure x; }").unwrap_err();
        assert!(err.to_string().starts_with("can only measure qbit"));
    }

    #[test]
    fn test_undeclared_variable() {
        let err = check("process main { kp(y); }").unwrap_err();
        assert!(matches!(err, TypeError::UndeclaredVariable(ref n) if n == "y"));
    }

    #[test]
    fn test_if_condition_must_be_bool() {
        let err = check("process main { if (1) { } }").unwrap_err();
        assert!(err.to_string().starts_with("if condition must be bool"));
    }

    #[test]
    fn test_block_scoping() {
        // Bindings made inside a branch are gone after it.
        let err = check("process main { if (true) { let x = 1; } kp(x); }").unwrap_err();
        assert!(matches!(err, TypeError::UndeclaredVariable(_)));

        // Inner blocks may shadow with a different type.
        check("process main { let x = 1; if (true) { let x = true; if (x) { } } kp(x + 1); }")
            .unwrap();
    }

    #[test]
    fn test_parameters_scoped_to_declaration() {
        let err = check("fn f(a: int) -> int { return a; } process main { kp(a); }").unwrap_err();
        assert!(matches!(err, TypeError::UndeclaredVariable(_)));
    }
}
