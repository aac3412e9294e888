//! Abstract Syntax Tree for Krypton.
//!
//! The tree is produced once by the parser and never mutated afterwards.
//! Declarations are held behind [`Arc`] so that the module loader can share
//! them between modules without copying.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A complete Krypton module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Optional name from a leading `module <name>` header.
    pub name: Option<String>,
    /// Declarations in source order.
    pub declarations: Vec<Arc<Declaration>>,
}

impl Module {
    /// Create a module from a list of declarations.
    pub fn new(declarations: impl IntoIterator<Item = Declaration>) -> Self {
        Self {
            name: None,
            declarations: declarations.into_iter().map(Arc::new).collect(),
        }
    }

    /// Iterate over the import declarations of this module.
    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.declarations.iter().filter_map(|d| match d.as_ref() {
            Declaration::Import(import) => Some(import),
            _ => None,
        })
    }

    /// Find a process by name.
    pub fn process(&self, name: &str) -> Option<&ProcessDecl> {
        self.declarations.iter().find_map(|d| match d.as_ref() {
            Declaration::Process(p) if p.name == name => Some(p),
            _ => None,
        })
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    /// Classical function: `fn name(params) -> type { ... }`
    Function(FunctionDecl),
    /// Quantum procedure: `quantum qpute name(params) { ... }`
    QuantumProcedure(QuantumProcedureDecl),
    /// Entry routine: `process name { ... }`
    Process(ProcessDecl),
    /// Import: `import a.b.c;`
    Import(ImportDecl),
}

impl Declaration {
    /// The declared name, if the declaration introduces one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Function(f) => Some(&f.name),
            Declaration::QuantumProcedure(q) => Some(&q.name),
            Declaration::Process(p) => Some(&p.name),
            Declaration::Import(_) => None,
        }
    }

    /// Check if this is an import declaration.
    pub fn is_import(&self) -> bool {
        matches!(self, Declaration::Import(_))
    }
}

/// A typed parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumProcedureDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDecl {
    pub name: String,
    pub body: Block,
}

/// Dotted import path, e.g. `backend.core`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub path: Vec<String>,
}

impl fmt::Display for ImportDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("."))
    }
}

/// An ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `let name = value;`
    Let { name: String, value: Expr },
    /// `return value;`
    Return(Expr),
    /// `if (condition) { ... } else { ... }`
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    /// Expression statement.
    Expr(Expr),
}

/// Literal category, fixed by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Int,
    Float,
    Bool,
    String,
}

/// A literal with its source text (quotes stripped for strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

impl Literal {
    pub fn int(value: i64) -> Self {
        Self {
            kind: LiteralKind::Int,
            text: value.to_string(),
        }
    }

    pub fn float(text: impl Into<String>) -> Self {
        Self {
            kind: LiteralKind::Float,
            text: text.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self {
            kind: LiteralKind::Bool,
            text: value.to_string(),
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self {
            kind: LiteralKind::String,
            text: text.into(),
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `prepare qbit`
    Prepare,
    /// `measure name`
    Measure(String),
    /// Parenthesized expression.
    Grouping(Box<Expr>),
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::int(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal(Literal::bool(value))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::Literal(Literal::string(text))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
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
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Plus,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

/// Primitive scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Int,
    Float,
    Bool,
    String,
}

/// A Krypton type. Compared structurally, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    /// `qbit`
    Quantum,
    Named(String),
}

impl Type {
    pub const INT: Type = Type::Primitive(PrimitiveType::Int);
    pub const FLOAT: Type = Type::Primitive(PrimitiveType::Float);
    pub const BOOL: Type = Type::Primitive(PrimitiveType::Bool);
    pub const STRING: Type = Type::Primitive(PrimitiveType::String);

    /// Map a source-level type name to a type.
    pub fn from_name(name: &str) -> Self {
        match name {
            "qbit" => Type::Quantum,
            "int" => Type::INT,
            "float" => Type::FLOAT,
            "bool" => Type::BOOL,
            "string" => Type::STRING,
            other => Type::Named(other.to_string()),
        }
    }

    pub fn is_quantum(&self) -> bool {
        matches!(self, Type::Quantum)
    }

    pub fn is_bool(&self) -> bool {
        *self == Type::BOOL
    }

    pub fn is_float(&self) -> bool {
        *self == Type::FLOAT
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Primitive(PrimitiveType::Int | PrimitiveType::Float)
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(PrimitiveType::Int) => write!(f, "int"),
            Type::Primitive(PrimitiveType::Float) => write!(f, "float"),
            Type::Primitive(PrimitiveType::Bool) => write!(f, "bool"),
            Type::Primitive(PrimitiveType::String) => write!(f, "string"),
            Type::Quantum => write!(f, "qbit"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}
