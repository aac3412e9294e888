//! Krypton syntax: lexer, parser and syntax tree.
//!
//! Krypton is a small hybrid classical/quantum language. A module declares
//! classical functions, quantum procedures (bodies restricted to quantum
//! operations) and processes (entry routines).
//!
//! # Example
//!
//! ```rust
//! use krypton_syntax::{parse, ast::Declaration};
//!
//! let module = parse(r#"
//!     fn add(a: int, b: int) -> int { return a + b; }
//!     process main { kp(add(2, 3)); }
//! "#).unwrap();
//!
//! assert_eq!(module.declarations.len(), 2);
//! assert!(matches!(module.declarations[0].as_ref(), Declaration::Function(_)));
//! assert!(module.process("main").is_some());
//! ```

pub mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{Module, Type};
pub use error::{ParseError, ParseResult};
pub use parser::parse;

/// Name of the built-in print function.
pub const PRINT_BUILTIN: &str = "kp";

/// File extension of Krypton source files.
pub const SOURCE_EXTENSION: &str = "k";
