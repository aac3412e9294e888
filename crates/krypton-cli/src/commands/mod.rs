//! CLI command implementations.

pub mod common;
pub mod emit;
pub mod repl;
pub mod run;
