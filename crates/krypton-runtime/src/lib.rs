//! Krypton runtime: loads a program, checks it, lowers it and runs `main`.
//!
//! # Example
//!
//! ```rust
//! use krypton_runtime::Runtime;
//!
//! let mut runtime = Runtime::default();
//! let mut out = Vec::new();
//! runtime
//!     .run_source("process main { let x = 2; let y = x + 3; kp(y); }", &mut out)
//!     .unwrap();
//!
//! assert_eq!(String::from_utf8(out).unwrap(), "5\n");
//! ```

pub mod config;
mod error;
mod runtime;

pub use config::{ConfigError, LoggingConfig, RuntimeConfig};
pub use error::{Error, Result};
pub use krypton_vm::{Limits, Measurement};
pub use runtime::{ENTRY_PROCESS, Program, RunReport, Runtime};
