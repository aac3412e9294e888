//! Import resolution and module loading for Krypton.
//!
//! [`ModuleLoader::load`] parses an entry file, recursively loads its
//! imports through an [`ImportResolver`] and returns a single module whose
//! declaration list holds the local declarations followed by every imported
//! non-import declaration, in import order.

mod error;
mod loader;
mod resolver;

pub use error::{ImportError, ImportResult};
pub use loader::ModuleLoader;
pub use resolver::ImportResolver;
