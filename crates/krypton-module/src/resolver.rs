//! Mapping of dotted import paths to source files.

use std::path::{Path, PathBuf};

use krypton_syntax::SOURCE_EXTENSION;
use krypton_syntax::ast::ImportDecl;

use crate::error::{ImportError, ImportResult};

/// Resolves imports relative to a root directory.
///
/// `import backend.core;` resolves to `<root>/backend/core.k`.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    root: PathBuf,
}

impl ImportResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an import to an existing file.
    pub fn resolve(&self, import: &ImportDecl) -> ImportResult<PathBuf> {
        let mut path = self.root.clone();
        path.extend(&import.path);
        path.set_extension(SOURCE_EXTENSION);

        if path.is_file() {
            Ok(path)
        } else {
            Err(ImportError::NotFound {
                import: import.to_string(),
                path,
            })
        }
    }
}
