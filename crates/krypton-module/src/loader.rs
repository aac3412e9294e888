//! Module loading with caching and cycle detection.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use krypton_syntax::Module;
use krypton_syntax::ast::Declaration;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, trace};

use crate::error::{ImportError, ImportResult};
use crate::resolver::ImportResolver;

/// Loads source files and merges the declarations of everything they import.
///
/// Each canonical path is parsed at most once per loader. Paths currently
/// being loaded sit on an in-progress stack; reaching one of them again is a
/// cycle. A path is never on that stack and in the cache at the same time.
#[derive(Debug)]
pub struct ModuleLoader {
    resolver: ImportResolver,
    cache: FxHashMap<PathBuf, Arc<Module>>,
    in_progress: Vec<PathBuf>,
    parse_count: usize,
}

impl ModuleLoader {
    /// Create a loader resolving imports under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_resolver(ImportResolver::new(root))
    }

    pub fn with_resolver(resolver: ImportResolver) -> Self {
        Self {
            resolver,
            cache: FxHashMap::default(),
            in_progress: Vec::new(),
            parse_count: 0,
        }
    }

    pub fn resolver(&self) -> &ImportResolver {
        &self.resolver
    }

    /// Number of files parsed so far.
    pub fn parse_count(&self) -> usize {
        self.parse_count
    }

    /// Check if a file has been loaded.
    pub fn is_cached(&self, path: &Path) -> bool {
        path.canonicalize()
            .is_ok_and(|canonical| self.cache.contains_key(&canonical))
    }

    /// Load a file and everything it imports.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(&mut self, path: &Path) -> ImportResult<Arc<Module>> {
        let canonical = path.canonicalize().map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(module) = self.cache.get(&canonical) {
            trace!("Cache hit");
            return Ok(Arc::clone(module));
        }

        if let Some(start) = self.in_progress.iter().position(|p| *p == canonical) {
            let chain = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| display_name(p))
                .collect();
            return Err(ImportError::Cycle { chain });
        }

        debug!("Loading module");
        self.in_progress.push(canonical.clone());
        let result = self.parse_file(&canonical);
        self.in_progress.pop();

        let module = Arc::new(result?);
        self.cache.insert(canonical, Arc::clone(&module));
        Ok(module)
    }

    /// Merge the imports of an already parsed module.
    ///
    /// Used for sources that do not live in a file, such as REPL input.
    pub fn resolve_imports(&mut self, mut module: Module) -> ImportResult<Module> {
        let mut imported = Vec::new();
        // Cached modules share their declarations, so a diamond import
        // reaches the same allocation twice.
        let mut merged: FxHashSet<*const Declaration> =
            module.declarations.iter().map(Arc::as_ptr).collect();

        for import in module.imports() {
            let path = self.resolver.resolve(import)?;
            let dependency = self.load(&path)?;
            for decl in &dependency.declarations {
                if decl.is_import() || !merged.insert(Arc::as_ptr(decl)) {
                    continue;
                }
                imported.push(Arc::clone(decl));
            }
        }

        debug!("Merged {} imported declarations", imported.len());
        module.declarations.extend(imported);
        Ok(module)
    }

    fn parse_file(&mut self, path: &Path) -> ImportResult<Module> {
        let source = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.parse_count += 1;
        let module = krypton_syntax::parse(&source).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        self.resolve_imports(module)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
