//! Compiled functions and per-process output.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::classical::ClassicalStream;
use crate::quantum::QuantumStream;

/// A lowered classical function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFunction {
    pub name: String,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
    pub code: ClassicalStream,
}

impl CompiledFunction {
    /// Number of arguments a call binds.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Function name to compiled function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionTable {
    functions: FxHashMap<String, Arc<CompiledFunction>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a function unless one with the same name already exists.
    ///
    /// Returns `false` when the name was taken.
    pub fn insert(&mut self, function: CompiledFunction) -> bool {
        if self.functions.contains_key(&function.name) {
            return false;
        }
        self.functions
            .insert(function.name.clone(), Arc::new(function));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CompiledFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Function names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The classical and quantum streams of one process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoweredProcess {
    pub classical: ClassicalStream,
    pub quantum: QuantumStream,
}
