//! Pipeline orchestration: load, check, lower, execute.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use krypton_compile::{check_module, lower_functions, lower_module, lower_quantum_procedures};
use krypton_ir::{FunctionTable, LoweredProcess, QuantumStream};
use krypton_module::ModuleLoader;
use krypton_syntax::Module;
use krypton_vm::{Interpreter, Measurement, QuantumSimulator, RuntimeError};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::RuntimeConfig;
use crate::error::Result;

/// Name of the process a run starts from.
pub const ENTRY_PROCESS: &str = "main";

/// A checked and lowered module.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub functions: Arc<FunctionTable>,
    pub processes: FxHashMap<String, LoweredProcess>,
    pub procedures: FxHashMap<String, QuantumStream>,
}

impl Program {
    pub fn process(&self, name: &str) -> Option<&LoweredProcess> {
        self.processes.get(name)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.functions.names() {
            if let Some(function) = self.functions.get(name) {
                writeln!(f, "fn {}({}):", name, function.params.join(", "))?;
                write!(f, "{}", function.code)?;
            }
        }

        let mut procedures: Vec<_> = self.procedures.iter().collect();
        procedures.sort_by_key(|(name, _)| *name);
        for (name, stream) in procedures {
            writeln!(f, "qpute {name}:")?;
            write!(f, "{stream}")?;
        }

        let mut processes: Vec<_> = self.processes.iter().collect();
        processes.sort_by_key(|(name, _)| *name);
        for (name, process) in processes {
            writeln!(f, "process {name}:")?;
            writeln!(f, "  classical:")?;
            write!(f, "{}", process.classical)?;
            writeln!(f, "  quantum:")?;
            write!(f, "{}", process.quantum)?;
        }
        Ok(())
    }
}

/// Result of one successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Measurement outcomes in execution order.
    pub measurements: Vec<Measurement>,
}

/// Runs Krypton programs.
///
/// Interpreter and simulator state is reset at the start of every run, so
/// one runtime can serve many runs (the REPL uses a single instance).
#[derive(Debug)]
pub struct Runtime {
    config: RuntimeConfig,
    interpreter: Interpreter,
    simulator: QuantumSimulator,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            interpreter: Interpreter::with_limits(config.limits),
            simulator: QuantumSimulator::new(),
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Load a file and merge everything it imports.
    pub fn load_file(&self, path: &Path) -> Result<Arc<Module>> {
        let root = self.import_root(path.parent());
        debug!("Resolving imports under {}", root.display());
        Ok(ModuleLoader::new(root).load(path)?)
    }

    /// Type check and lower a module.
    #[instrument(skip_all)]
    pub fn compile(&self, module: &Module) -> Result<Program> {
        check_module(module)?;

        let program = Program {
            functions: Arc::new(lower_functions(module)?),
            processes: lower_module(module)?,
            procedures: lower_quantum_procedures(module)?,
        };
        info!(
            "Compiled {} functions, {} processes, {} quantum procedures",
            program.functions.len(),
            program.processes.len(),
            program.procedures.len()
        );
        Ok(program)
    }

    /// Load, compile and run a file.
    #[instrument(skip(self, out))]
    pub fn run_file(&mut self, path: &Path, out: &mut dyn Write) -> Result<RunReport> {
        let module = self.load_file(path)?;
        self.run_module(&module, out)
    }

    /// Parse, compile and run source text. Imports resolve against the
    /// configured root or the working directory.
    pub fn run_source(&mut self, source: &str, out: &mut dyn Write) -> Result<RunReport> {
        let module = self.parse_source(source)?;
        self.run_module(&module, out)
    }

    /// Parse source text and merge its imports.
    pub fn parse_source(&self, source: &str) -> Result<Module> {
        let module = krypton_syntax::parse(source)?;
        if module.imports().next().is_none() {
            return Ok(module);
        }
        let mut loader = ModuleLoader::new(self.import_root(None));
        Ok(loader.resolve_imports(module)?)
    }

    /// Compile and run an already merged module.
    pub fn run_module(&mut self, module: &Module, out: &mut dyn Write) -> Result<RunReport> {
        let program = self.compile(module)?;
        self.run_program(&program, out)
    }

    /// Run the `main` process of a compiled program.
    pub fn run_program(&mut self, program: &Program, out: &mut dyn Write) -> Result<RunReport> {
        let main = program
            .process(ENTRY_PROCESS)
            .ok_or_else(|| RuntimeError::MissingProcess(ENTRY_PROCESS.to_string()))?;

        self.interpreter.reset();
        self.simulator.reset();
        self.interpreter
            .set_function_table(Arc::clone(&program.functions));

        self.interpreter.run(&main.classical, out)?;
        let measurements = self.simulator.run(&main.quantum, out)?;

        debug!("Run finished with {} measurements", measurements.len());
        Ok(RunReport { measurements })
    }

    fn import_root(&self, fallback: Option<&Path>) -> PathBuf {
        self.config
            .import_root
            .clone()
            .or_else(|| fallback.map(Path::to_path_buf))
            .filter(|root| !root.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
