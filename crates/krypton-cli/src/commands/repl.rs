//! Interactive session.
//!
//! Every input line becomes the body of a fresh `main` process. Errors are
//! reported and the session continues; `:quit` or end of input ends it.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use console::style;
use krypton_runtime::{Runtime, RuntimeConfig};

const PROMPT: &str = ">>> ";
const QUIT: &str = ":quit";

/// Run the REPL on stdin and stdout.
pub fn execute(config: RuntimeConfig) -> Result<()> {
    let mut runtime = Runtime::new(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    session(&mut runtime, stdin.lock(), &mut stdout.lock())?;
    Ok(())
}

fn session<R: BufRead, W: Write>(runtime: &mut Runtime, mut input: R, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{} {}",
        style("Krypton REPL").cyan().bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).yellow()
    )?;
    writeln!(out, "Type {QUIT} to exit.")?;

    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }

        let line = line.trim();
        if line == QUIT {
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        let source = wrap_line(line);
        if let Err(e) = runtime.run_source(&source, out) {
            writeln!(out, "{} {e}", style("Error:").red().bold())?;
        }
    }
}

fn wrap_line(line: &str) -> String {
    format!("process main {{ {line} }}")
}
