//! Krypton command-line interface.
//!
//! ```text
//! kcc program.k                 run the `main` process of a file
//! kcc program.k --emit-ir text  print the lowered streams instead
//! kcc --repl                    interactive session
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::emit::IrFormat;
use commands::{common, emit, repl, run};

/// kcc - compile and run Krypton programs
#[derive(Parser)]
#[command(name = "kcc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Krypton source file
    #[arg(required_unless_present = "repl", conflicts_with = "repl")]
    file: Option<PathBuf>,

    /// Start an interactive session
    #[arg(long)]
    repl: bool,

    /// Directory imports are resolved against
    #[arg(long)]
    import_root: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum call depth
    #[arg(long)]
    max_frames: Option<usize>,

    /// Print the lowered program instead of running it
    #[arg(long, value_enum)]
    emit_ir: Option<IrFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let config = common::build_config(
        cli.config.as_deref(),
        cli.import_root.clone(),
        cli.max_frames,
    );

    // Setup logging
    let filter = match cli.verbose {
        0 => config
            .as_ref()
            .map_or("warn", |config| config.logging.level.as_str()),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = config.and_then(|config| match (cli.file, cli.emit_ir) {
        (Some(file), Some(format)) => emit::execute(&file, config, format),
        (Some(file), None) => run::execute(&file, config),
        (None, _) => repl::execute(config),
    });

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
