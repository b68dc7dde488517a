//! The `calyx` binary: REPL and file driver.
//!
//! With no file argument an interactive session starts (prompt `calc> `,
//! continuation prompt `... ` while the last entered line ends in
//! whitespace). With a file argument the whole file runs as one program.
//! Per-program failures are logged and never terminate the session; the
//! process exits nonzero only when the driver itself fails.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use calyx_drv::{Interpreter, PipelineError, RunOptions};

/// Calyx - a small statically-typed calculator language
#[derive(Parser, Debug)]
#[command(name = "calyx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for the Calyx language", long_about = None)]
struct Cli {
    /// Program file to run; starts a REPL when omitted
    file: Option<PathBuf>,

    /// Disable the optimization pipeline
    #[arg(long)]
    no_optimize: bool,

    /// Print the optimized AST instead of running the program
    #[arg(long)]
    emit_ast: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "CALYX_VERBOSE")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let options = RunOptions {
        optimize: !cli.no_optimize,
        emit_ast: cli.emit_ast,
    };
    let interpreter = Interpreter::new(options);

    match &cli.file {
        Some(path) => run_file(&interpreter, path),
        None => repl(&interpreter),
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

/// Run a whole file as one program.
fn run_file(interpreter: &Interpreter, path: &PathBuf) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if let Err(e) = interpreter.run(&source, &mut io::stdout()) {
        report(&e);
    }
    Ok(())
}

/// Interactive loop. A program is submitted once the last entered line
/// does not end in whitespace; EOF ends the session.
fn repl(interpreter: &Interpreter) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock();
    let mut code = String::new();

    loop {
        let prompt = if code.is_empty() { "calc> " } else { "... " };
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        if lines.read_line(&mut line)? == 0 {
            // EOF: done.
            println!();
            return Ok(());
        }
        let entered = line.trim_end_matches(['\n', '\r']);
        if entered.trim().is_empty() {
            continue;
        }

        if !code.is_empty() {
            code.push(' ');
        }
        code.push_str(entered.trim());

        // A trailing space or tab asks for a continuation line.
        if entered.ends_with([' ', '\t']) {
            continue;
        }

        if let Err(e) = interpreter.run(&code, &mut io::stdout()) {
            report(&e);
        }
        code.clear();
    }
}

fn report(error: &PipelineError) {
    match error {
        PipelineError::Syntax(diagnostics) => {
            for diagnostic in diagnostics {
                error!("{}", diagnostic);
            }
        },
        other => error!("{}", other),
    }
}
