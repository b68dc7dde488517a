//! calyx-drv - Pipeline orchestration for the Calyx interpreter.
//!
//! [`Interpreter::run`] drives one program through the full pipeline:
//!
//! ```text
//! source → lex/parse → resolve → type-check
//!        → dataflow (GEN/KILL, IN/OUT)
//!        → redundancy elimination → expression DAG → algebraic folding
//!        → evaluate
//! ```
//!
//! Every pass is constructed inside `run`, so each run starts from a
//! pristine state (including a fresh global builtin frame), and nothing
//! leaks between programs. Errors from any phase abort the run and
//! surface as a [`PipelineError`]; the caller (REPL or file driver)
//! logs them and carries on.

use std::io::Write;

use thiserror::Error;
use tracing::debug;

use calyx_eval::{Evaluator, RuntimeError};
use calyx_opt::{
    AlgebraicOptimizer, Dataflow, ExpressionDagOptimizer, OptError, RedundancyOptimizer,
};
use calyx_par::parse_program;
use calyx_sem::{ResolveError, Resolver, TypeChecker, TypeError};
use calyx_util::{Diagnostic, Handler};

/// A failure anywhere in the pipeline. The program run is abandoned;
/// the session survives.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The parser reported diagnostics; the program was not executed.
    #[error("{} syntax error(s)", .0.len())]
    Syntax(Vec<Diagnostic>),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// An optimizer-internal inconsistency; a bug, never a user error.
    #[error("optimizer error: {0}")]
    Optimizer(#[from] OptError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// What a run should do.
#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    /// Run the optimization pipeline before evaluating.
    pub optimize: bool,
    /// Dump the (optimized) AST instead of evaluating it.
    pub emit_ast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            emit_ast: false,
        }
    }
}

/// The interpreter front door.
pub struct Interpreter {
    options: RunOptions,
}

impl Interpreter {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Run one program; `print` output goes to `out`.
    pub fn run(&self, source: &str, out: &mut dyn Write) -> Result<(), PipelineError> {
        let handler = Handler::new();
        let mut ast = parse_program(source, &handler);
        if handler.has_errors() {
            return Err(PipelineError::Syntax(handler.diagnostics()));
        }

        Resolver::new().run(&mut ast)?;
        TypeChecker::new().run(&ast)?;
        debug!(nodes = ast.len(), "front end done");

        if self.options.optimize {
            let dataflow = Dataflow::analyze(&ast)?;
            RedundancyOptimizer::new(&dataflow).run(&mut ast)?;
            ExpressionDagOptimizer::new(&dataflow).run(&mut ast)?;
            AlgebraicOptimizer::new().run(&mut ast)?;
            debug!("optimization pipeline done");
        }

        if self.options.emit_ast {
            write!(out, "{}", ast.dump()).map_err(RuntimeError::from)?;
            return Ok(());
        }

        Evaluator::new(out).run(&ast)?;
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(RunOptions::default())
    }
}

/// Run a program and capture its output as a string.
pub fn run_source(source: &str, options: RunOptions) -> Result<String, PipelineError> {
    let mut out = Vec::new();
    Interpreter::new(options).run(source, &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
