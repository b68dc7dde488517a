//! calyx-eval - Tree-walking evaluator for the Calyx language.
//!
//! Evaluates the resolved (and usually optimized) AST. Scope-depth
//! annotations make every name lookup a fixed number of frame hops;
//! functions are first-class within the environment chain and capture
//! their defining frame as a closure; nodes marked by the
//! expression-DAG pass get per-run value caching.

mod builtins;
mod env;
mod error;
mod eval;
mod value;

pub use builtins::Builtin;
pub use env::{Callable, Env, Function, WeakEnv};
pub use error::RuntimeError;
pub use eval::Evaluator;
pub use value::Value;
