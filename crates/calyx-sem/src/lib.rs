//! calyx-sem - Semantic analysis for the Calyx language.
//!
//! Two passes over the parsed AST:
//!
//! 1. [`Resolver`] computes the static scope depth of every name use and
//!    writes it into the tree, making later lookups O(1).
//! 2. [`TypeChecker`] verifies types against a fixed operator table and
//!    records a callable signature for every function definition.
//!
//! Both walk the tree with a scope stack; neither survives a run, so a
//! fresh pass is constructed per program.

pub mod builtins;
mod error;
mod resolver;
mod typecheck;
mod types;

pub use error::{ResolveError, TypeError};
pub use resolver::Resolver;
pub use typecheck::TypeChecker;
pub use types::{FnSig, Signature};
