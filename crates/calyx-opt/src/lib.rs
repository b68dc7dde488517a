//! calyx-opt - Dataflow analysis and the optimization pipeline.
//!
//! The dataflow engine computes per-node GEN/KILL and IN/OUT sets of
//! reaching definitions, treating the AST itself as the control-flow
//! structure (one bottom-up pass, no iterative fixpoint over a CFG; see
//! [`dataflow`] for the approximations this buys and costs). Those sets
//! drive three optimizers:
//!
//! - [`RedundancyOptimizer`] prunes statements that cannot contribute to
//!   an observable effect,
//! - [`ExpressionDagOptimizer`] shares common subexpressions and marks
//!   the shared nodes for evaluation caching,
//! - [`AlgebraicOptimizer`] folds neutral elements.
//!
//! All three consume the same [`Dataflow`] table, computed once.

pub mod algebraic;
pub mod dag;
pub mod dataflow;
mod error;
pub mod redundancy;

pub use algebraic::AlgebraicOptimizer;
pub use dag::ExpressionDagOptimizer;
pub use dataflow::Dataflow;
pub use error::OptError;
pub use redundancy::RedundancyOptimizer;

#[cfg(test)]
mod tests;
