//! Optimizer-internal errors.
//!
//! These indicate bugs in the analyses, never problems with the user
//! program. The driver aborts the pipeline cleanly when one surfaces
//! rather than evaluating a half-rewritten tree.

use calyx_par::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptError {
    /// A node was queried before its GEN/KILL sets were computed.
    #[error("internal: no GEN/KILL sets recorded for {0:?}")]
    MissingGenKill(NodeId),

    /// A node was queried before its IN set was seeded.
    #[error("internal: no IN set recorded for {0:?}")]
    MissingIn(NodeId),

    /// A statement node reached an expression-only path.
    #[error("internal: expected an expression node at {0:?}")]
    NotAnExpression(NodeId),
}
