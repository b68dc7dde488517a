//! Semantic error types.

use calyx_par::{BinOp, Ty, UnOp};
use calyx_util::Symbol;
use thiserror::Error;

/// Name resolution errors. Fatal for the current program run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A variable use that no enclosing scope declares.
    #[error("failed to resolve variable '{0}'")]
    UnresolvedVariable(Symbol),

    /// A call target that no enclosing scope defines.
    #[error("failed to resolve function '{0}'")]
    UnresolvedFunction(Symbol),
}

/// Type errors. Fatal for the current program run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Declared or assigned variable receives a value of the wrong type.
    #[error("incorrect value for variable '{name}' of type {expected}: found {found}")]
    ValueMismatch {
        name: Symbol,
        expected: Ty,
        found: Ty,
    },

    /// Condition of `if`/`while`/`for` is not a bool.
    #[error("non-boolean condition in '{construct}' statement")]
    NonBooleanCondition { construct: &'static str },

    /// `assert` applied to a non-bool expression.
    #[error("assert requires a bool expression, found {found}")]
    AssertNotBool { found: Ty },

    /// Operator not defined for the operand types.
    #[error("incorrect types for operator: {left} {right} {op}")]
    BadOperandTypes { op: BinOp, left: Ty, right: Ty },

    /// Unary operator not defined for the operand type.
    #[error("incorrect type for operator: {ty} {op}")]
    BadUnaryOperand { op: UnOp, ty: Ty },

    /// Argument type differs from the parameter type.
    #[error("type mismatch in call to '{name}': expected {expected}, given {found}")]
    ArgumentMismatch {
        name: Symbol,
        expected: Ty,
        found: Ty,
    },

    /// Wrong number of arguments.
    #[error("call to '{name}' expects {expected} arguments, given {found}")]
    ArityMismatch {
        name: Symbol,
        expected: usize,
        found: usize,
    },

    /// No signature of a polymorphic callable matched.
    #[error("no signatures matched for call to '{name}'")]
    NoMatchingSignature { name: Symbol },

    /// Function body returns a type other than the declared one.
    #[error("function '{name}' declared to return {declared} but returns {found}")]
    ReturnTypeMismatch {
        name: Symbol,
        declared: Ty,
        found: Ty,
    },

    /// `return` at the top level of the program.
    #[error("'return' outside of a function body")]
    ReturnOutsideFunction,

    /// Variable use the checker cannot resolve at the recorded depth.
    #[error("failed to resolve variable '{0}'")]
    UnresolvedVariable(Symbol),

    /// Call target the checker cannot resolve at the recorded depth.
    /// Also raised for calls to a function whose signature is not yet
    /// recorded (a function's signature is established only after its
    /// body has been checked).
    #[error("failed to resolve function '{0}'")]
    UnresolvedFunction(Symbol),

    /// A statement node reached expression checking.
    #[error("internal: expected an expression node")]
    NotAnExpression,
}
