//! Runtime error types. All are fatal for the current program run.

use calyx_util::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to resolve variable '{0}'")]
    UnresolvedVariable(Symbol),

    #[error("failed to resolve function '{0}'")]
    UnresolvedFunction(Symbol),

    #[error("variable '{0}' declared twice in the same scope")]
    VariableRedeclared(Symbol),

    #[error("function '{0}' defined twice in the same scope")]
    FunctionRedefined(Symbol),

    #[error("variable '{0}' used before initialization")]
    UninitializedVariable(Symbol),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("negative exponent in integer power")]
    NegativeExponent,

    #[error("integer overflow in '{op}'")]
    IntegerOverflow { op: &'static str },

    #[error("assertion failed")]
    AssertionFailed,

    #[error("'return' outside of a function body")]
    ReturnOutsideFunction,

    #[error("cannot convert '{value}' to {target}")]
    ConversionFailed { value: String, target: &'static str },

    /// Writing program output failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    // The remaining variants indicate bugs: the type checker rules the
    // situations out before evaluation starts.
    #[error("internal: invalid operands for '{op}'")]
    InvalidOperands { op: &'static str },

    #[error("internal: non-boolean condition value")]
    NonBooleanCondition,

    #[error("internal: builtin '{0}' takes one argument")]
    BuiltinArity(&'static str),

    #[error("internal: closure environment no longer alive")]
    ClosureGone,
}
