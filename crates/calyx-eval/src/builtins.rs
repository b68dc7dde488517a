//! Builtin function implementations.
//!
//! The names and signatures live in calyx-sem (every pass needs them);
//! this module provides the runtime behaviour. `toint` truncates toward
//! zero; string conversions fail with a runtime error when the text does
//! not parse.

use calyx_util::Symbol;

use crate::error::RuntimeError;
use crate::value::Value;

/// A builtin function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    ToInt,
    ToFloat,
    ToString,
}

impl Builtin {
    /// All builtins with their interned names.
    pub fn all() -> impl Iterator<Item = (Symbol, Builtin)> {
        [
            ("sin", Builtin::Sin),
            ("cos", Builtin::Cos),
            ("toint", Builtin::ToInt),
            ("tofloat", Builtin::ToFloat),
            ("tostring", Builtin::ToString),
        ]
        .into_iter()
        .map(|(name, builtin)| (Symbol::intern(name), builtin))
    }

    fn name(self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::ToInt => "toint",
            Builtin::ToFloat => "tofloat",
            Builtin::ToString => "tostring",
        }
    }

    /// Apply the builtin to already-evaluated arguments.
    pub fn call(self, args: &[Value]) -> Result<Value, RuntimeError> {
        let [arg] = args else {
            return Err(RuntimeError::BuiltinArity(self.name()));
        };
        match self {
            Builtin::Sin => numeric(arg, self.name()).map(|v| Value::Float(v.sin())),
            Builtin::Cos => numeric(arg, self.name()).map(|v| Value::Float(v.cos())),
            Builtin::ToInt => match arg {
                Value::Int(v) => Ok(Value::Int(*v)),
                Value::Float(v) => Ok(Value::Int(v.trunc() as i64)),
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    RuntimeError::ConversionFailed {
                        value: s.to_string(),
                        target: "int",
                    }
                }),
                other => Err(invalid(other, "toint")),
            },
            Builtin::ToFloat => match arg {
                Value::Int(v) => Ok(Value::Float(*v as f64)),
                Value::Float(v) => Ok(Value::Float(*v)),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                    RuntimeError::ConversionFailed {
                        value: s.to_string(),
                        target: "float",
                    }
                }),
                other => Err(invalid(other, "tofloat")),
            },
            Builtin::ToString => match arg {
                Value::Int(_) | Value::Float(_) | Value::Str(_) => {
                    Ok(Value::Str(arg.to_string().into()))
                },
                other => Err(invalid(other, "tostring")),
            },
        }
    }
}

fn numeric(value: &Value, op: &'static str) -> Result<f64, RuntimeError> {
    match value {
        Value::Int(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        other => Err(invalid(other, op)),
    }
}

fn invalid(_value: &Value, op: &'static str) -> RuntimeError {
    RuntimeError::InvalidOperands { op }
}
