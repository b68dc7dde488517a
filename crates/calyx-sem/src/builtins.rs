//! Builtin function names and signatures.
//!
//! Builtins live at scope depth 0 in every pass: the resolver seeds its
//! global scope with these names, the checker with their signatures, and
//! the evaluator binds the matching implementations.

use calyx_par::Ty;
use calyx_util::Symbol;

use crate::types::{FnSig, Signature};

/// Names of all builtin functions.
pub const NAMES: [&str; 5] = ["sin", "cos", "toint", "tofloat", "tostring"];

/// Builtin names as interned symbols.
pub fn symbols() -> impl Iterator<Item = Symbol> {
    NAMES.iter().map(|name| Symbol::intern(name))
}

/// Signatures of all builtins, in the order of [`NAMES`].
pub fn signatures() -> Vec<(Symbol, Signature)> {
    let math = || {
        Signature::Poly(vec![
            FnSig::new(vec![Ty::Int], Ty::Float),
            FnSig::new(vec![Ty::Float], Ty::Float),
        ])
    };
    let conversion = |ret: Ty| {
        Signature::Poly(vec![
            FnSig::new(vec![Ty::Int], ret),
            FnSig::new(vec![Ty::Float], ret),
            FnSig::new(vec![Ty::Str], ret),
        ])
    };

    vec![
        (Symbol::intern("sin"), math()),
        (Symbol::intern("cos"), math()),
        (Symbol::intern("toint"), conversion(Ty::Int)),
        (Symbol::intern("tofloat"), conversion(Ty::Float)),
        (Symbol::intern("tostring"), conversion(Ty::Str)),
    ]
}
