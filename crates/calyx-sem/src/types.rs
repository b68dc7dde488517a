//! Callable signatures.

use calyx_par::Ty;
use calyx_util::Symbol;

use crate::error::TypeError;

/// A single function signature: positional parameter types and the
/// return type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FnSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

impl FnSig {
    pub fn new(params: Vec<Ty>, ret: Ty) -> Self {
        Self { params, ret }
    }

    fn verify(&self, name: Symbol, args: &[Ty]) -> Result<Ty, TypeError> {
        if self.params.len() != args.len() {
            return Err(TypeError::ArityMismatch {
                name,
                expected: self.params.len(),
                found: args.len(),
            });
        }
        for (param, arg) in self.params.iter().zip(args) {
            if param != arg {
                return Err(TypeError::ArgumentMismatch {
                    name,
                    expected: *param,
                    found: *arg,
                });
            }
        }
        Ok(self.ret)
    }
}

/// A callable's signature: user functions are monomorphic, builtins can
/// be polymorphic over a fixed signature list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    Mono(FnSig),
    Poly(Vec<FnSig>),
}

impl Signature {
    /// Verify positional argument types, returning the call's type.
    ///
    /// For polymorphic callables the first matching signature wins.
    pub fn verify(&self, name: Symbol, args: &[Ty]) -> Result<Ty, TypeError> {
        match self {
            Signature::Mono(sig) => sig.verify(name, args),
            Signature::Poly(sigs) => {
                for sig in sigs {
                    if let Ok(ret) = sig.verify(name, args) {
                        return Ok(ret);
                    }
                }
                Err(TypeError::NoMatchingSignature { name })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name() -> Symbol {
        Symbol::intern("f")
    }

    #[test]
    fn test_mono_signature() {
        let sig = Signature::Mono(FnSig::new(vec![Ty::Int, Ty::Str], Ty::Bool));
        assert_eq!(sig.verify(name(), &[Ty::Int, Ty::Str]), Ok(Ty::Bool));
    }

    #[test]
    fn test_mono_argument_mismatch() {
        let sig = Signature::Mono(FnSig::new(vec![Ty::Int], Ty::Unit));
        assert_eq!(
            sig.verify(name(), &[Ty::Float]),
            Err(TypeError::ArgumentMismatch {
                name: name(),
                expected: Ty::Int,
                found: Ty::Float,
            })
        );
    }

    #[test]
    fn test_mono_arity_mismatch() {
        let sig = Signature::Mono(FnSig::new(vec![Ty::Int], Ty::Unit));
        assert!(matches!(
            sig.verify(name(), &[]),
            Err(TypeError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_poly_first_match_wins() {
        let sig = Signature::Poly(vec![
            FnSig::new(vec![Ty::Int], Ty::Float),
            FnSig::new(vec![Ty::Float], Ty::Float),
            FnSig::new(vec![Ty::Int], Ty::Int),
        ]);
        // Both the first and third match; the first wins.
        assert_eq!(sig.verify(name(), &[Ty::Int]), Ok(Ty::Float));
        assert_eq!(sig.verify(name(), &[Ty::Float]), Ok(Ty::Float));
    }

    #[test]
    fn test_poly_no_match() {
        let sig = Signature::Poly(vec![FnSig::new(vec![Ty::Int], Ty::Int)]);
        assert_eq!(
            sig.verify(name(), &[Ty::Bool]),
            Err(TypeError::NoMatchingSignature { name: name() })
        );
    }
}
