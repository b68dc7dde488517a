//! String interning.
//!
//! Identifiers appear in every pass of the pipeline, so names are interned
//! once into a global table and handled as 4-byte [`Symbol`] values. This
//! makes name comparison and hashing O(1) everywhere downstream.
//!
//! Interned strings are leaked to obtain `'static` lifetimes. The set of
//! distinct names in a program is bounded and small, so the table never
//! shrinks.

use std::fmt;
use std::sync::{LazyLock, RwLock};

use dashmap::DashMap;

/// An interned string identifier.
///
/// Two symbols are equal iff the strings they were interned from are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    /// Index into the global string table.
    index: u32,
}

impl Symbol {
    /// Intern a string, returning its symbol.
    ///
    /// Thread-safe; repeated calls with the same string return the same
    /// symbol.
    pub fn intern(string: &str) -> Self {
        INTERNER.intern(string)
    }

    /// Get the string this symbol was interned from.
    pub fn as_str(self) -> &'static str {
        INTERNER.get(self)
    }

    /// Get the raw index value.
    pub fn as_u32(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global interner instance.
static INTERNER: LazyLock<Interner> = LazyLock::new(Interner::new);

/// The global string table.
struct Interner {
    /// Maps interned string to its symbol index.
    map: DashMap<&'static str, u32, ahash::RandomState>,
    /// Storage in interning order; `Symbol.index` indexes into this.
    strings: RwLock<Vec<&'static str>>,
}

impl Interner {
    fn new() -> Self {
        Self {
            map: DashMap::with_hasher(ahash::RandomState::new()),
            strings: RwLock::new(Vec::new()),
        }
    }

    fn intern(&self, string: &str) -> Symbol {
        if let Some(index) = self.map.get(string) {
            return Symbol { index: *index };
        }

        let mut strings = self.strings.write().unwrap_or_else(|e| e.into_inner());
        // Re-check under the write lock; another thread may have won the race.
        if let Some(index) = self.map.get(string) {
            return Symbol { index: *index };
        }

        let interned: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = strings.len() as u32;
        strings.push(interned);
        self.map.insert(interned, index);

        Symbol { index }
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        let strings = self.strings.read().unwrap_or_else(|e| e.into_inner());
        strings[symbol.index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_string_same_symbol() {
        let a = Symbol::intern("fib");
        let b = Symbol::intern("fib");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_strings_differ() {
        let a = Symbol::intern("alpha");
        let b = Symbol::intern("beta");
        assert_ne!(a, b);
    }

    #[test]
    fn test_as_str_roundtrip() {
        let sym = Symbol::intern("roundtrip_name");
        assert_eq!(sym.as_str(), "roundtrip_name");
        assert_eq!(sym.to_string(), "roundtrip_name");
    }
}
