//! calyx-util - Foundation types shared by every pipeline phase.
//!
//! This crate provides the small infrastructure the rest of the interpreter
//! is built on: source spans, interned symbols, typed index vectors and the
//! diagnostic handler. None of it knows anything about the Calyx language
//! itself.

pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
pub use symbol::Symbol;

// Re-export commonly used hash collections
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
