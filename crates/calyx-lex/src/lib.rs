//! calyx-lex - Lexical analyzer for the Calyx language.
//!
//! Transforms source text into a stream of [`Token`]s. The surface is
//! small: integer/float/bool/string literals, identifiers and keywords,
//! arithmetic/comparison operators (with `**` as the power spelling),
//! punctuation and `#` line comments.

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::Token;

#[cfg(test)]
mod tests;
