//! Number literal lexing.
//!
//! Handles decimal integers and the float shapes `12.`, `12.5` and `.5`.
//! A leading minus is never part of the literal; unary minus is folded by
//! the parser.

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a number literal.
    ///
    /// Called with the cursor on a digit or on a `.` followed by a digit.
    pub(super) fn lex_number(&mut self) -> Token {
        let start = self.cursor.position();

        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        // `12.`, `12.5` and `.5` are floats; a bare `.` never reaches here.
        let is_float = self.cursor.current_char() == '.';

        if is_float {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }

            let text = self.cursor.slice_from(start);
            match text.parse::<f64>() {
                Ok(value) => Token::Float(value),
                Err(e) => {
                    self.report_error(format!("invalid float literal '{}': {}", text, e));
                    Token::Float(0.0)
                },
            }
        } else {
            let text = self.cursor.slice_from(start);
            match text.parse::<i64>() {
                Ok(value) => Token::Int(value),
                Err(e) => {
                    self.report_error(format!("integer literal overflow: {}", e));
                    Token::Int(0)
                },
            }
        }
    }
}
