//! Core lexer implementation.
//!
//! The main dispatch lives here; number, string and identifier lexing are
//! split into their own modules.

mod ident;
mod number;
mod string;

use calyx_util::{Handler, Span};

use crate::cursor::Cursor;
use crate::token::Token;

/// Lexer for the Calyx language.
///
/// Transforms source text into a stream of tokens, skipping whitespace and
/// `#` line comments. Lexical errors are reported through the diagnostic
/// handler; the lexer keeps going so a run can surface several of them.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    cursor: Cursor<'a>,

    /// Error handler for reporting lexical errors.
    handler: &'a Handler,

    /// Starting position of the current token (byte offset).
    token_start: usize,

    /// Line number where the current token starts (1-based).
    token_start_line: u32,

    /// Column number where the current token starts (1-based).
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source code.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Returns the next token from the source code.
    ///
    /// This is the main entry point for tokenization. It skips whitespace
    /// and comments, then dispatches on the current character. Returns
    /// `Token::Eof` at end of input.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::Eof;
        }

        match self.cursor.current_char() {
            '(' => {
                self.cursor.advance();
                Token::LParen
            },
            ')' => {
                self.cursor.advance();
                Token::RParen
            },
            '{' => {
                self.cursor.advance();
                Token::LBrace
            },
            '}' => {
                self.cursor.advance();
                Token::RBrace
            },
            ':' => {
                self.cursor.advance();
                Token::Colon
            },
            ',' => {
                self.cursor.advance();
                Token::Comma
            },
            ';' => {
                self.cursor.advance();
                Token::Semicolon
            },
            '+' => {
                self.cursor.advance();
                Token::Plus
            },
            '-' => {
                self.cursor.advance();
                Token::Minus
            },
            '*' => {
                self.cursor.advance();
                if self.cursor.current_char() == '*' {
                    // `**` is the surface power spelling; `^` internally.
                    self.cursor.advance();
                    Token::Caret
                } else {
                    Token::Star
                }
            },
            '/' => {
                self.cursor.advance();
                Token::Slash
            },
            '%' => {
                self.cursor.advance();
                Token::Percent
            },
            '^' => {
                self.cursor.advance();
                Token::Caret
            },
            '=' => {
                self.cursor.advance();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    Token::EqEq
                } else {
                    Token::Eq
                }
            },
            '!' => {
                self.cursor.advance();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    Token::NotEq
                } else {
                    self.report_error("expected '=' after '!'".to_string());
                    Token::Invalid('!')
                }
            },
            '<' => {
                self.cursor.advance();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    Token::Le
                } else {
                    Token::Lt
                }
            },
            '>' => {
                self.cursor.advance();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    Token::Ge
                } else {
                    Token::Gt
                }
            },
            '\'' | '"' => self.lex_string(),
            '.' if self.cursor.peek_char(1).is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(),
            c => {
                self.report_error(format!("unexpected character '{}'", c));
                self.cursor.advance();
                Token::Invalid(c)
            },
        }
    }

    /// Span of the most recently returned token.
    pub fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Collects the whole token stream with spans, up to and including Eof.
    pub fn tokenize(mut self) -> Vec<(Token, Span)> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let span = self.token_span();
            let done = token == Token::Eof;
            tokens.push((token, span));
            if done {
                break;
            }
        }
        tokens
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if c.is_whitespace() {
                self.cursor.advance();
            } else if c == '#' {
                // Line comment runs to end of line.
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Reports a lexical error at the current token position.
    fn report_error(&self, message: String) {
        self.handler.error(message, self.token_span());
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token == Token::Eof {
            None
        } else {
            Some(token)
        }
    }
}
