//! calyx-par - Parser and AST for the Calyx language.
//!
//! A hand-written recursive-descent parser producing the arena AST in
//! [`ast`]. Parsing recovers from syntax errors at statement boundaries:
//! the offending statement is skipped, a diagnostic is recorded, and
//! parsing resumes, so one run can report several errors.

pub mod ast;
mod dump;
mod expr;
mod stmt;

use calyx_lex::{Lexer, Token};
use calyx_util::{Handler, Span};

pub use ast::{Ast, BinOp, Lit, Node, NodeId, NodeKind, Ty, UnOp};

/// Marker for a syntax error; the diagnostic has already been reported
/// through the handler by the time this is returned.
pub(crate) struct ParseError;

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Parser for the Calyx language.
pub struct Parser<'a> {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    handler: &'a Handler,
    /// Span of the most recently consumed token.
    prev_span: Span,
    pub(crate) ast: Ast,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `source`, reporting through `handler`.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        let tokens = Lexer::new(source, handler).tokenize();
        Self {
            tokens,
            pos: 0,
            handler,
            prev_span: Span::DUMMY,
            ast: Ast::new(),
        }
    }

    /// Parses a whole program.
    ///
    /// Always returns an `Ast`; whether it is runnable is decided by
    /// `handler.has_errors()`.
    pub fn parse(mut self) -> Ast {
        loop {
            while self.eat(&Token::Semicolon) {}
            if self.check(&Token::Eof) {
                break;
            }
            let before = self.pos;
            match self.parse_statement() {
                Ok((id, needs_semi)) => {
                    self.ast.roots.push(id);
                    if needs_semi {
                        self.expect_statement_end();
                    }
                },
                Err(ParseError) => self.synchronize(),
            }
            // A stray token (e.g. an unmatched '}') can fail without
            // consuming anything; force progress.
            if self.pos == before && !self.check(&Token::Eof) && self.handler.has_errors() {
                self.advance();
            }
        }
        self.ast
    }

    // Token stream helpers -------------------------------------------------

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    pub(crate) fn prev_span(&self) -> Span {
        self.prev_span
    }

    pub(crate) fn peek(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].0
    }

    pub(crate) fn advance(&mut self) -> Token {
        let (token, span) = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        self.prev_span = span;
        token
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    /// Consume the current token if it equals `token`.
    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `token` or report an error.
    pub(crate) fn expect(&mut self, token: &Token, context: &str) -> PResult<Span> {
        if self.check(token) {
            self.advance();
            Ok(self.prev_span)
        } else {
            Err(self.error_here(format!(
                "expected '{}' {}, found '{}'",
                token,
                context,
                self.current()
            )))
        }
    }

    /// Consume an identifier or report an error.
    pub(crate) fn expect_ident(&mut self, context: &str) -> PResult<calyx_util::Symbol> {
        match self.current() {
            Token::Ident(sym) => {
                let sym = *sym;
                self.advance();
                Ok(sym)
            },
            other => Err(self.error_here(format!(
                "expected identifier {}, found '{}'",
                context, other
            ))),
        }
    }

    /// Report an error at the current token.
    pub(crate) fn error_here(&self, message: String) -> ParseError {
        self.handler.error(message, self.current_span());
        ParseError
    }

    /// After a simple statement, require `;`, `}` or end of input.
    pub(crate) fn expect_statement_end(&mut self) {
        if !self.check(&Token::Semicolon)
            && !self.check(&Token::RBrace)
            && !self.check(&Token::Eof)
        {
            self.error_here(format!(
                "expected ';' after statement, found '{}'",
                self.current()
            ));
            self.synchronize();
        }
    }

    /// Skip to the next statement boundary after a syntax error.
    ///
    /// Consumes up to and including the next `;` at the current brace
    /// depth, or stops before a closing `}` (the enclosing block consumes
    /// it) or at end of input.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::Eof => return,
                Token::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                },
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                },
                Token::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                },
                _ => {
                    self.advance();
                },
            }
        }
    }
}

/// Convenience: lex and parse `source` in one call.
pub fn parse_program(source: &str, handler: &Handler) -> Ast {
    Parser::new(source, handler).parse()
}
