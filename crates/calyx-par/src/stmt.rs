//! Statement parsing.

use calyx_lex::Token;

use crate::ast::{NodeId, NodeKind, Ty};
use crate::{PResult, Parser};

impl<'a> Parser<'a> {
    /// Parses one statement.
    ///
    /// Returns the node and whether the statement must be followed by a
    /// `;` (block-introducing statements end with `}` and need none).
    pub(crate) fn parse_statement(&mut self) -> PResult<(NodeId, bool)> {
        match self.current() {
            Token::LBrace => Ok((self.parse_block()?, false)),
            Token::Def => Ok((self.parse_fn_def()?, false)),
            Token::If => Ok((self.parse_if()?, false)),
            Token::While => Ok((self.parse_while()?, false)),
            Token::For => Ok((self.parse_for()?, false)),
            _ => Ok((self.parse_simple_statement()?, true)),
        }
    }

    /// Parses a statement from the simple subset (no block structure):
    /// declaration, assignment, print, assert, return or bare expression.
    pub(crate) fn parse_simple_statement(&mut self) -> PResult<NodeId> {
        match self.current() {
            Token::Var => self.parse_var_decl(),
            Token::Print => {
                let start = self.current_span();
                self.advance();
                let expr = self.parse_expr()?;
                let span = start.to(self.prev_span());
                Ok(self.ast.push(NodeKind::Print { expr }, span))
            },
            Token::Assert => {
                let start = self.current_span();
                self.advance();
                let expr = self.parse_expr()?;
                let span = start.to(self.prev_span());
                Ok(self.ast.push(NodeKind::Assert { expr }, span))
            },
            Token::Return => {
                let start = self.current_span();
                self.advance();
                let expr = self.parse_expr()?;
                let span = start.to(self.prev_span());
                Ok(self.ast.push(NodeKind::Return { expr }, span))
            },
            Token::Ident(_) if matches!(self.peek(1), Token::Eq) => self.parse_assignment(),
            _ => self.parse_expr(),
        }
    }

    /// `{ statements }`
    pub(crate) fn parse_block(&mut self) -> PResult<NodeId> {
        let start = self.expect(&Token::LBrace, "to open block")?;
        let mut statements = Vec::new();
        loop {
            while self.eat(&Token::Semicolon) {}
            if self.check(&Token::RBrace) || self.check(&Token::Eof) {
                break;
            }
            match self.parse_statement() {
                Ok((id, needs_semi)) => {
                    statements.push(id);
                    if needs_semi {
                        self.expect_statement_end();
                    }
                },
                Err(crate::ParseError) => self.synchronize(),
            }
        }
        let end = self.expect(&Token::RBrace, "to close block")?;
        Ok(self.ast.push(NodeKind::Block { statements }, start.to(end)))
    }

    /// `def name(params) : ty { body }`. The return type is optional
    /// and defaults to unit.
    fn parse_fn_def(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        self.advance(); // def
        let name = self.expect_ident("after 'def'")?;
        self.expect(&Token::LParen, "after function name")?;

        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let param_start = self.current_span();
                let param_name = self.expect_ident("in parameter list")?;
                self.expect(&Token::Colon, "after parameter name")?;
                let ty = self.parse_type()?;
                let span = param_start.to(self.prev_span());
                params.push(self.ast.push(NodeKind::Param { name: param_name, ty }, span));
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "after parameters")?;

        let ret_ty = if self.eat(&Token::Colon) {
            self.parse_type()?
        } else {
            Ty::Unit
        };

        let body = self.parse_block()?;
        let span = start.to(self.prev_span());
        Ok(self.ast.push(
            NodeKind::FnDef {
                name,
                params,
                ret_ty,
                body,
            },
            span,
        ))
    }

    /// `var name : ty` with optional `= init`.
    fn parse_var_decl(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        self.advance(); // var
        let name = self.expect_ident("after 'var'")?;
        self.expect(&Token::Colon, "after variable name")?;
        let ty = self.parse_type()?;

        let init = if self.eat(&Token::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let span = start.to(self.prev_span());
        Ok(self.ast.push(NodeKind::VarDecl { name, ty, init }, span))
    }

    /// `name = value`
    fn parse_assignment(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        let name = self.expect_ident("in assignment")?;
        self.expect(&Token::Eq, "in assignment")?;
        let value = self.parse_expr()?;
        let span = start.to(self.prev_span());
        Ok(self.ast.push(
            NodeKind::Assign {
                name,
                value,
                scope_depth: None,
            },
            span,
        ))
    }

    /// `if (condition) { body }`
    fn parse_if(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        self.advance(); // if
        self.expect(&Token::LParen, "after 'if'")?;
        let condition = self.parse_expr()?;
        self.expect(&Token::RParen, "after condition")?;
        let body = self.parse_block()?;
        let span = start.to(self.prev_span());
        Ok(self.ast.push(NodeKind::If { condition, body }, span))
    }

    /// `while (condition) { body }`
    fn parse_while(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        self.advance(); // while
        self.expect(&Token::LParen, "after 'while'")?;
        let condition = self.parse_expr()?;
        self.expect(&Token::RParen, "after condition")?;
        let body = self.parse_block()?;
        let span = start.to(self.prev_span());
        Ok(self.ast.push(NodeKind::While { condition, body }, span))
    }

    /// `for (initializer; condition; increment) { body }`
    fn parse_for(&mut self) -> PResult<NodeId> {
        let start = self.current_span();
        self.advance(); // for
        self.expect(&Token::LParen, "after 'for'")?;
        let initializer = self.parse_simple_statement()?;
        self.expect(&Token::Semicolon, "after for-initializer")?;
        let condition = self.parse_expr()?;
        self.expect(&Token::Semicolon, "after for-condition")?;
        let increment = self.parse_simple_statement()?;
        self.expect(&Token::RParen, "after for-increment")?;
        let body = self.parse_block()?;
        let span = start.to(self.prev_span());
        Ok(self.ast.push(
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            },
            span,
        ))
    }

    /// A surface type name.
    pub(crate) fn parse_type(&mut self) -> PResult<Ty> {
        let name = self.expect_ident("as type name")?;
        match Ty::from_name(name.as_str()) {
            Some(ty) => Ok(ty),
            None => Err(self.error_here(format!("unknown type '{}'", name))),
        }
    }
}
