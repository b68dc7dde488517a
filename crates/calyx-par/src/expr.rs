//! Expression parsing.
//!
//! Precedence, loosest first: comparison, additive, multiplicative,
//! power, unary minus. Power is right-associative over unary operands,
//! so `-2 ^ 2` squares `-2` and `2 ^ -1` parses. Unary minus over a
//! literal folds into a negative literal at parse time.

use calyx_lex::Token;

use crate::ast::{BinOp, Lit, NodeId, NodeKind, UnOp};
use crate::{PResult, Parser};

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> PResult<NodeId> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> PResult<NodeId> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current() {
                Token::EqEq => BinOp::Eq,
                Token::NotEq => BinOp::Ne,
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = self.push_binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> PResult<NodeId> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.push_binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<NodeId> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = self.push_binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> PResult<NodeId> {
        let base = self.parse_unary()?;
        if self.check(&Token::Caret) {
            self.advance();
            // Right-associative: a ^ b ^ c is a ^ (b ^ c).
            let exponent = self.parse_power()?;
            return Ok(self.push_binary(base, BinOp::Pow, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> PResult<NodeId> {
        if self.check(&Token::Minus) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.to(self.prev_span());

            // Fold `-literal` into a negative literal.
            if let NodeKind::Lit { value } = self.ast.kind(operand) {
                let folded = match value {
                    Lit::Int(v) => Some(Lit::Int(-v)),
                    Lit::Float(v) => Some(Lit::Float(-v)),
                    _ => None,
                };
                if let Some(folded) = folded {
                    let node = self.ast.kind_mut(operand);
                    *node = NodeKind::Lit { value: folded };
                    return Ok(operand);
                }
            }

            return Ok(self.ast.push(
                NodeKind::Unary {
                    op: UnOp::Neg,
                    expr: operand,
                    caching: false,
                },
                span,
            ));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PResult<NodeId> {
        let span = self.current_span();
        match self.current().clone() {
            Token::Int(v) => {
                self.advance();
                Ok(self.ast.push(NodeKind::Lit { value: Lit::Int(v) }, span))
            },
            Token::Float(v) => {
                self.advance();
                Ok(self.ast.push(NodeKind::Lit { value: Lit::Float(v) }, span))
            },
            Token::Str(s) => {
                self.advance();
                Ok(self.ast.push(
                    NodeKind::Lit {
                        value: Lit::Str(s.into()),
                    },
                    span,
                ))
            },
            Token::True => {
                self.advance();
                Ok(self.ast.push(NodeKind::Lit { value: Lit::Bool(true) }, span))
            },
            Token::False => {
                self.advance();
                Ok(self.ast.push(
                    NodeKind::Lit {
                        value: Lit::Bool(false),
                    },
                    span,
                ))
            },
            Token::Ident(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    self.parse_call(name, span)
                } else {
                    Ok(self.ast.push(
                        NodeKind::Var {
                            name,
                            scope_depth: None,
                        },
                        span,
                    ))
                }
            },
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen, "to close parenthesized expression")?;
                Ok(expr)
            },
            other => Err(self.error_here(format!("expected expression, found '{}'", other))),
        }
    }

    fn parse_call(&mut self, name: calyx_util::Symbol, start: calyx_util::Span) -> PResult<NodeId> {
        self.expect(&Token::LParen, "in call")?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "to close argument list")?;
        let span = start.to(self.prev_span());
        Ok(self.ast.push(
            NodeKind::Call {
                name,
                args,
                scope_depth: None,
            },
            span,
        ))
    }

    fn push_binary(&mut self, left: NodeId, op: BinOp, right: NodeId) -> NodeId {
        let span = self.ast.span(left).to(self.ast.span(right));
        self.ast.push(
            NodeKind::Binary {
                left,
                op,
                right,
                caching: false,
            },
            span,
        )
    }
}
