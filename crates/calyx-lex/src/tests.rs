//! Whole-stream lexer tests.

use calyx_util::{Handler, Symbol};
use proptest::prelude::*;

use crate::{Lexer, Token};

fn lex(source: &str) -> Vec<Token> {
    let handler = Handler::new();
    let tokens: Vec<Token> = Lexer::new(source, &handler).collect();
    assert!(
        !handler.has_errors(),
        "unexpected lex errors: {:?}",
        handler.diagnostics()
    );
    tokens
}

#[test]
fn test_declaration_statement() {
    let tokens = lex("var x : int = 1;");
    assert_eq!(
        tokens,
        vec![
            Token::Var,
            Token::Ident(Symbol::intern("x")),
            Token::Colon,
            Token::Ident(Symbol::intern("int")),
            Token::Eq,
            Token::Int(1),
            Token::Semicolon,
        ]
    );
}

#[test]
fn test_power_spellings() {
    assert_eq!(lex("x ** 2"), lex("x ^ 2"));
    // `**` must not lex as two stars.
    assert_eq!(
        lex("2 ** 3"),
        vec![Token::Int(2), Token::Caret, Token::Int(3)]
    );
}

#[test]
fn test_adjacent_minus_is_operator() {
    // `x-2` must stay an infix subtraction, not an int literal.
    let tokens = lex("x-2");
    assert_eq!(
        tokens,
        vec![
            Token::Ident(Symbol::intern("x")),
            Token::Minus,
            Token::Int(2),
        ]
    );
}

#[test]
fn test_comparison_operators() {
    let tokens = lex("a <= b >= c == d != e < f > g");
    let ops: Vec<&Token> = tokens
        .iter()
        .filter(|t| !matches!(t, Token::Ident(_)))
        .collect();
    assert_eq!(
        ops,
        vec![
            &Token::Le,
            &Token::Ge,
            &Token::EqEq,
            &Token::NotEq,
            &Token::Lt,
            &Token::Gt,
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let tokens = lex("print x; # trailing words == ** '\nprint y");
    assert_eq!(
        tokens,
        vec![
            Token::Print,
            Token::Ident(Symbol::intern("x")),
            Token::Semicolon,
            Token::Print,
            Token::Ident(Symbol::intern("y")),
        ]
    );
}

#[test]
fn test_spans_track_lines() {
    let handler = Handler::new();
    let mut lexer = Lexer::new("var\n  x", &handler);
    assert_eq!(lexer.next_token(), Token::Var);
    assert_eq!(lexer.token_span().line, 1);
    assert_eq!(lexer.next_token(), Token::Ident(Symbol::intern("x")));
    let span = lexer.token_span();
    assert_eq!(span.line, 2);
    assert_eq!(span.column, 3);
}

#[test]
fn test_invalid_character_reported() {
    let handler = Handler::new();
    let tokens: Vec<Token> = Lexer::new("var x @ 1", &handler).collect();
    assert!(tokens.contains(&Token::Invalid('@')));
    assert!(handler.has_errors());
}

proptest! {
    #[test]
    fn prop_identifiers_lex_whole(name in "[a-zA-Z_][a-zA-Z_0-9]{0,20}") {
        prop_assume!(!matches!(
            name.as_str(),
            "if" | "while" | "for" | "var" | "print" | "return" | "def"
                | "assert" | "true" | "false"
        ));
        let tokens = lex(&name);
        prop_assert_eq!(tokens, vec![Token::Ident(Symbol::intern(&name))]);
    }

    #[test]
    fn prop_integers_roundtrip(value in 0i64..=i64::MAX) {
        let tokens = lex(&value.to_string());
        prop_assert_eq!(tokens, vec![Token::Int(value)]);
    }

    #[test]
    fn prop_strings_roundtrip(content in "[a-zA-Z0-9 ,.!?]{0,30}") {
        let source = format!("'{}'", content);
        let tokens = lex(&source);
        prop_assert_eq!(tokens, vec![Token::Str(content)]);
    }
}
