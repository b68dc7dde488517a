//! Identifier and keyword lexing.

use calyx_util::Symbol;

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword.
    ///
    /// Called with the cursor on `[A-Za-z_]`; consumes `[A-Za-z_0-9]*`.
    pub(super) fn lex_identifier(&mut self) -> Token {
        let start = self.cursor.position();

        loop {
            let c = self.cursor.current_char();
            if c.is_ascii_alphanumeric() || c == '_' {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let text = self.cursor.slice_from(start);
        match text {
            "if" => Token::If,
            "while" => Token::While,
            "for" => Token::For,
            "var" => Token::Var,
            "print" => Token::Print,
            "return" => Token::Return,
            "def" => Token::Def,
            "assert" => Token::Assert,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Ident(Symbol::intern(text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::token::Token;
    use crate::Lexer;
    use calyx_util::{Handler, Symbol};

    fn lex_one(source: &str) -> Token {
        let handler = Handler::new();
        let mut lexer = Lexer::new(source, &handler);
        lexer.next_token()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(lex_one("while"), Token::While);
        assert_eq!(lex_one("def"), Token::Def);
        assert_eq!(lex_one("assert"), Token::Assert);
        assert_eq!(lex_one("true"), Token::True);
        assert_eq!(lex_one("false"), Token::False);
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(lex_one("fib"), Token::Ident(Symbol::intern("fib")));
        assert_eq!(lex_one("_tmp2"), Token::Ident(Symbol::intern("_tmp2")));
        // Keyword prefix does not make a keyword.
        assert_eq!(lex_one("iffy"), Token::Ident(Symbol::intern("iffy")));
    }
}
