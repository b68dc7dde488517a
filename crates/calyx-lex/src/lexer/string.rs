//! String literal lexing.
//!
//! Strings are delimited by matching single or double quotes and may not
//! span lines. There are no escape sequences.

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a string literal. Called with the cursor on the opening quote.
    pub(super) fn lex_string(&mut self) -> Token {
        let quote = self.cursor.current_char();
        self.cursor.advance();

        let content_start = self.cursor.position();
        loop {
            let c = self.cursor.current_char();
            if c == quote {
                let content = self.cursor.slice_from(content_start).to_owned();
                self.cursor.advance();
                return Token::Str(content);
            }
            if c == '\n' || self.cursor.is_at_end() {
                self.report_error("unterminated string literal".to_string());
                let content = self.cursor.slice_from(content_start).to_owned();
                return Token::Str(content);
            }
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::token::Token;
    use crate::Lexer;
    use calyx_util::Handler;

    fn lex_one(source: &str) -> Token {
        let handler = Handler::new();
        let mut lexer = Lexer::new(source, &handler);
        lexer.next_token()
    }

    #[test]
    fn test_single_and_double_quotes() {
        assert_eq!(lex_one("'hello'"), Token::Str("hello".to_string()));
        assert_eq!(lex_one("\"world\""), Token::Str("world".to_string()));
    }

    #[test]
    fn test_quote_styles_nest() {
        assert_eq!(lex_one("'say \"hi\"'"), Token::Str("say \"hi\"".to_string()));
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(lex_one("''"), Token::Str(String::new()));
    }

    #[test]
    fn test_unterminated_string() {
        let handler = Handler::new();
        let mut lexer = Lexer::new("'oops", &handler);
        assert_eq!(lexer.next_token(), Token::Str("oops".to_string()));
        assert!(handler.has_errors());
    }
}
