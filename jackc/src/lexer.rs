//! Source text to tokens.
use crate::{
    cursor::{Cursor, EOF_CHAR},
    tokens::{Keyword, Span, Token, TokenKind},
};

/// On-demand scanner producing one token per call.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    source: &'a str,
    /// Byte offset where the token being scanned begins.
    token_start: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        let mut cursor = Cursor::new(source_code);

        // The cursor starts before the first character.
        // Step onto it so `current()` is the first token's start.
        cursor.next();

        Self {
            token_start: cursor.offset(),
            cursor,
            source: source_code,
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.source
    }

    /// Scan the next token, skipping whitespace and comments before it.
    ///
    /// Every call starts with the cursor on the first unconsumed
    /// character, and ends with the cursor on the character just past
    /// the token it returns. Past the end of the source, every call
    /// returns [`TokenKind::EOF`].
    pub fn next_token(&mut self) -> Token {
        use TokenKind as TK;

        self.erase_trivia();
        self.token_start = self.cursor.offset();

        let kind = match self.cursor.current() {
            '{' => TK::LeftBrace,
            '}' => TK::RightBrace,
            '(' => TK::LeftParen,
            ')' => TK::RightParen,
            '[' => TK::LeftBracket,
            ']' => TK::RightBracket,
            '.' => TK::Dot,
            ',' => TK::Comma,
            ';' => TK::Semicolon,
            '+' => TK::Plus,
            '-' => TK::Minus,
            '*' => TK::Star,
            '/' => TK::Slash,
            '&' => TK::Amp,
            '|' => TK::Pipe,
            '<' => TK::Less,
            '>' => TK::Greater,
            '=' => TK::Eq,
            '~' => TK::Tilde,
            '"' => return self.scan_string(),
            c if is_letter(c) => return self.scan_word(),
            c if is_digit(c) => return self.scan_number(),
            // A NUL inside the source is not the end.
            EOF_CHAR if self.cursor.at_end() => TK::EOF,
            _ => TK::Unknown,
        };

        self.finish(kind)
    }

    /// Span from the token start up to and including the cursor's character.
    fn current_span(&self) -> Span {
        let end = self.cursor.peek_offset();
        debug_assert!(end >= self.token_start);

        // Zero sized at the end of the source.
        Span::new(self.token_start, end - self.token_start)
    }

    /// Complete the token under scan, and step past its last character.
    fn finish(&mut self, kind: TokenKind) -> Token {
        let span = self.current_span();
        self.cursor.next_char();
        Token { span, kind }
    }
}

impl<'a> Lexer<'a> {
    fn erase_trivia(&mut self) {
        loop {
            while is_whitespace(self.cursor.current()) {
                self.cursor.next_char();
            }

            match (self.cursor.current(), self.cursor.peek()) {
                ('/', '/') => self.erase_line_comment(),
                ('/', '*') => self.erase_block_comment(),
                _ => return,
            }
        }
    }

    /// Stops on the line ending, which is whitespace.
    fn erase_line_comment(&mut self) {
        while !is_newline(self.cursor.current()) && !self.cursor.at_end() {
            self.cursor.next_char();
        }
    }

    /// Erase a `/* */` or `/** */` comment, which may span multiple lines.
    ///
    /// An unterminated comment runs to the end of the source.
    fn erase_block_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');

        // Step over `/*` first, so `/*/` doesn't close itself.
        self.cursor.next_char();
        self.cursor.next_char();

        while !self.cursor.at_end() {
            let closing = self.cursor.current() == '*' && self.cursor.peek() == '/';
            self.cursor.next_char();
            if closing {
                self.cursor.next_char();
                return;
            }
        }
    }

    /// Identifier, or keyword when the whole word is reserved.
    fn scan_word(&mut self) -> Token {
        while is_letter_or_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        let word = self.current_span().fragment(self.source);
        let kind = Keyword::parse(word)
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Ident);

        self.finish(kind)
    }

    fn scan_number(&mut self) -> Token {
        while is_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        self.finish(TokenKind::Number)
    }

    /// String constant, with the span covering both quotes.
    ///
    /// The text can't contain a double quote or a line break. Without
    /// its closing quote on the same line, the string is [`TokenKind::Unknown`].
    fn scan_string(&mut self) -> Token {
        debug_assert_eq!(self.cursor.current(), '"');

        loop {
            let next = self.cursor.peek();
            let past_end = next == EOF_CHAR && self.cursor.peek_offset() as usize >= self.source.len();

            if next == '"' {
                self.cursor.next();
                return self.finish(TokenKind::String);
            } else if is_newline(next) || past_end {
                return self.finish(TokenKind::Unknown);
            }

            self.cursor.next();
        }
    }
}

fn is_whitespace(c: char) -> bool {
    c.is_ascii_whitespace() || matches!(c, '\u{00A0}' | '\u{FEFF}')
}

fn is_newline(c: char) -> bool {
    c == '\n' || c == '\r'
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_letter_or_digit(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scan the whole source, up to and including the single EOF token.
pub fn tokenize(source_code: &str) -> Vec<Token> {
    Lexer::new(source_code).into_iter().collect()
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Token;
    type IntoIter = TokenIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        TokenIter {
            lexer: self,
            finished: false,
        }
    }
}

/// Yields tokens until, and including, the EOF token.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct TokenIter<'a> {
    lexer: Lexer<'a>,
    finished: bool,
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        let token = self.lexer.next_token();
        self.finished = token.kind == TokenKind::EOF;
        Some(token)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use TokenKind as TK;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_let_statement() {
        const CODE: &str = "let a[i] = x + 1;";
        let tokens = tokenize(CODE);

        let kinds = tokens.iter().map(|t| t.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                TK::Keyword(Keyword::Let),
                TK::Ident,
                TK::LeftBracket,
                TK::Ident,
                TK::RightBracket,
                TK::Eq,
                TK::Ident,
                TK::Plus,
                TK::Number,
                TK::Semicolon,
                TK::EOF,
            ]
        );

        let fragments = tokens
            .iter()
            .map(|t| t.span.fragment(CODE))
            .collect::<Vec<_>>();
        assert_eq!(fragments, vec!["let", "a", "[", "i", "]", "=", "x", "+", "1", ";", ""]);
    }

    #[test]
    fn test_lex_comments() {
        const CODE: &str = "// line\n/** doc\n * block */ class /* inline */ Main // tail";
        assert_eq!(kinds(CODE), vec![TK::Keyword(Keyword::Class), TK::Ident, TK::EOF]);
    }

    #[test]
    fn test_lex_unterminated_block_comment() {
        assert_eq!(kinds("do /* never closed"), vec![TK::Keyword(Keyword::Do), TK::EOF]);
    }

    #[test]
    fn test_lex_string() {
        const CODE: &str = r#"do Output.printString("hi there");"#;
        let tokens = tokenize(CODE);
        let string = tokens.iter().find(|t| t.kind == TK::String).expect("string token");
        assert_eq!(string.span.fragment(CODE), "\"hi there\"");
    }

    #[test]
    fn test_lex_unterminated_string() {
        assert_eq!(kinds("\"abc\nx"), vec![TK::Unknown, TK::Ident, TK::EOF]);
        assert_eq!(kinds("\"abc"), vec![TK::Unknown, TK::EOF]);
    }

    #[test]
    fn test_lex_unknown_character() {
        assert_eq!(kinds("x # y"), vec![TK::Ident, TK::Unknown, TK::Ident, TK::EOF]);
    }

    #[test]
    fn test_lex_keyword_prefix_is_ident() {
        assert_eq!(kinds("classy do_it"), vec![TK::Ident, TK::Ident, TK::EOF]);
    }

    #[test]
    fn test_lex_single_eof() {
        assert_eq!(kinds(""), vec![TK::EOF]);
        assert_eq!(kinds("  \n\t "), vec![TK::EOF]);
    }
}
