//! Token sequence consumed by the compilation engine.
use crate::{
    lexer::Lexer,
    tokens::{Span, Token, TokenKind},
};
use std::{error, fmt};

/// The whole source scanned up front, so the engine can look any
/// number of tokens ahead and rewind to one saved position.
pub struct TokenStream<'a> {
    tokens: Vec<Token>,
    /// Token text is sliced out of the source on demand.
    original: &'a str,
    /// Index of the current token.
    pos: usize,
    /// Position saved by [`TokenStream::checkpoint`].
    saved: Option<usize>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            tokens: lexer.into_iter().collect(),
            pos: 0,
            saved: None,
        }
    }

    #[inline]
    pub fn from_source(source_code: &'a str) -> Self {
        Self::new(Lexer::new(source_code))
    }

    /// Source text covered by a span.
    #[inline]
    pub fn span_fragment(&self, span: &Span) -> &'a str {
        span.fragment(self.original)
    }

    /// Take the current token, whatever its kind.
    ///
    /// `None` once the EOF token has been taken.
    #[inline]
    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Current token, not taken.
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    #[inline]
    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Return the token `n` positions ahead of the current one,
    /// without advancing the cursor. `lookahead(0)` is the same as `peek()`.
    #[inline]
    pub fn lookahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    #[inline]
    pub fn lookahead_kind(&self, n: usize) -> Option<TokenKind> {
        self.lookahead(n).map(|token| token.kind)
    }

    /// Span of the current token, or an empty span at the end of the source.
    pub fn current_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => Span::new(self.original.len() as u32, 0),
        }
    }

    /// Take the current token only if it's of the given kind,
    /// and report whether it was taken.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        let is_match = self.peek_kind() == Some(token_kind);
        if is_match {
            self.pos += 1;
        }
        is_match
    }

    /// Take the current token, which must be of the given kind.
    ///
    /// On a mismatch nothing is taken, and the error
    /// names both kinds and the position.
    pub fn consume(&mut self, token_kind: TokenKind) -> Result<Token, TokenError> {
        match self.peek() {
            Some(token) if token.kind == token_kind => {
                let token = *token;
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(TokenError::Mismatch {
                expected: token_kind,
                encountered: token.kind,
                span: token.span,
            }),
            None => Err(TokenError::EndOfSource),
        }
    }

    /// Remember the current position.
    ///
    /// There is only one saved position. Checkpoints are not nested.
    pub fn checkpoint(&mut self) {
        debug_assert!(self.saved.is_none(), "token stream checkpoints are not nested");
        self.saved = Some(self.pos);
    }

    /// Restore the position remembered by the last checkpoint,
    /// and release the checkpoint.
    pub fn rollback(&mut self) {
        if let Some(pos) = self.saved.take() {
            self.pos = pos;
        }
    }
}

/// The token stream didn't hold the token the grammar requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Mismatch {
        expected: TokenKind,
        encountered: TokenKind,
        span: Span,
    },
    EndOfSource,
}

impl error::Error for TokenError {}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenError as E;
        match self {
            E::Mismatch {
                expected,
                encountered,
                ..
            } => write!(
                f,
                "expected '{}', found '{}'",
                expected, encountered
            ),
            E::EndOfSource => write!(f, "unexpected end of source code"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokens::Keyword;
    use TokenKind as TK;

    #[test]
    fn test_peek_does_not_advance() {
        let mut stream = TokenStream::from_source("let x;");
        assert_eq!(stream.peek_kind(), Some(TK::Keyword(Keyword::Let)));
        assert_eq!(stream.peek_kind(), Some(TK::Keyword(Keyword::Let)));
        assert_eq!(stream.lookahead_kind(1), Some(TK::Ident));
        assert_eq!(stream.lookahead_kind(2), Some(TK::Semicolon));
        assert_eq!(stream.lookahead_kind(3), Some(TK::EOF));
        assert_eq!(stream.lookahead_kind(4), None);

        let token = stream.next_token().unwrap();
        assert_eq!(token.kind, TK::Keyword(Keyword::Let));
        assert_eq!(stream.peek_kind(), Some(TK::Ident));
    }

    #[test]
    fn test_consume_mismatch_keeps_position() {
        let mut stream = TokenStream::from_source("x = 1");
        let err = stream.consume(TK::Semicolon).unwrap_err();
        assert_eq!(
            err,
            TokenError::Mismatch {
                expected: TK::Semicolon,
                encountered: TK::Ident,
                span: Span::new(0, 1),
            }
        );
        let ident = stream.consume(TK::Ident).unwrap();
        assert_eq!(stream.span_fragment(&ident.span), "x");
        assert!(stream.match_token(TK::Eq));
        assert!(!stream.match_token(TK::Eq));
    }

    #[test]
    fn test_end_of_source() {
        let mut stream = TokenStream::from_source("");
        assert_eq!(stream.consume(TK::EOF).unwrap().kind, TK::EOF);
        assert!(stream.next_token().is_none());
        assert_eq!(stream.consume(TK::Semicolon), Err(TokenError::EndOfSource));
        assert_eq!(stream.current_span(), Span::new(0, 0));
    }

    #[test]
    fn test_checkpoint_rollback() {
        let mut stream = TokenStream::from_source("a , b , c");
        stream.next_token();
        stream.checkpoint();
        let saved = stream.peek().copied();
        stream.next_token();
        stream.next_token();
        assert_eq!(stream.peek_kind(), Some(TK::Comma));
        stream.rollback();
        assert_eq!(stream.peek().copied(), saved);
        assert_eq!(stream.peek_kind(), Some(TK::Comma));
        assert_eq!(stream.current_span(), Span::new(2, 1));

        // Checkpoint is released after rolling back.
        stream.next_token();
        stream.rollback();
        assert_eq!(stream.peek_kind(), Some(TK::Ident));
        assert_eq!(stream.current_span(), Span::new(4, 1));
    }
}
