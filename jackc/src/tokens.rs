//! Tokens

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    // Simple
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Semicolon,    // ;
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Amp,          // &
    Pipe,         // |
    Less,         // <
    Greater,      // >
    Eq,           // =
    Tilde,        // ~

    // ------------------------------------------------------------------------
    // Complex
    Ident,
    /// Reserved identifiers
    Keyword(Keyword),
    /// Integer constant
    Number,
    /// String constant, including both double quotes.
    String,

    // ------------------------------------------------------------------------
    // Special
    /// Unsupported token which should be treated as an error, probably
    Unknown,
    /// End-of-file
    EOF,
}

impl TokenKind {
    #[inline]
    pub fn is_unary_op(&self) -> bool {
        matches!(self, TokenKind::Minus | TokenKind::Tilde)
    }

    #[inline]
    pub fn is_keyword_constant(&self) -> bool {
        matches!(
            self,
            TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::Null | Keyword::This)
        )
    }

    /// Whether a token of this kind can be the first token of a term,
    /// and by extension of an expression.
    pub fn starts_term(&self) -> bool {
        matches!(
            self,
            TokenKind::Number | TokenKind::String | TokenKind::Ident | TokenKind::LeftParen
        ) || self.is_unary_op()
            || self.is_keyword_constant()
    }
}

impl fmt::Display for TokenKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind as TK;
        match self {
            TK::LeftBrace    => write!(f, "{{"),
            TK::RightBrace   => write!(f, "}}"),
            TK::LeftParen    => write!(f, "("),
            TK::RightParen   => write!(f, ")"),
            TK::LeftBracket  => write!(f, "["),
            TK::RightBracket => write!(f, "]"),
            TK::Dot          => write!(f, "."),
            TK::Comma        => write!(f, ","),
            TK::Semicolon    => write!(f, ";"),
            TK::Plus         => write!(f, "+"),
            TK::Minus        => write!(f, "-"),
            TK::Star         => write!(f, "*"),
            TK::Slash        => write!(f, "/"),
            TK::Amp          => write!(f, "&"),
            TK::Pipe         => write!(f, "|"),
            TK::Less         => write!(f, "<"),
            TK::Greater      => write!(f, ">"),
            TK::Eq           => write!(f, "="),
            TK::Tilde        => write!(f, "~"),
            TK::Ident        => write!(f, "identifier"),
            TK::Keyword(kw)  => write!(f, "{kw}"),
            TK::Number       => write!(f, "integer constant"),
            TK::String       => write!(f, "string constant"),
            TK::Unknown      => write!(f, "unknown"),
            TK::EOF          => write!(f, "end-of-file"),
        }
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,

    // ------------------------------------------------------------------------
    // Types
    Int,
    Char,
    Boolean,
    Void,

    // ------------------------------------------------------------------------
    // Constants
    True,
    False,
    Null,
    This,

    // ------------------------------------------------------------------------
    // Statements
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.index as usize + self.size as usize)]
    }

    /// One-based line and column of the span's first character.
    pub fn line_column(&self, text: &str) -> (usize, usize) {
        let start = (self.index as usize).min(text.len());
        let before = &text[..start];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }

    /// The full source line the span starts on, without its line ending,
    /// and the span of that line.
    pub fn surrounding_line<'a>(&self, text: &'a str) -> (&'a str, Span) {
        let index = (self.index as usize).min(text.len());

        let start = text[..index].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = text[index..]
            .find('\n')
            .map(|i| index + i)
            .unwrap_or(text.len());
        let line = text[start..end].trim_end_matches('\r');

        (line, Span::new(start as u32, line.len() as u32))
    }
}
