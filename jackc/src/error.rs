//! Result and errors.
use crate::{token_stream::TokenError, tokens::Span};
use smol_str::SmolStr;
use std::{
    error,
    fmt::{self, Display, Formatter},
};

pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Failure that stops compilation of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Expected one specific token kind.
    Token(TokenError),
    /// The current token can't start or continue the production being parsed.
    Unexpected { message: String, span: Span },
    /// Identifier used as a variable, but not declared in any enclosing scope.
    UndefinedSymbol { name: SmolStr, span: Span },
    /// Name declared twice in the same scope.
    SymbolExists { name: SmolStr, span: Span },
    /// Integer constant doesn't fit the 16-bit machine word.
    IntegerOverflow { span: Span },
    /// A per-class or per-subroutine counter ran out of 16-bit values.
    LimitExceeded { message: String, span: Span },
}

impl CompileError {
    pub fn unexpected(message: impl ToString, span: Span) -> Self {
        CompileError::Unexpected {
            message: message.to_string(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Token(TokenError::Mismatch { span, .. }) => Some(*span),
            CompileError::Token(TokenError::EndOfSource) => None,
            CompileError::Unexpected { span, .. }
            | CompileError::UndefinedSymbol { span, .. }
            | CompileError::SymbolExists { span, .. }
            | CompileError::IntegerOverflow { span }
            | CompileError::LimitExceeded { span, .. } => Some(*span),
        }
    }

    /// Syntax errors are failures to match the grammar, as opposed
    /// to failures to resolve names or values in well-formed code.
    pub fn is_syntax(&self) -> bool {
        matches!(self, CompileError::Token(_) | CompileError::Unexpected { .. })
    }

    /// Format the error with its position, and the offending
    /// source line with a marker under the error span.
    pub fn render(&self, source: &str) -> String {
        let span = self
            .span()
            .unwrap_or_else(|| Span::new(source.len() as u32, 0));
        let (line_no, column) = span.line_column(source);
        let (line, line_span) = span.surrounding_line(source);

        let offset = (span.index.saturating_sub(line_span.index) as usize).min(line.len());
        let pad = line[..offset].chars().count();
        let width = span
            .fragment(source)
            .lines()
            .next()
            .map(|s| s.chars().count())
            .unwrap_or(0)
            .max(1);

        format!(
            "{line_no}:{column}: {self}\n{line}\n{}{}",
            " ".repeat(pad),
            "^".repeat(width)
        )
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(err) => Display::fmt(err, f),
            Self::Unexpected { message, .. } => write!(f, "{}", message),
            Self::UndefinedSymbol { name, .. } => write!(f, "symbol '{}' does not exist", name),
            Self::SymbolExists { name, .. } => write!(f, "symbol '{}' already defined", name),
            Self::IntegerOverflow { .. } => write!(f, "integer constant too large"),
            Self::LimitExceeded { message, .. } => write!(f, "{}", message),
        }
    }
}

impl error::Error for CompileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Token(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TokenError> for CompileError {
    fn from(err: TokenError) -> Self {
        CompileError::Token(err)
    }
}
