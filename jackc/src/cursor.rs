//! Character cursor over source text.
use std::str::CharIndices;

/// Stand-in character returned when the cursor has run past the end of the source.
pub const EOF_CHAR: char = '\0';

/// Scanner that walks UTF-8 source one character at a time,
/// with one character of look ahead.
///
/// The cursor starts *before* the first character. The lexer
/// must call [`Cursor::next`] once to prime it.
pub struct Cursor<'a> {
    chars: CharIndices<'a>,
    /// Byte length of the source, used as the offset
    /// of the end-of-file position.
    len: u32,
    /// Current character and its byte offset.
    current: (u32, char),
    /// Look ahead character and its byte offset.
    peek: (u32, char),
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        let len = source.len() as u32;
        let mut chars = source.char_indices();
        let peek = chars
            .next()
            .map(|(i, c)| (i as u32, c))
            .unwrap_or((len, EOF_CHAR));

        Self {
            chars,
            len,
            current: (0, EOF_CHAR),
            peek,
        }
    }

    /// Advance the cursor by one character and return the new current character.
    pub fn next(&mut self) -> char {
        self.current = self.peek;
        self.peek = self
            .chars
            .next()
            .map(|(i, c)| (i as u32, c))
            .unwrap_or((self.len, EOF_CHAR));
        self.current.1
    }

    /// Advance the cursor, unless it's already at the end.
    #[inline]
    pub fn next_char(&mut self) -> char {
        if self.at_end() {
            EOF_CHAR
        } else {
            self.next()
        }
    }

    #[inline]
    pub fn current(&self) -> char {
        self.current.1
    }

    #[inline]
    pub fn peek(&self) -> char {
        self.peek.1
    }

    /// Byte offset of the current character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.current.0
    }

    /// Byte offset of the look ahead character.
    #[inline]
    pub fn peek_offset(&self) -> u32 {
        self.peek.0
    }

    /// Indicates whether the current character is past the end of the source.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.0 >= self.len
    }
}
