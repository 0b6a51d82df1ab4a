//! Lexer for Dson text.
//!
//! The [`Tokenizer`] pulls characters from a [`LineBuffer`] and yields one
//! [`Token`] at a time. Typed-literal headers (`@i 1`, `@L 2`, `@f 1.5`,
//! `@d NaN`, `@b true`, `@N null`) and long-text blocks (`@ss ...`) are
//! resolved here into literal tokens; every other `@name` surfaces as
//! [`Token::Header`] for the reader to interpret.

use crate::error::{Error, Result};
use crate::line_buffer::{LineBuffer, LineKind, Scanned};

/// Header names with a built-in meaning. User class names may not use them.
pub const RESERVED_HEADER_NAMES: [&str; 12] = [
    "i", "L", "f", "d", "b", "N", "bin", "ei", "eL", "es", "ref", "ss",
];

/// A lexical token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Colon,
    Comma,
    /// `@name`; `@{` yields `Header("{")` and leaves the brace for the next token.
    Header(String),
    /// Quoted string or long-text block.
    String(String),
    /// Bare token, not yet classified.
    UnquotedString(String),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Null,
    Eof,
}

/// Characters that end an unquoted token.
#[inline]
#[must_use]
pub fn is_unsafe_char(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '{' | '}' | '[' | ']' | ',' | ':' | '"' | '@' | '\\' | '(' | ')' | '\''
        )
}

/// Interprets a bare token.
///
/// `true`/`false`/`null` are literals; integers become `Int32` when they fit,
/// else `Int64`; decimals starting with a digit, sign or `.` become `Double`.
/// Everything else stays an [`Token::UnquotedString`].
///
/// ```rust
/// use dson::{classify_unquoted, Token};
///
/// assert_eq!(classify_unquoted("42"), Token::Int32(42));
/// assert_eq!(classify_unquoted("5000000000"), Token::Int64(5_000_000_000));
/// assert_eq!(classify_unquoted("1.5"), Token::Double(1.5));
/// assert_eq!(classify_unquoted("inf"), Token::UnquotedString("inf".into()));
/// ```
#[must_use]
pub fn classify_unquoted(text: &str) -> Token {
    match text {
        "true" => return Token::Bool(true),
        "false" => return Token::Bool(false),
        "null" => return Token::Null,
        _ => {}
    }
    if let Ok(v) = text.parse::<i32>() {
        return Token::Int32(v);
    }
    if let Ok(v) = text.parse::<i64>() {
        return Token::Int64(v);
    }
    let numeric_start = text
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric_start {
        if let Ok(v) = text.parse::<f64>() {
            return Token::Double(v);
        }
    }
    Token::UnquotedString(text.to_string())
}

/// Pull-based tokenizer over a [`LineBuffer`].
#[derive(Debug, Clone)]
pub struct Tokenizer {
    buffer: LineBuffer,
    done: bool,
}

impl Tokenizer {
    pub fn new(buffer: LineBuffer) -> Self {
        Tokenizer {
            buffer,
            done: false,
        }
    }

    /// 1-based line and column of the cursor.
    pub fn position(&self) -> (usize, usize) {
        (self.buffer.line_number(), self.buffer.column())
    }

    /// Next token. Returns [`Token::Eof`] forever once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token> {
        if self.done {
            return Ok(Token::Eof);
        }
        let first = loop {
            match self.buffer.read()? {
                Scanned::Eof => {
                    self.done = true;
                    return Ok(Token::Eof);
                }
                Scanned::Char(c) if c.is_whitespace() => continue,
                Scanned::Char(c) => break c,
                Scanned::LineBreak => continue,
            }
        };
        match first {
            '{' => Ok(Token::BeginObject),
            '}' => Ok(Token::EndObject),
            '[' => Ok(Token::BeginArray),
            ']' => Ok(Token::EndArray),
            ':' => Ok(Token::Colon),
            ',' => Ok(Token::Comma),
            '"' => self.scan_quoted().map(Token::String),
            '@' => self.scan_header(),
            c if is_unsafe_char(c) => Err(self.error(&format!("unexpected character '{}'", c))),
            c => self.scan_unquoted(c).map(Token::UnquotedString),
        }
    }

    fn error(&self, msg: &str) -> Error {
        let (line, col) = self.position();
        Error::syntax(line, col, msg)
    }

    fn eof_error(&self, expected: &str) -> Error {
        let (line, col) = self.position();
        Error::unexpected_eof(line, col, expected)
    }

    /// Reads a bare token; it may continue across `-|` lines.
    fn scan_unquoted(&mut self, first: char) -> Result<String> {
        let mut text = String::new();
        text.push(first);
        loop {
            match self.buffer.read_raw()? {
                Scanned::Char(c) if !is_unsafe_char(c) => text.push(c),
                Scanned::LineBreak if self.buffer.current_line_kind() == Some(LineKind::Append) => {
                    continue
                }
                _ => {
                    self.buffer.unread()?;
                    return Ok(text);
                }
            }
        }
    }

    /// Reads the rest of a quoted string after the opening quote.
    fn scan_quoted(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.buffer.read_raw()? {
                Scanned::Char('"') => return Ok(text),
                Scanned::Char('\\') => {
                    let c = self.scan_escape()?;
                    text.push(c);
                }
                Scanned::Char(c) => text.push(c),
                Scanned::LineBreak => match self.buffer.current_line_kind() {
                    Some(LineKind::Append) => {}
                    Some(LineKind::TextAppendLine) => text.push('\n'),
                    _ => return Err(self.error("unterminated string at line break")),
                },
                Scanned::Eof => return Err(self.eof_error("closing '\"'")),
            }
        }
    }

    fn next_char(&mut self, expected: &str) -> Result<char> {
        match self.buffer.read_raw()? {
            Scanned::Char(c) => Ok(c),
            Scanned::LineBreak => Err(self.error(&format!("line break in {}", expected))),
            Scanned::Eof => Err(self.eof_error(expected)),
        }
    }

    fn scan_escape(&mut self) -> Result<char> {
        let c = self.next_char("escape sequence")?;
        Ok(match c {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                let high = self.scan_hex4()?;
                if (0xD800..0xDC00).contains(&high) {
                    if self.next_char("surrogate pair")? != '\\'
                        || self.next_char("surrogate pair")? != 'u'
                    {
                        return Err(self.error("unpaired surrogate in \\u escape"));
                    }
                    let low = self.scan_hex4()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error("invalid low surrogate in \\u escape"));
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(code).ok_or_else(|| self.error("invalid \\u escape"))?
                } else {
                    char::from_u32(high).ok_or_else(|| self.error("invalid \\u escape"))?
                }
            }
            other => return Err(self.error(&format!("invalid escape '\\{}'", other))),
        })
    }

    fn scan_hex4(&mut self) -> Result<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            let c = self.next_char("\\u escape")?;
            let digit = c
                .to_digit(16)
                .ok_or_else(|| self.error(&format!("invalid hex digit '{}'", c)))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// Reads the name after `@` and resolves literal sugar.
    fn scan_header(&mut self) -> Result<Token> {
        let name = match self.buffer.read_raw()? {
            Scanned::Char('{') => {
                self.buffer.unread()?;
                return Ok(Token::Header("{".to_string()));
            }
            Scanned::Char(c) if !is_unsafe_char(c) => self.scan_unquoted(c)?,
            Scanned::Eof => return Err(self.eof_error("class name after '@'")),
            _ => return Err(self.error("class name expected after '@'")),
        };

        match name.as_str() {
            "i" | "L" | "f" | "d" | "b" | "N" => self.scan_typed_literal(&name),
            "ss" => self.scan_long_text().map(Token::String),
            _ => Ok(Token::Header(name)),
        }
    }

    fn scan_typed_literal(&mut self, kind: &str) -> Result<Token> {
        let text = match self.next_token()? {
            Token::UnquotedString(s) | Token::String(s) => s,
            Token::Eof => return Err(self.eof_error(&format!("literal after '@{}'", kind))),
            other => {
                return Err(self.error(&format!(
                    "expected literal after '@{}', found {:?}",
                    kind, other
                )))
            }
        };
        let bad = |this: &Self| this.error(&format!("invalid '@{}' literal '{}'", kind, text));
        match kind {
            "i" => text.parse().map(Token::Int32).map_err(|_| bad(self)),
            "L" => text.parse().map(Token::Int64).map_err(|_| bad(self)),
            "f" => text.parse().map(Token::Float).map_err(|_| bad(self)),
            "d" => text.parse().map(Token::Double).map_err(|_| bad(self)),
            "b" => match text.as_str() {
                "true" => Ok(Token::Bool(true)),
                "false" => Ok(Token::Bool(false)),
                _ => Err(bad(self)),
            },
            _ => match text.as_str() {
                "null" => Ok(Token::Null),
                _ => Err(bad(self)),
            },
        }
    }

    /// Reads a long-text block: everything up to the next `--` line, with a
    /// newline for every `->` line and nothing for `-|` lines.
    fn scan_long_text(&mut self) -> Result<String> {
        match self.buffer.read_raw()? {
            Scanned::Char(' ') => {}
            _ => self.buffer.unread()?,
        }
        let mut text = String::new();
        loop {
            match self.buffer.read_raw()? {
                Scanned::Char(c) => text.push(c),
                Scanned::LineBreak => match self.buffer.current_line_kind() {
                    Some(LineKind::Append) => {}
                    Some(LineKind::TextAppendLine) => text.push('\n'),
                    _ => {
                        self.buffer.unread()?;
                        return Ok(text);
                    }
                },
                Scanned::Eof => {
                    self.buffer.unread()?;
                    return Ok(text);
                }
            }
        }
    }
}

impl Iterator for Tokenizer {
    type Item = Result<Token>;

    /// Yields tokens up to, not including, [`Token::Eof`]; stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(Token::Eof) => None,
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
            ok => Some(ok),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        Tokenizer::new(LineBuffer::new(text))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(
            tokens("-- {x: 1, y: [a]}"),
            vec![
                Token::BeginObject,
                Token::UnquotedString("x".into()),
                Token::Colon,
                Token::UnquotedString("1".into()),
                Token::Comma,
                Token::UnquotedString("y".into()),
                Token::Colon,
                Token::BeginArray,
                Token::UnquotedString("a".into()),
                Token::EndArray,
                Token::EndObject,
            ]
        );
    }

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(
            tokens(r#"-- "a\"b\\c\né😀""#),
            vec![Token::String("a\"b\\c\né😀".into())]
        );
    }

    #[test]
    fn test_quoted_string_across_lines() {
        assert_eq!(
            tokens("-- \"ab\n-| cd\n-> ef\""),
            vec![Token::String("abcd\nef".into())]
        );
        let err = Tokenizer::new(LineBuffer::new("-- \"ab\n-- cd\""))
            .next_token()
            .unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_unterminated_string() {
        let err = Tokenizer::new(LineBuffer::new("-- \"abc"))
            .next_token()
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_unquoted_continues_on_append_only() {
        assert_eq!(
            tokens("-- abc\n-| def"),
            vec![Token::UnquotedString("abcdef".into())]
        );
        assert_eq!(
            tokens("-- abc\n-- def"),
            vec![
                Token::UnquotedString("abc".into()),
                Token::UnquotedString("def".into())
            ]
        );
    }

    #[test]
    fn test_typed_literals() {
        let all = tokens("-- @i 1, @L 2, @f 1.5, @d NaN, @b true, @N null");
        assert_eq!(all[0], Token::Int32(1));
        assert_eq!(all[2], Token::Int64(2));
        assert_eq!(all[4], Token::Float(1.5));
        assert!(matches!(all[6], Token::Double(v) if v.is_nan()));
        assert_eq!(all[8], Token::Bool(true));
        assert_eq!(all[10], Token::Null);
        assert_eq!(all.len(), 11);
        assert_eq!(tokens("-- @d -inf"), vec![Token::Double(f64::NEG_INFINITY)]);
    }

    #[test]
    fn test_bad_typed_literal() {
        let err = Tokenizer::new(LineBuffer::new("-- @i abc"))
            .next_token()
            .unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            tokens("-- @Point{} @{} @ref x"),
            vec![
                Token::Header("Point".into()),
                Token::BeginObject,
                Token::EndObject,
                Token::Header("{".into()),
                Token::BeginObject,
                Token::EndObject,
                Token::Header("ref".into()),
                Token::UnquotedString("x".into()),
            ]
        );
    }

    #[test]
    fn test_long_text_block() {
        let text = "-- @ss first\n-> second\n-| tail\n->\n-- 7";
        assert_eq!(
            tokens(text),
            vec![
                Token::String("first\nsecondtail\n".into()),
                Token::UnquotedString("7".into()),
            ]
        );
    }

    #[test]
    fn test_long_text_until_eof() {
        assert_eq!(
            tokens("-- @ss  two spaces\n-> x"),
            vec![Token::String(" two spaces\nx".into())]
        );
    }

    #[test]
    fn test_classify_unquoted() {
        assert_eq!(classify_unquoted("true"), Token::Bool(true));
        assert_eq!(classify_unquoted("null"), Token::Null);
        assert_eq!(classify_unquoted("-7"), Token::Int32(-7));
        assert_eq!(classify_unquoted("2147483648"), Token::Int64(2_147_483_648));
        assert_eq!(classify_unquoted("1e3"), Token::Double(1000.0));
        assert_eq!(classify_unquoted(".5"), Token::Double(0.5));
        assert_eq!(classify_unquoted("abc"), Token::UnquotedString("abc".into()));
        assert_eq!(classify_unquoted("NaN"), Token::UnquotedString("NaN".into()));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut tokenizer = Tokenizer::new(LineBuffer::new("-- a"));
        assert_eq!(tokenizer.next_token().unwrap(), Token::UnquotedString("a".into()));
        assert_eq!(tokenizer.next_token().unwrap(), Token::Eof);
        assert_eq!(tokenizer.next_token().unwrap(), Token::Eof);
    }
}
