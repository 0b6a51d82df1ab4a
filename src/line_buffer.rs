//! Line-oriented character source for the text codec.
//!
//! Every physical line of Dson text starts with a two-character *line head*
//! followed by one space:
//!
//! | Head  | [`LineKind`]                  | Meaning                                        |
//! |-------|-------------------------------|------------------------------------------------|
//! | `-- ` | [`LineKind::AppendLine`]      | ordinary content                               |
//! | `-\| ` | [`LineKind::Append`]          | continues the previous line with no break      |
//! | `-> ` | [`LineKind::TextAppendLine`]  | inside long text, a literal newline then content |
//!
//! Blank lines and lines whose first non-blank character is `#` are
//! [`LineKind::Comment`] and never reach the caller. Lines are classified
//! lazily as the cursor reaches them, so a malformed head is reported only
//! when the reader gets there.
//!
//! ```rust
//! use dson::{LineBuffer, Scanned};
//!
//! let mut buffer = LineBuffer::new("-- ab\n# note\n-| c");
//! assert_eq!(buffer.read().unwrap(), Scanned::Char('a'));
//! assert_eq!(buffer.read().unwrap(), Scanned::Char('b'));
//! assert_eq!(buffer.read_raw().unwrap(), Scanned::LineBreak);
//! assert_eq!(buffer.read().unwrap(), Scanned::Char('c'));
//! assert_eq!(buffer.read().unwrap(), Scanned::Eof);
//! ```

use crate::error::{Error, Result};

/// Classification of a physical line by its head.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    AppendLine,
    Append,
    TextAppendLine,
}

impl LineKind {
    /// The head written in front of a line of this kind.
    #[must_use]
    pub const fn head(self) -> &'static str {
        match self {
            LineKind::Comment => "#",
            LineKind::AppendLine => "--",
            LineKind::Append => "-|",
            LineKind::TextAppendLine => "->",
        }
    }
}

/// One step of the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scanned {
    Char(char),
    /// The cursor moved onto the next content line.
    LineBreak,
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    line: usize,
    /// Byte offset into the current line.
    pos: usize,
    started: bool,
    eof: bool,
}

/// A cursor over line-headed text with one step of backtracking.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    lines: Vec<String>,
    heads: Vec<Option<(LineKind, usize)>>,
    cursor: Cursor,
    saved: Option<Cursor>,
}

impl LineBuffer {
    /// Splits `text` on `\n`. A `\r` directly before the `\n` is dropped.
    pub fn new(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line)))
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let heads = vec![None; lines.len()];
        LineBuffer {
            lines,
            heads,
            cursor: Cursor {
                line: 0,
                pos: 0,
                started: false,
                eof: false,
            },
            saved: None,
        }
    }

    /// Next content character, skipping line breaks.
    pub fn read(&mut self) -> Result<Scanned> {
        loop {
            match self.read_raw()? {
                Scanned::LineBreak => continue,
                other => return Ok(other),
            }
        }
    }

    /// Next content character, line break or end of input.
    pub fn read_raw(&mut self) -> Result<Scanned> {
        if self.cursor.eof {
            return Err(Error::unexpected_eof(
                self.line_number(),
                self.column(),
                "no further reads after end of input",
            ));
        }
        self.saved = Some(self.cursor);

        if !self.cursor.started {
            self.cursor.started = true;
            match self.next_content_line(0)? {
                Some((line, start)) => {
                    self.cursor.line = line;
                    self.cursor.pos = start;
                }
                None => {
                    self.cursor.eof = true;
                    return Ok(Scanned::Eof);
                }
            }
        }

        let line = &self.lines[self.cursor.line];
        if let Some(c) = line[self.cursor.pos..].chars().next() {
            self.cursor.pos += c.len_utf8();
            return Ok(Scanned::Char(c));
        }

        match self.next_content_line(self.cursor.line + 1)? {
            Some((line, start)) => {
                self.cursor.line = line;
                self.cursor.pos = start;
                Ok(Scanned::LineBreak)
            }
            None => {
                self.cursor.eof = true;
                Ok(Scanned::Eof)
            }
        }
    }

    /// Steps back over the last `read_raw` step. Only one step is remembered.
    pub fn unread(&mut self) -> Result<()> {
        match self.saved.take() {
            Some(cursor) => {
                self.cursor = cursor;
                Ok(())
            }
            None => Err(Error::protocol("unread called twice without an intervening read")),
        }
    }

    /// Kind of the line the cursor is on, or `None` before the first read.
    pub fn current_line_kind(&self) -> Option<LineKind> {
        if !self.cursor.started {
            return None;
        }
        self.heads
            .get(self.cursor.line)
            .copied()
            .flatten()
            .map(|(kind, _)| kind)
    }

    /// 1-based line number of the cursor.
    pub fn line_number(&self) -> usize {
        self.cursor.line + 1
    }

    /// 1-based column of the cursor.
    pub fn column(&self) -> usize {
        self.lines
            .get(self.cursor.line)
            .and_then(|line| line.get(..self.cursor.pos))
            .map_or(0, |prefix| prefix.chars().count())
            + 1
    }

    fn next_content_line(&mut self, from: usize) -> Result<Option<(usize, usize)>> {
        for index in from..self.lines.len() {
            let (kind, start) = self.classify(index)?;
            if kind != LineKind::Comment {
                return Ok(Some((index, start)));
            }
        }
        Ok(None)
    }

    fn classify(&mut self, index: usize) -> Result<(LineKind, usize)> {
        if let Some(head) = self.heads[index] {
            return Ok(head);
        }
        let head = classify_line(&self.lines[index], index + 1)?;
        self.heads[index] = Some(head);
        Ok(head)
    }
}

/// Classifies one physical line, returning its kind and the byte offset where
/// content starts.
fn classify_line(line: &str, line_number: usize) -> Result<(LineKind, usize)> {
    if let Some(col) = line.find('\r') {
        return Err(Error::syntax(line_number, col + 1, "isolated '\\r' in input"));
    }
    let trimmed = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
    let indent = line.len() - trimmed.len();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok((LineKind::Comment, line.len()));
    }

    let kind = match trimmed.get(..2) {
        Some("--") => LineKind::AppendLine,
        Some("-|") => LineKind::Append,
        Some("->") => LineKind::TextAppendLine,
        _ => {
            return Err(Error::syntax(
                line_number,
                indent + 1,
                "invalid line head, expected '--', '-|' or '->'",
            ))
        }
    };
    let after = indent + 2;
    match line.as_bytes().get(after) {
        None => Ok((kind, after)),
        Some(b' ') => Ok((kind, after + 1)),
        Some(_) => Err(Error::syntax(
            line_number,
            after + 1,
            "space required after line-head",
        )),
    }
}
