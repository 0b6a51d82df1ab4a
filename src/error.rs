//! Error types for Dson encoding and decoding.
//!
//! Errors fall into four families:
//!
//! - **Syntax errors**: malformed line heads, unterminated strings, unexpected
//!   end of input. Carry line/column information.
//! - **Protocol errors**: a reader or writer was driven out of order (writing a
//!   value while a name is pending, reading a value twice, ...).
//! - **Type errors**: the decoded [`DsonType`](crate::DsonType) does not match
//!   what the caller asked for, or no codec resolves for a type id.
//! - **Resource errors**: the recursion ceiling was hit or the output buffer
//!   ran out of room. See [`Error::is_resource`].
//!
//! Nothing in the crate retries. Partially written output must be discarded
//! by the caller when an error is returned.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{from_text, Error};
//!
//! let result = from_text("-x content");
//! assert!(matches!(result, Err(Error::Syntax { line: 1, .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the Dson codecs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Lexical or grammatical error in text input
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// Input ended while more was required
    #[error("Unexpected end of input at line {line}, column {col}, expected {expected}")]
    UnexpectedEof {
        line: usize,
        col: usize,
        expected: String,
    },

    /// A reader or writer operation was called in the wrong state
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The decoded type cannot satisfy the requested one
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A type id did not resolve against the registry
    #[error("Unknown type id: {0}")]
    UnknownType(String),

    /// Neither the encoded nor the declared type has a registered codec
    #[error("No codec registered for {0}")]
    NoCodec(String),

    /// Registry construction or composition failed
    #[error("Registry error: {0}")]
    Registry(String),

    /// Binary input is structurally inconsistent
    #[error("Corrupted input: {0}")]
    Corrupted(String),

    /// Nesting exceeded the configured recursion limit
    #[error("Recursion limit of {limit} exceeded")]
    RecursionLimit { limit: usize },

    /// The output buffer cannot hold the encoded value
    #[error("Buffer overflow: needed {needed} bytes, {remaining} remaining")]
    BufferOverflow { needed: usize, remaining: usize },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::Error;
    ///
    /// let err = Error::syntax(10, 5, "unexpected token");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(line: usize, col: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            line,
            col,
            expected: expected.to_string(),
        }
    }

    /// Creates a protocol (codec misuse) error.
    pub fn protocol<T: fmt::Display>(msg: T) -> Self {
        Error::Protocol(msg.to_string())
    }

    /// Creates a type mismatch error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::Error;
    ///
    /// let err = Error::type_mismatch("Int32", "String");
    /// assert!(err.to_string().contains("expected Int32"));
    /// ```
    pub fn type_mismatch<E: fmt::Display, F: fmt::Display>(expected: E, found: F) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a corrupted-input error.
    pub fn corrupted<T: fmt::Display>(msg: T) -> Self {
        Error::Corrupted(msg.to_string())
    }

    /// Creates a registry construction error.
    pub fn registry<T: fmt::Display>(msg: T) -> Self {
        Error::Registry(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` for errors a caller may fix by retrying with a larger
    /// recursion limit or output buffer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::Error;
    ///
    /// assert!(Error::RecursionLimit { limit: 4 }.is_resource());
    /// assert!(!Error::protocol("bad state").is_resource());
    /// ```
    #[must_use]
    pub const fn is_resource(&self) -> bool {
        matches!(
            self,
            Error::RecursionLimit { .. } | Error::BufferOverflow { .. }
        )
    }

    /// Returns `true` for lexical and grammatical errors.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. } | Error::UnexpectedEof { .. })
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_classification() {
        assert!(Error::BufferOverflow {
            needed: 8,
            remaining: 2
        }
        .is_resource());
        assert!(!Error::syntax(1, 1, "x").is_resource());
        assert!(Error::unexpected_eof(3, 4, "value").is_syntax());
    }

    #[test]
    fn test_messages_carry_position() {
        let err = Error::syntax(7, 2, "space required after line-head");
        let text = err.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("column 2"));
        assert!(text.contains("space required"));
    }
}
