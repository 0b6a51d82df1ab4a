//! Configuration options for the Dson codecs.
//!
//! - [`DsonOptions`]: main configuration struct, shared by the text and binary codecs
//! - [`ObjectStyle`]: flow (single line, soft-wrapped) or indented text containers
//! - [`TypeIdPolicy`]: when a container's class id is written
//!
//! ## Examples
//!
//! ```rust
//! use dson::{dson, to_text_with_options, DsonOptions, DsonValue, ObjectStyle};
//!
//! let value: DsonValue = dson!({ "x": 1, "y": 2 });
//!
//! let options = DsonOptions::new().with_style(ObjectStyle::Indent);
//! let text = to_text_with_options(&value, &options).unwrap();
//! assert!(text.lines().count() > 1);
//! ```

use crate::types::WireType;

/// Layout of text containers.
///
/// # Examples
///
/// ```rust
/// use dson::ObjectStyle;
///
/// assert_eq!(ObjectStyle::default(), ObjectStyle::Flow);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ObjectStyle {
    /// Members follow each other on one line, wrapping at the soft line length.
    #[default]
    Flow,
    /// Every member starts on its own `-- ` line.
    Indent,
}

/// When a container's class id is emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TypeIdPolicy {
    /// Every typed container carries its id.
    Always,
    /// Ids are never written; readers fall back to the declared type.
    None,
    /// Ids are written only when the runtime type differs from the declared
    /// type and is not the default implementation of it.
    #[default]
    Optimized,
}

/// Configuration options for Dson encoding and decoding.
///
/// # Examples
///
/// ```rust
/// use dson::{DsonOptions, ObjectStyle, WireType};
///
/// // Defaults: flow style, 64 nesting levels
/// let options = DsonOptions::new();
/// assert_eq!(options.recursion_limit, 64);
///
/// // Indented text
/// let options = DsonOptions::pretty();
/// assert_eq!(options.style, ObjectStyle::Indent);
///
/// // Custom configuration
/// let options = DsonOptions::new()
///     .with_recursion_limit(16)
///     .with_wire_type(WireType::Fixed)
///     .with_soft_line_length(80);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DsonOptions {
    pub recursion_limit: usize,
    pub soft_line_length: usize,
    pub indent: usize,
    pub style: ObjectStyle,
    pub text_mode: bool,
    pub text_string_length: usize,
    pub max_unquoted_length: usize,
    pub wire_type: WireType,
    pub max_binary_size: usize,
    pub type_id_policy: TypeIdPolicy,
}

impl Default for DsonOptions {
    fn default() -> Self {
        DsonOptions {
            recursion_limit: 64,
            soft_line_length: 120,
            indent: 2,
            style: ObjectStyle::default(),
            text_mode: true,
            text_string_length: 120,
            max_unquoted_length: 32,
            wire_type: WireType::default(),
            max_binary_size: 1024 * 1024,
            type_id_policy: TypeIdPolicy::default(),
        }
    }
}

impl DsonOptions {
    /// Creates default options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::DsonOptions;
    ///
    /// let options = DsonOptions::new();
    /// assert_eq!(options.indent, 2);
    /// assert!(options.text_mode);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for indented text output.
    #[must_use]
    pub fn pretty() -> Self {
        DsonOptions {
            style: ObjectStyle::Indent,
            ..Default::default()
        }
    }

    /// Sets the maximum container nesting depth.
    ///
    /// Nesting exactly at the limit is accepted; one level deeper fails with
    /// [`Error::RecursionLimit`](crate::Error::RecursionLimit).
    #[must_use]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Sets the column after which the text writer starts a new `-| ` line.
    #[must_use]
    pub fn with_soft_line_length(mut self, length: usize) -> Self {
        self.soft_line_length = length;
        self
    }

    /// Sets the indentation size (spaces per nesting level) for indented style.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ObjectStyle) -> Self {
        self.style = style;
        self
    }

    /// Enables or disables `@ss` long-text blocks for long or multi-line strings.
    #[must_use]
    pub fn with_text_mode(mut self, enabled: bool) -> Self {
        self.text_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_text_string_length(mut self, length: usize) -> Self {
        self.text_string_length = length;
        self
    }

    /// Strings longer than this are always quoted.
    #[must_use]
    pub fn with_max_unquoted_length(mut self, length: usize) -> Self {
        self.max_unquoted_length = length;
        self
    }

    /// Sets the integer wire type used when encoding [`DsonValue`](crate::DsonValue)s.
    #[must_use]
    pub fn with_wire_type(mut self, wire_type: WireType) -> Self {
        self.wire_type = wire_type;
        self
    }

    /// Sets the output buffer size used by [`to_binary`](crate::to_binary).
    #[must_use]
    pub fn with_max_binary_size(mut self, size: usize) -> Self {
        self.max_binary_size = size;
        self
    }

    #[must_use]
    pub fn with_type_id_policy(mut self, policy: TypeIdPolicy) -> Self {
        self.type_id_policy = policy;
        self
    }
}
