//! # dson
//!
//! A self-describing object serialization format with two encodings of the
//! same value model: a compact binary form and a line-oriented text form.
//!
//! ## Key Features
//!
//! - **One value model, two wire forms**: [`DsonValue`] reads and writes as text
//!   ([`TextReader`], [`TextWriter`]) or binary ([`BinaryReader`], [`BinaryWriter`])
//! - **Strict protocol**: every member is read as type → name → value through the
//!   [`DsonReader`] / [`DsonWriter`] traits, so codecs are interchangeable
//! - **Typed containers**: objects and arrays may carry a class id resolved through a
//!   [`TypeRegistry`](registry::TypeRegistry), with polymorphic and projected decoding
//!   ([`dispatch`])
//! - **Cheap skipping**: binary containers are length-prefixed and can be skipped in O(1)
//! - **Serde bridge**: [`to_value`] / [`from_value`] connect any `Serialize` / `Deserialize` type
//! - **No Unsafe Code**
//!
//! ## Quick Start
//!
//! ```rust
//! use dson::{dson, from_text, to_text, DsonValue};
//!
//! let point: DsonValue = dson!({ "x": 1, "y": 2 });
//!
//! let text = to_text(&point).unwrap();
//! assert_eq!(text, "-- {x: 1, y: 2}");
//!
//! assert_eq!(from_text(&text).unwrap(), point);
//! ```
//!
//! ### Text form
//!
//! Every line starts with a two-character head: `-- ` begins content, `-|`
//! continues the previous line, `->` continues it after a line break, and
//! `##` is a comment.
//!
//! ```text
//! ## a typed object with a header
//! -- @{clsName: Point, v: 2}{x: 1, y: 2,
//! -| tags: [a, "b c"], big: @L 7, bin: @bin [1, 0aff]}
//! ```
//!
//! ### Binary form
//!
//! Binary values are named by [`FieldNumber`] and typed by [`ClassId`]:
//!
//! ```rust
//! use dson::{from_binary, to_binary, DsonObject, DsonValue, FieldNumber};
//!
//! let mut object = DsonObject::<FieldNumber>::new();
//! object.insert(FieldNumber::of(1), DsonValue::Int32(5));
//! let value = DsonValue::Object(object);
//!
//! let bytes = to_binary(&value).unwrap();
//! assert_eq!(from_binary(&bytes).unwrap(), value);
//! ```
//!
//! ### Typed structs
//!
//! ```rust
//! use dson::{from_str, to_string};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 7, name: "Alice".to_string(), active: true };
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, "-- {id: @L 7, name: Alice, active: true}");
//!
//! let back: User = from_str(&text).unwrap();
//! assert_eq!(back, user);
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`Result`]. Syntax errors carry a line and column;
//! resource errors ([`Error::is_resource`]) signal that a larger buffer or
//! recursion limit may succeed. Output written before an error is unspecified
//! and should be discarded.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (container boundaries, dispatch
//! decisions, binary skip fallbacks) and installs no subscriber.
//!
//! ## Demos
//!
//! See `demos/` (`simple`, `dynamic_values`, `custom_options`), runnable with
//! `cargo run --example <name>`.

pub mod binary_reader;
pub mod binary_writer;
pub mod context;
pub mod de;
pub mod dispatch;
pub mod error;
pub mod line_buffer;
pub mod macros;
pub mod map;
pub mod options;
pub mod reader;
pub mod registry;
pub mod ser;
pub mod text_reader;
pub mod text_writer;
pub mod tokenizer;
pub mod types;
pub mod value;
pub mod writer;

pub use binary_reader::BinaryReader;
pub use binary_writer::{BinaryWriter, CodedOutput};
pub use context::{Context, ContextStack};
pub use de::{from_value, read_document, read_value, ValueDeserializer};
pub use dispatch::{CodecRegistry, DsonCodec, ObjectConverter, Resolution};
pub use error::{Error, Result};
pub use line_buffer::{LineBuffer, LineKind, Scanned};
pub use map::DsonMap;
pub use options::{DsonOptions, ObjectStyle, TypeIdPolicy};
pub use reader::DsonReader;
pub use registry::{TypeKey, TypeMeta, TypeRegistry};
pub use ser::{to_value, write_document, write_value, ValueSerializer};
pub use text_reader::TextReader;
pub use text_writer::TextWriter;
pub use tokenizer::{classify_unquoted, Token, Tokenizer};
pub use types::{
    ClassId, ContextType, DsonName, DsonType, FieldKey, FieldNumber, ReaderState, WireType,
    WriterState,
};
pub use value::{Binary, DsonArray, DsonObject, DsonValue, ExtInt32, ExtInt64, ExtString, ObjectRef};
pub use writer::DsonWriter;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Writes a value as Dson text.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, to_text};
///
/// assert_eq!(to_text(&dson!(["a", 1, null])).unwrap(), "-- [a, 1, null]");
/// ```
///
/// # Errors
///
/// Fails when the value nests deeper than the recursion limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text(value: &DsonValue) -> Result<String> {
    to_text_with_options(value, &DsonOptions::default())
}

/// Writes a value as indented Dson text.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, to_text_pretty};
///
/// let text = to_text_pretty(&dson!({ "a": 1 })).unwrap();
/// assert_eq!(text, "-- {\n--   a: 1\n-- }");
/// ```
///
/// # Errors
///
/// Fails when the value nests deeper than the recursion limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text_pretty(value: &DsonValue) -> Result<String> {
    to_text_with_options(value, &DsonOptions::pretty())
}

/// Writes a value as Dson text with custom options.
///
/// # Errors
///
/// Fails when the value nests deeper than `options.recursion_limit`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text_with_options(value: &DsonValue, options: &DsonOptions) -> Result<String> {
    to_text_document_with_options(std::slice::from_ref(value), options)
}

/// Writes several top-level values, each on its own `-- ` line.
///
/// # Errors
///
/// Fails when a value nests deeper than `options.recursion_limit`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_text_document_with_options(values: &[DsonValue], options: &DsonOptions) -> Result<String> {
    let mut writer = TextWriter::new(options);
    write_document(&mut writer, values, options.wire_type)?;
    writer.into_string()
}

/// Reads exactly one top-level value from Dson text.
///
/// # Examples
///
/// ```rust
/// use dson::{from_text, DsonValue};
///
/// let value = from_text("## comment\n-- [1, @L 2]").unwrap();
/// let array = value.as_array().unwrap();
/// assert_eq!(array.elements, vec![DsonValue::Int32(1), DsonValue::Int64(2)]);
/// ```
///
/// # Errors
///
/// Fails on malformed text, on an empty document and on trailing values.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_text(text: &str) -> Result<DsonValue> {
    from_text_with_options(text, &DsonOptions::default())
}

/// Reads exactly one top-level value from Dson text with custom options.
///
/// # Errors
///
/// Fails on malformed text, on an empty document, on trailing values and when
/// the input nests deeper than `options.recursion_limit`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_text_with_options(text: &str, options: &DsonOptions) -> Result<DsonValue> {
    let mut reader = TextReader::new(text, options);
    read_single(&mut reader)
}

/// Reads every top-level value from Dson text.
///
/// # Errors
///
/// Fails on malformed text.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_text_document(text: &str, options: &DsonOptions) -> Result<Vec<DsonValue>> {
    let mut reader = TextReader::new(text, options);
    read_document(&mut reader)
}

/// Encodes a value in the binary form.
///
/// # Errors
///
/// Fails with [`Error::BufferOverflow`] when the encoding exceeds
/// [`DsonOptions::max_binary_size`], or when the value nests too deep.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_binary(value: &DsonValue<FieldNumber>) -> Result<Vec<u8>> {
    to_binary_with_options(value, &DsonOptions::default())
}

/// Encodes a value in the binary form with custom options.
///
/// # Examples
///
/// ```rust
/// use dson::{to_binary_with_options, DsonOptions, DsonValue, FieldNumber, WireType};
///
/// let options = DsonOptions::new().with_wire_type(WireType::Fixed);
/// let bytes = to_binary_with_options(&DsonValue::<FieldNumber>::Int32(-1), &options).unwrap();
/// assert_eq!(bytes, vec![3, 0xff, 0xff, 0xff, 0xff]);
/// ```
///
/// # Errors
///
/// Fails with [`Error::BufferOverflow`] when the encoding exceeds
/// `options.max_binary_size`, or when the value nests too deep.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_binary_with_options(
    value: &DsonValue<FieldNumber>,
    options: &DsonOptions,
) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; options.max_binary_size];
    let mut writer = BinaryWriter::new(&mut buf, options);
    write_document(&mut writer, std::iter::once(value), options.wire_type)?;
    let len = writer.finish()?;
    buf.truncate(len);
    Ok(buf)
}

/// Decodes exactly one top-level value from the binary form.
///
/// # Errors
///
/// Fails on truncated or corrupted input, on an empty input and on trailing values.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_binary(bytes: &[u8]) -> Result<DsonValue<FieldNumber>> {
    from_binary_with_options(bytes, &DsonOptions::default())
}

/// Decodes exactly one top-level value from the binary form with custom options.
///
/// # Errors
///
/// Fails on truncated or corrupted input, on an empty input, on trailing
/// values and when the input nests deeper than `options.recursion_limit`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_binary_with_options(
    bytes: &[u8],
    options: &DsonOptions,
) -> Result<DsonValue<FieldNumber>> {
    let mut reader = BinaryReader::new(bytes, options);
    read_single(&mut reader)
}

fn read_single<R: DsonReader>(reader: &mut R) -> Result<DsonValue<R::Name>> {
    let value = match reader.read_dson_type()? {
        DsonType::EndOfObject => return Err(Error::protocol("document holds no value")),
        ty => read_value(reader, ty)?,
    };
    match reader.read_dson_type()? {
        DsonType::EndOfObject => Ok(value),
        ty => Err(Error::protocol(format!(
            "document holds more than one value, found trailing {}",
            ty
        ))),
    }
}

/// Serializes any `T: Serialize` to Dson text.
///
/// # Errors
///
/// Returns an error if the value cannot be represented (e.g. non-string map keys
/// of unsupported types) or nests too deep.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_text(&to_value(value)?)
}

/// Serializes any `T: Serialize` to indented Dson text.
///
/// # Errors
///
/// Same as [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_text_pretty(&to_value(value)?)
}

/// Deserializes a `T` from Dson text holding one value.
///
/// # Examples
///
/// ```rust
/// use dson::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("-- @Point{x: 1, y: 2}").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the text is malformed or does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(text: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(from_text(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
    }

    fn user() -> User {
        User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "two words".to_string()],
        }
    }

    #[test]
    fn test_struct_round_trip() {
        let text = to_string(&user()).unwrap();
        let back: User = from_str(&text).unwrap();
        assert_eq!(back, user());
    }

    #[test]
    fn test_pretty_round_trip() {
        let text = to_string_pretty(&user()).unwrap();
        assert!(text.lines().all(|line| line.starts_with("-- ")));
        let back: User = from_str(&text).unwrap();
        assert_eq!(back, user());
    }

    #[test]
    fn test_single_value_documents() {
        assert!(matches!(from_text(""), Err(Error::Protocol(_))));
        assert!(matches!(from_text("-- 1\n-- 2"), Err(Error::Protocol(_))));
        assert_eq!(from_text("-- 1").unwrap(), DsonValue::Int32(1));
        assert!(from_binary(&[]).is_err());
    }

    #[test]
    fn test_text_documents() {
        let options = DsonOptions::default();
        let values = vec![DsonValue::Int32(1), DsonValue::String("x".into())];
        let text = to_text_document_with_options(&values, &options).unwrap();
        assert_eq!(text, "-- 1\n-- x");
        assert_eq!(from_text_document(&text, &options).unwrap(), values);
    }

    #[test]
    fn test_binary_round_trip() {
        let mut inner = DsonArray::<FieldNumber>::new().with_class_id(ClassId::new(2, 9));
        inner.push(DsonValue::Int64(-5));
        inner.push(DsonValue::Binary(Binary::new(3, vec![1, 2, 3])));
        let mut object = DsonObject::<FieldNumber>::new();
        object.insert(FieldNumber::of(1), DsonValue::Array(inner));
        object.insert(FieldNumber::new(1, 2), DsonValue::String("s".into()));
        let value = DsonValue::Object(object);

        let bytes = to_binary(&value).unwrap();
        assert_eq!(from_binary(&bytes).unwrap(), value);
    }

    #[test]
    fn test_binary_size_limit() {
        let options = DsonOptions::new().with_max_binary_size(4);
        let value = DsonValue::<FieldNumber>::String("too long for four bytes".into());
        let err = to_binary_with_options(&value, &options).unwrap_err();
        assert!(err.is_resource());
    }
}
