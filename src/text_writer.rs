//! Text codec writer.
//!
//! Output is line-headed: every top-level value starts a `-- ` line, long
//! flow containers wrap onto `-| ` lines at the soft line length, and long or
//! multi-line strings become `@ss` blocks whose embedded newlines are `-> `
//! lines. Each value takes the shortest form that reads back as the same
//! [`DsonType`]: `1` is an `Int32`, `@L 1` an `Int64`, `@f 1.5` a `Float`,
//! `1.5` a `Double`, and strings that would read as something else are quoted.
//!
//! ```rust
//! use dson::{DsonOptions, DsonWriter, TextWriter, WireType};
//!
//! let mut writer = TextWriter::new(&DsonOptions::default());
//! writer.write_start_object(Some(&"Point".to_string())).unwrap();
//! writer.write_name("x".to_string()).unwrap();
//! writer.write_int32(1, WireType::VarInt).unwrap();
//! writer.write_name("label".to_string()).unwrap();
//! writer.write_string("true").unwrap();
//! writer.write_end_object().unwrap();
//! assert_eq!(writer.into_string().unwrap(), "-- @Point{x: 1, label: \"true\"}");
//! ```

use crate::context::ContextStack;
use crate::error::{Error, Result};
use crate::line_buffer::LineKind;
use crate::options::{DsonOptions, ObjectStyle};
use crate::text_reader::CLASS_NAME_FIELD;
use crate::tokenizer::{classify_unquoted, is_unsafe_char, Token, RESERVED_HEADER_NAMES};
use crate::types::{ContextType, WireType, WriterState};
use crate::value::{Binary, ExtInt32, ExtInt64, ExtString, ObjectRef};
use crate::writer::{
    ensure_end_allowed, ensure_header_allowed, ensure_name_allowed, ensure_value_allowed,
    initial_state, value_written, DsonWriter,
};

/// A container's opening, held back until its first member so a header can go first.
#[derive(Debug)]
struct DeferredBegin {
    class_id: Option<String>,
    open: char,
}

#[derive(Debug, Default)]
struct Frame {
    style: ObjectStyle,
    begin: Option<DeferredBegin>,
    /// For a header frame: the container's opening bracket, written after the header.
    then_open: Option<char>,
}

/// Writes Dson text into a `String`.
#[derive(Debug)]
pub struct TextWriter {
    out: String,
    options: DsonOptions,
    stack: ContextStack<WriterState, Frame>,
    line_len: usize,
    fresh_line: bool,
}

impl TextWriter {
    pub fn new(options: &DsonOptions) -> Self {
        TextWriter {
            out: String::new(),
            options: options.clone(),
            stack: ContextStack::new(WriterState::Value, options.recursion_limit),
            line_len: 0,
            fresh_line: true,
        }
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Returns the text. Fails if a container is still open.
    pub fn into_string(self) -> Result<String> {
        if self.stack.context_type() != ContextType::TopLevel {
            return Err(Error::protocol(format!(
                "{:?} left open at end of output",
                self.stack.context_type()
            )));
        }
        Ok(self.out)
    }

    /// Starts an object laid out in `style` instead of the configured default.
    pub fn write_start_object_styled(
        &mut self,
        class_id: Option<&String>,
        style: ObjectStyle,
    ) -> Result<()> {
        self.start_container(ContextType::Object, class_id.cloned(), style)
    }

    /// Starts an array laid out in `style` instead of the configured default.
    pub fn write_start_array_styled(
        &mut self,
        class_id: Option<&String>,
        style: ObjectStyle,
    ) -> Result<()> {
        self.start_container(ContextType::Array, class_id.cloned(), style)
    }

    fn start_line(&mut self, kind: LineKind) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(kind.head());
        self.out.push(' ');
        self.line_len = 3;
        self.fresh_line = false;
    }

    fn ensure_line(&mut self) {
        if self.fresh_line {
            self.start_line(LineKind::AppendLine);
        }
    }

    /// Writes a token, wrapping onto a `-| ` line if it would pass the soft limit.
    fn token(&mut self, text: &str) {
        self.ensure_line();
        let len = text.chars().count();
        if self.line_len > 3 && self.line_len + len > self.options.soft_line_length {
            self.start_line(LineKind::Append);
        }
        self.out.push_str(text);
        self.line_len += len;
    }

    /// Writes punctuation that never starts a wrapped line.
    fn punct(&mut self, text: &str) {
        self.ensure_line();
        self.out.push_str(text);
        self.line_len += text.len();
    }

    fn indent_line(&mut self, depth: usize) {
        self.start_line(LineKind::AppendLine);
        let pad = self.options.indent * depth;
        self.out.extend(std::iter::repeat(' ').take(pad));
        self.line_len += pad;
    }

    /// Emits the current container's opening if it is still deferred.
    fn open_deferred(&mut self) {
        let Some(begin) = self.stack.current_mut().scratch.begin.take() else {
            return;
        };
        match begin.class_id {
            Some(name) if is_plain_class_name(&name) => {
                self.token(&format!("@{}{}", name, begin.open));
            }
            Some(name) => {
                let name = self.string_form(&name);
                self.token(&format!("@{{{}: {}}}{}", CLASS_NAME_FIELD, name, begin.open));
            }
            None => self.token(&begin.open.to_string()),
        }
    }

    /// Separator and layout before a member of the current container.
    fn separator(&mut self) {
        let frame = self.stack.current();
        let (context_type, count, style) = (frame.context_type, frame.count, frame.scratch.style);
        if context_type == ContextType::TopLevel {
            self.fresh_line = true;
            return;
        }
        if count > 0 {
            self.punct(",");
        }
        if style == ObjectStyle::Indent {
            self.indent_line(self.stack.depth());
        } else if count > 0 {
            self.punct(" ");
        }
    }

    fn begin_value(&mut self, op: &str) -> Result<()> {
        ensure_value_allowed(&self.stack, op)?;
        self.open_deferred();
        if !self.stack.context_type().is_like_object() {
            self.separator();
        }
        Ok(())
    }

    fn scalar(&mut self, op: &str, text: &str) -> Result<()> {
        self.begin_value(op)?;
        self.token(text);
        value_written(&mut self.stack);
        Ok(())
    }

    fn start_container(
        &mut self,
        context_type: ContextType,
        class_id: Option<String>,
        style: ObjectStyle,
    ) -> Result<()> {
        self.begin_value("write_start_*")?;
        let open = if context_type == ContextType::Object {
            '{'
        } else {
            '['
        };
        self.stack.push(
            context_type,
            initial_state(context_type),
            Frame {
                style,
                begin: Some(DeferredBegin { class_id, open }),
                then_open: None,
            },
        )
    }

    fn end_container(&mut self, context_type: ContextType) -> Result<()> {
        ensure_end_allowed(&self.stack, context_type)?;
        self.open_deferred();
        let frame = self.stack.current();
        if frame.scratch.style == ObjectStyle::Indent && frame.count > 0 {
            self.indent_line(self.stack.depth().saturating_sub(1));
        }
        self.punct(if context_type == ContextType::Object {
            "}"
        } else {
            "]"
        });
        self.stack.pop(context_type)?;
        value_written(&mut self.stack);
        Ok(())
    }

    /// Bare when it reads back as the same string, quoted otherwise.
    fn string_form(&self, value: &str) -> String {
        if self.is_plain(value) && matches!(classify_unquoted(value), Token::UnquotedString(_)) {
            value.to_string()
        } else {
            quote(value)
        }
    }

    fn name_form(&self, name: &str) -> String {
        if self.is_plain(name) {
            name.to_string()
        } else {
            quote(name)
        }
    }

    fn is_plain(&self, value: &str) -> bool {
        !value.is_empty()
            && value.chars().count() <= self.options.max_unquoted_length
            && !value.chars().any(is_unsafe_char)
    }

    fn use_long_text(&self, value: &str) -> bool {
        self.options.text_mode
            && !value.contains('\r')
            && (value.contains('\n') || value.chars().count() > self.options.text_string_length)
    }

    /// Writes `@ss` text: `-> ` lines for newlines, `-| ` lines when a line runs long.
    fn long_text(&mut self, value: &str) {
        self.token("@ss ");
        for (i, segment) in value.split('\n').enumerate() {
            if i > 0 {
                self.start_line(LineKind::TextAppendLine);
            }
            let mut written = 0usize;
            for c in segment.chars() {
                if written > 0 && self.line_len >= self.options.soft_line_length {
                    self.start_line(LineKind::Append);
                }
                self.out.push(c);
                self.line_len += 1;
                written += 1;
            }
        }
        self.fresh_line = true;
    }
}

fn is_plain_class_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(is_unsafe_char)
        && !RESERVED_HEADER_NAMES.contains(&name)
}

/// Quotes and escapes a string.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl DsonWriter for TextWriter {
    type Name = String;

    fn context_type(&self) -> ContextType {
        self.stack.context_type()
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn write_name(&mut self, name: String) -> Result<()> {
        ensure_name_allowed(&self.stack)?;
        self.open_deferred();
        self.separator();
        let form = self.name_form(&name);
        self.token(&form);
        self.punct(": ");
        self.stack.set_state(WriterState::Value);
        Ok(())
    }

    fn write_int32(&mut self, value: i32, _wire_type: WireType) -> Result<()> {
        self.scalar("write_int32", &value.to_string())
    }

    fn write_int64(&mut self, value: i64, _wire_type: WireType) -> Result<()> {
        let text = if i32::try_from(value).is_ok() {
            format!("@L {}", value)
        } else {
            value.to_string()
        };
        self.scalar("write_int64", &text)
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        self.scalar("write_float", &format!("@f {:?}", value))
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        let text = if value.is_finite() {
            format!("{:?}", value)
        } else {
            format!("@d {:?}", value)
        };
        self.scalar("write_double", &text)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.scalar("write_bool", if value { "true" } else { "false" })
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.begin_value("write_string")?;
        if self.use_long_text(value) {
            self.long_text(value);
        } else {
            let form = self.string_form(value);
            self.token(&form);
        }
        value_written(&mut self.stack);
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        self.scalar("write_null", "null")
    }

    fn write_binary(&mut self, value: &Binary) -> Result<()> {
        let payload = self.string_form(&hex::encode(&value.data));
        self.scalar(
            "write_binary",
            &format!("@bin [{}, {}]", value.subtype, payload),
        )
    }

    fn write_ext_int32(&mut self, value: &ExtInt32, _wire_type: WireType) -> Result<()> {
        self.scalar(
            "write_ext_int32",
            &format!("@ei [{}, {}]", value.subtype, value.value),
        )
    }

    fn write_ext_int64(&mut self, value: &ExtInt64, _wire_type: WireType) -> Result<()> {
        self.scalar(
            "write_ext_int64",
            &format!("@eL [{}, {}]", value.subtype, value.value),
        )
    }

    fn write_ext_string(&mut self, value: &ExtString) -> Result<()> {
        let payload = self.string_form(&value.value);
        self.scalar(
            "write_ext_string",
            &format!("@es [{}, {}]", value.subtype, payload),
        )
    }

    fn write_ref(&mut self, value: &ObjectRef) -> Result<()> {
        let text = if value.is_local_only() {
            format!("@ref {}", self.string_form(&value.local_id))
        } else {
            format!(
                "@ref {{ns: {}, localId: {}, type: {}, policy: {}}}",
                self.string_form(&value.namespace),
                self.string_form(&value.local_id),
                value.kind,
                value.policy
            )
        };
        self.scalar("write_ref", &text)
    }

    fn write_start_object(&mut self, class_id: Option<&String>) -> Result<()> {
        self.start_container(ContextType::Object, class_id.cloned(), self.options.style)
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.end_container(ContextType::Object)
    }

    fn write_start_array(&mut self, class_id: Option<&String>) -> Result<()> {
        self.start_container(ContextType::Array, class_id.cloned(), self.options.style)
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.end_container(ContextType::Array)
    }

    fn write_start_header(&mut self) -> Result<()> {
        ensure_header_allowed(&self.stack)?;
        let begin = self
            .stack
            .current_mut()
            .scratch
            .begin
            .take()
            .ok_or_else(|| Error::protocol("a header must precede the container's members"))?;
        self.token("@{");
        let mut count = 0;
        if let Some(name) = &begin.class_id {
            self.token(CLASS_NAME_FIELD);
            self.punct(": ");
            let form = self.string_form(name);
            self.token(&form);
            count = 1;
        }
        self.stack.push(
            ContextType::Header,
            initial_state(ContextType::Header),
            Frame {
                style: ObjectStyle::Flow,
                begin: None,
                then_open: Some(begin.open),
            },
        )?;
        self.stack.current_mut().count = count;
        Ok(())
    }

    fn write_end_header(&mut self) -> Result<()> {
        ensure_end_allowed(&self.stack, ContextType::Header)?;
        self.punct("}");
        let frame = self.stack.pop(ContextType::Header)?;
        if let Some(open) = frame.scratch.then_open {
            self.punct(&open.to_string());
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> TextWriter {
        TextWriter::new(&DsonOptions::default())
    }

    #[test]
    fn test_scalar_forms() {
        let mut w = writer();
        w.write_start_array(None).unwrap();
        w.write_int32(1, WireType::VarInt).unwrap();
        w.write_int64(2, WireType::VarInt).unwrap();
        w.write_int64(5_000_000_000, WireType::VarInt).unwrap();
        w.write_float(1.5).unwrap();
        w.write_double(2.0).unwrap();
        w.write_double(f64::NEG_INFINITY).unwrap();
        w.write_bool(false).unwrap();
        w.write_null().unwrap();
        w.write_string("plain").unwrap();
        w.write_string("42").unwrap();
        w.write_string("a b").unwrap();
        w.write_end_array().unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            "-- [1, @L 2, 5000000000, @f 1.5, 2.0, @d -inf, false, null, plain, \"42\", \"a b\"]"
        );
    }

    #[test]
    fn test_extension_forms() {
        let mut w = writer();
        w.write_start_array(None).unwrap();
        w.write_binary(&Binary::new(3, vec![0x0a, 0xff])).unwrap();
        w.write_ext_int32(&ExtInt32::new(1, -5), WireType::VarInt).unwrap();
        w.write_ext_string(&ExtString::new(4, "")).unwrap();
        w.write_ref(&ObjectRef::local("obj7")).unwrap();
        w.write_end_array().unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            "-- [@bin [3, 0aff], @ei [1, -5], @es [4, \"\"], @ref obj7]"
        );
    }

    #[test]
    fn test_header_block_with_class_name() {
        let mut w = writer();
        w.write_start_object(Some(&"Point".to_string())).unwrap();
        w.write_start_header().unwrap();
        w.write_name("v".to_string()).unwrap();
        w.write_int32(2, WireType::VarInt).unwrap();
        w.write_end_header().unwrap();
        w.write_name("x".to_string()).unwrap();
        w.write_int32(1, WireType::VarInt).unwrap();
        w.write_end_object().unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            "-- @{clsName: Point, v: 2}{x: 1}"
        );
    }

    #[test]
    fn test_header_after_member_rejected() {
        let mut w = writer();
        w.write_start_array(None).unwrap();
        w.write_null().unwrap();
        assert!(matches!(w.write_start_header(), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_protocol_order() {
        let mut w = writer();
        w.write_start_object(None).unwrap();
        assert!(w.write_int32(1, WireType::VarInt).is_err());
        w.write_name("a".to_string()).unwrap();
        assert!(w.write_name("b".to_string()).is_err());
        assert!(w.write_end_object().is_err());
        w.write_null().unwrap();
        w.write_end_object().unwrap();
        assert!(w.write_name("c".to_string()).is_err());
    }

    #[test]
    fn test_top_level_values_on_own_lines() {
        let mut w = writer();
        w.write_int32(1, WireType::VarInt).unwrap();
        w.write_string("x").unwrap();
        assert_eq!(w.into_string().unwrap(), "-- 1\n-- x");
    }

    #[test]
    fn test_long_text_block() {
        let mut w = writer();
        w.write_start_array(None).unwrap();
        w.write_string("one\ntwo").unwrap();
        w.write_int32(3, WireType::VarInt).unwrap();
        w.write_end_array().unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            "-- [@ss one\n-> two\n-- , 3]"
        );
    }

    #[test]
    fn test_indent_style() {
        let mut w = writer();
        w.write_start_object_styled(None, ObjectStyle::Indent).unwrap();
        w.write_name("a".to_string()).unwrap();
        w.write_int32(1, WireType::VarInt).unwrap();
        w.write_name("b".to_string()).unwrap();
        w.write_start_array(None).unwrap();
        w.write_end_array().unwrap();
        w.write_end_object().unwrap();
        assert_eq!(w.into_string().unwrap(), "-- {\n--   a: 1,\n--   b: []\n-- }");
    }

    #[test]
    fn test_soft_wrap() {
        let mut w = TextWriter::new(&DsonOptions::new().with_soft_line_length(12));
        w.write_start_array(None).unwrap();
        for i in 0..4 {
            w.write_int32(1000 + i, WireType::VarInt).unwrap();
        }
        w.write_end_array().unwrap();
        let text = w.into_string().unwrap();
        assert!(text.lines().skip(1).all(|line| line.starts_with("-| ")));
        assert!(text.lines().count() > 1);
    }

    #[test]
    fn test_unclosed_container() {
        let mut w = writer();
        w.write_start_array(None).unwrap();
        assert!(w.into_string().is_err());
    }

    #[test]
    fn test_reserved_class_name_uses_header_form() {
        let mut w = writer();
        w.write_start_array(Some(&"ref".to_string())).unwrap();
        w.write_end_array().unwrap();
        assert_eq!(w.into_string().unwrap(), "-- @{clsName: ref}[]");
    }
}
