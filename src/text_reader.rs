//! Text codec reader.
//!
//! The text wire order is *name, then value*; the reader presents it in the
//! shared *type, name, value* order by decoding the name and the value token
//! together in [`read_dson_type`](DsonReader::read_dson_type) and handing them
//! out on the following calls.
//!
//! Structural sugar is resolved here:
//!
//! - `@Name{...}` / `@Name[...]` give the container a class id and a synthesized
//!   header `{clsName: Name}`
//! - `@{k: v, ...}{...}` attaches a header block; its `clsName`, if any, is the class id
//! - `@bin`, `@ei`, `@eL`, `@es` read a `[subtype, payload]` pair
//! - `@ref id` or `@ref {ns: .., localId: .., type: .., policy: ..}` read a reference
//!
//! ```rust
//! use dson::{DsonOptions, DsonReader, DsonType, TextReader};
//!
//! let mut reader = TextReader::new("-- @Point{x: 1}", &DsonOptions::default());
//! assert_eq!(reader.read_dson_type().unwrap(), DsonType::Object);
//! assert_eq!(reader.class_id().map(String::as_str), Some("Point"));
//! reader.read_start_object().unwrap();
//! assert_eq!(reader.read_dson_type().unwrap(), DsonType::Header);
//! reader.skip_value().unwrap();
//! assert_eq!(reader.read_dson_type().unwrap(), DsonType::Int32);
//! assert_eq!(reader.read_name().unwrap(), "x");
//! assert_eq!(reader.read_int32().unwrap(), 1);
//! ```

use crate::context::ContextStack;
use crate::error::{Error, Result};
use crate::line_buffer::LineBuffer;
use crate::options::DsonOptions;
use crate::reader::{
    ensure_state, ensure_value, skip_container, skip_members, state_after_type, value_consumed,
    DsonReader,
};
use crate::tokenizer::{classify_unquoted, Token, Tokenizer};
use crate::types::{ContextType, DsonType, ReaderState};
use crate::value::{Binary, DsonValue, ExtInt32, ExtInt64, ExtString, ObjectRef};
use std::collections::VecDeque;

/// Header field that carries the class name.
pub const CLASS_NAME_FIELD: &str = "clsName";

#[derive(Debug, Default)]
struct Frame {
    need_comma: bool,
    /// Header tokens to replay when the header member is entered.
    header: Option<Vec<Token>>,
}

/// Reads Dson text.
#[derive(Debug)]
pub struct TextReader {
    tokenizer: Tokenizer,
    queue: VecDeque<Token>,
    stack: ContextStack<ReaderState, Frame>,
    current_type: Option<DsonType>,
    current_name: Option<String>,
    pending: Option<DsonValue>,
    pending_header: Option<Vec<Token>>,
    class_id: Option<String>,
}

impl TextReader {
    pub fn new(text: &str, options: &DsonOptions) -> Self {
        Self::from_line_buffer(LineBuffer::new(text), options)
    }

    pub fn from_line_buffer(buffer: LineBuffer, options: &DsonOptions) -> Self {
        TextReader {
            tokenizer: Tokenizer::new(buffer),
            queue: VecDeque::new(),
            stack: ContextStack::new(ReaderState::Initial, options.recursion_limit),
            current_type: None,
            current_name: None,
            pending: None,
            pending_header: None,
            class_id: None,
        }
    }

    fn next(&mut self) -> Result<Token> {
        match self.queue.pop_front() {
            Some(token) => Ok(token),
            None => self.tokenizer.next_token(),
        }
    }

    fn error(&self, msg: &str) -> Error {
        let (line, col) = self.tokenizer.position();
        Error::syntax(line, col, msg)
    }

    fn unexpected(&self, token: &Token, expected: &str) -> Error {
        if *token == Token::Eof {
            let (line, col) = self.tokenizer.position();
            Error::unexpected_eof(line, col, expected)
        } else {
            self.error(&format!("expected {}, found {:?}", expected, token))
        }
    }

    /// `true` when `token` closes the current context.
    fn is_end(&self, context_type: ContextType, token: &Token) -> Result<bool> {
        match (context_type, token) {
            (ContextType::TopLevel, Token::Eof) => Ok(true),
            (ContextType::Object | ContextType::Header, Token::EndObject) => Ok(true),
            (ContextType::Array, Token::EndArray) => Ok(true),
            (ContextType::TopLevel, Token::EndObject | Token::EndArray) => {
                Err(self.error("unbalanced closing bracket"))
            }
            (ContextType::Object | ContextType::Header, Token::EndArray)
            | (ContextType::Array, Token::EndObject) => Err(self.error("mismatched closing bracket")),
            (_, Token::Eof) => Err(self.unexpected(token, "closing bracket")),
            _ => Ok(false),
        }
    }

    fn pend(&mut self, value: DsonValue) -> DsonType {
        let ty = value.dson_type();
        self.pending = Some(value);
        ty
    }

    fn classify_value(&mut self, token: Token) -> Result<DsonType> {
        Ok(match token {
            Token::Int32(v) => self.pend(DsonValue::Int32(v)),
            Token::Int64(v) => self.pend(DsonValue::Int64(v)),
            Token::Float(v) => self.pend(DsonValue::Float(v)),
            Token::Double(v) => self.pend(DsonValue::Double(v)),
            Token::Bool(v) => self.pend(DsonValue::Bool(v)),
            Token::Null => self.pend(DsonValue::Null),
            Token::String(s) => self.pend(DsonValue::String(s)),
            Token::UnquotedString(s) => match classify_unquoted(&s) {
                Token::UnquotedString(_) => self.pend(DsonValue::String(s)),
                literal => return self.classify_value(literal),
            },
            Token::BeginObject => DsonType::Object,
            Token::BeginArray => DsonType::Array,
            Token::Header(name) => return self.classify_header(name),
            other => return Err(self.unexpected(&other, "a value")),
        })
    }

    fn classify_header(&mut self, name: String) -> Result<DsonType> {
        match name.as_str() {
            "{" => {
                let block = self.collect_header_block()?;
                self.class_id = find_class_name(&block);
                let ty = self.container_after_header()?;
                self.pending_header = Some(block);
                Ok(ty)
            }
            "bin" => {
                let (subtype, payload) = self.read_pair("bin")?;
                let subtype = u8::try_from(self.int_of(&subtype)?)
                    .map_err(|_| self.error("binary subtype out of range"))?;
                let data = hex::decode(self.text_of(payload)?)
                    .map_err(|e| self.error(&format!("invalid hex payload: {}", e)))?;
                Ok(self.pend(DsonValue::Binary(Binary { subtype, data })))
            }
            "ei" => {
                let (subtype, value) = self.read_pair("ei")?;
                let subtype = self.int32_of(&subtype)?;
                let value = self.int32_of(&value)?;
                Ok(self.pend(DsonValue::ExtInt32(ExtInt32 { subtype, value })))
            }
            "eL" => {
                let (subtype, value) = self.read_pair("eL")?;
                let subtype = self.int32_of(&subtype)?;
                let value = self.int_of(&value)?;
                Ok(self.pend(DsonValue::ExtInt64(ExtInt64 { subtype, value })))
            }
            "es" => {
                let (subtype, value) = self.read_pair("es")?;
                let subtype = self.int32_of(&subtype)?;
                let value = self.text_of(value)?;
                Ok(self.pend(DsonValue::ExtString(ExtString { subtype, value })))
            }
            "ref" => {
                let reference = self.read_ref_body()?;
                Ok(self.pend(DsonValue::Reference(reference)))
            }
            _ => {
                let ty = self.container_after_header()?;
                self.pending_header = Some(vec![
                    Token::UnquotedString(CLASS_NAME_FIELD.to_string()),
                    Token::Colon,
                    Token::String(name.clone()),
                    Token::EndObject,
                ]);
                self.class_id = Some(name);
                Ok(ty)
            }
        }
    }

    fn container_after_header(&mut self) -> Result<DsonType> {
        match self.next()? {
            Token::BeginObject => Ok(DsonType::Object),
            Token::BeginArray => Ok(DsonType::Array),
            other => Err(self.unexpected(&other, "'{' or '[' after header")),
        }
    }

    /// Reads `{ ... }` after `@` and returns the inner tokens with the closing brace.
    fn collect_header_block(&mut self) -> Result<Vec<Token>> {
        match self.next()? {
            Token::BeginObject => {}
            other => return Err(self.unexpected(&other, "'{' opening a header block")),
        }
        let mut depth = 1usize;
        let mut block = Vec::new();
        while depth > 0 {
            let token = self.next()?;
            match token {
                Token::BeginObject | Token::BeginArray => depth += 1,
                Token::EndObject | Token::EndArray => depth -= 1,
                Token::Eof => return Err(self.unexpected(&token, "end of header block")),
                _ => {}
            }
            block.push(token);
        }
        Ok(block)
    }

    /// Reads `[first, second]`, tolerating a trailing comma.
    fn read_pair(&mut self, sugar: &str) -> Result<(Token, Token)> {
        let expected = format!("'[' after '@{}'", sugar);
        match self.next()? {
            Token::BeginArray => {}
            other => return Err(self.unexpected(&other, &expected)),
        }
        let first = self.next()?;
        match self.next()? {
            Token::Comma => {}
            other => return Err(self.unexpected(&other, "','")),
        }
        let second = self.next()?;
        let mut close = self.next()?;
        if close == Token::Comma {
            close = self.next()?;
        }
        if close != Token::EndArray {
            return Err(self.unexpected(&close, "']'"));
        }
        Ok((first, second))
    }

    fn int_of(&self, token: &Token) -> Result<i64> {
        match token {
            Token::Int32(v) => Ok(*v as i64),
            Token::Int64(v) => Ok(*v),
            Token::UnquotedString(s) | Token::String(s) => s
                .parse()
                .map_err(|_| self.error(&format!("expected an integer, found '{}'", s))),
            other => Err(self.unexpected(other, "an integer")),
        }
    }

    fn int32_of(&self, token: &Token) -> Result<i32> {
        i32::try_from(self.int_of(token)?).map_err(|_| self.error("integer out of i32 range"))
    }

    fn text_of(&self, token: Token) -> Result<String> {
        match token {
            Token::UnquotedString(s) | Token::String(s) => Ok(s),
            other => Err(self.unexpected(&other, "a string")),
        }
    }

    fn read_ref_body(&mut self) -> Result<ObjectRef> {
        match self.next()? {
            Token::BeginObject => {}
            Token::UnquotedString(s) | Token::String(s) => return Ok(ObjectRef::local(s)),
            other => return Err(self.unexpected(&other, "reference id or '{'")),
        }
        let mut reference = ObjectRef::default();
        loop {
            let mut token = self.next()?;
            if token == Token::Comma {
                token = self.next()?;
            }
            let field = match token {
                Token::EndObject => return Ok(reference),
                Token::UnquotedString(s) | Token::String(s) => s,
                other => return Err(self.unexpected(&other, "reference field")),
            };
            match self.next()? {
                Token::Colon => {}
                other => return Err(self.unexpected(&other, "':'")),
            }
            let value = self.next()?;
            match field.as_str() {
                "ns" => reference.namespace = self.text_of(value)?,
                "localId" => reference.local_id = self.text_of(value)?,
                "type" => reference.kind = self.int32_of(&value)?,
                "policy" => reference.policy = self.int32_of(&value)?,
                other => return Err(self.error(&format!("unknown reference field '{}'", other))),
            }
        }
    }

    fn take_value(&mut self, accepted: &[DsonType], op: &str) -> Result<DsonValue> {
        ensure_value(&self.stack, self.current_type, accepted, op)?;
        let value = self
            .pending
            .take()
            .ok_or_else(|| Error::protocol(format!("{}: value already consumed", op)))?;
        self.finish_value();
        Ok(value)
    }

    fn finish_value(&mut self) {
        value_consumed(&mut self.stack);
        self.stack.current_mut().scratch.need_comma = true;
    }

    fn end_container(&mut self, context_type: ContextType) -> Result<()> {
        ensure_state(&self.stack, ReaderState::WaitEndObject, "read_end_*")?;
        self.stack.pop(context_type)?;
        if context_type == ContextType::Header {
            value_consumed(&mut self.stack);
        } else {
            self.finish_value();
        }
        Ok(())
    }
}

/// Finds the top-level `clsName: value` pair of a header block.
fn find_class_name(block: &[Token]) -> Option<String> {
    let mut depth = 0usize;
    for (i, token) in block.iter().enumerate() {
        match token {
            Token::BeginObject | Token::BeginArray => depth += 1,
            Token::EndObject | Token::EndArray => depth = depth.saturating_sub(1),
            Token::UnquotedString(name) | Token::String(name)
                if depth == 0 && name == CLASS_NAME_FIELD =>
            {
                if let (Some(Token::Colon), Some(Token::UnquotedString(v) | Token::String(v))) =
                    (block.get(i + 1), block.get(i + 2))
                {
                    return Some(v.clone());
                }
            }
            _ => {}
        }
    }
    None
}

impl DsonReader for TextReader {
    type Name = String;

    fn context_type(&self) -> ContextType {
        self.stack.context_type()
    }

    fn state(&self) -> ReaderState {
        self.stack.state()
    }

    fn current_type(&self) -> Option<DsonType> {
        self.current_type
    }

    fn current_name(&self) -> Option<&String> {
        self.current_name.as_ref()
    }

    fn class_id(&self) -> Option<&String> {
        self.class_id.as_ref()
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn read_dson_type(&mut self) -> Result<DsonType> {
        match self.stack.state() {
            ReaderState::Initial | ReaderState::Type => {}
            state => {
                return Err(Error::protocol(format!(
                    "read_dson_type called in state {:?}",
                    state
                )))
            }
        }
        self.current_name = None;
        self.class_id = None;
        self.pending = None;
        self.pending_header = None;

        let context_type = self.stack.context_type();
        let frame = self.stack.current();
        let count = frame.count;
        let need_comma = frame.scratch.need_comma;

        if count == 0 && frame.scratch.header.is_some() {
            self.stack.set_state(ReaderState::Value);
            self.current_type = Some(DsonType::Header);
            return Ok(DsonType::Header);
        }

        let mut token = self.next()?;
        if token == Token::Comma {
            if !need_comma {
                return Err(self.error("unexpected ','"));
            }
            token = self.next()?;
        } else if need_comma
            && context_type != ContextType::TopLevel
            && !self.is_end(context_type, &token)?
        {
            return Err(self.unexpected(&token, "','"));
        }

        if self.is_end(context_type, &token)? {
            let state = state_after_type(context_type, count, DsonType::EndOfObject)?;
            self.stack.set_state(state);
            self.current_type = Some(DsonType::EndOfObject);
            return Ok(DsonType::EndOfObject);
        }

        if context_type.is_like_object() {
            let name = match token {
                Token::UnquotedString(s) | Token::String(s) => s,
                other => return Err(self.unexpected(&other, "field name")),
            };
            match self.next()? {
                Token::Colon => {}
                other => return Err(self.unexpected(&other, "':' after field name")),
            }
            self.current_name = Some(name);
            token = self.next()?;
        }

        let ty = self.classify_value(token)?;
        let state = state_after_type(context_type, count, ty)?;
        self.stack.set_state(state);
        self.current_type = Some(ty);
        Ok(ty)
    }

    fn read_name(&mut self) -> Result<String> {
        ensure_state(&self.stack, ReaderState::Name, "read_name")?;
        self.stack.set_state(ReaderState::Value);
        self.current_name
            .clone()
            .ok_or_else(|| Error::protocol("no pending name"))
    }

    fn read_int32(&mut self) -> Result<i32> {
        match self.take_value(&[DsonType::Int32], "read_int32")? {
            DsonValue::Int32(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Int32, other.dson_type())),
        }
    }

    fn read_int64(&mut self) -> Result<i64> {
        match self.take_value(&[DsonType::Int64, DsonType::Int32], "read_int64")? {
            DsonValue::Int64(v) => Ok(v),
            DsonValue::Int32(v) => Ok(v as i64),
            other => Err(Error::type_mismatch(DsonType::Int64, other.dson_type())),
        }
    }

    fn read_float(&mut self) -> Result<f32> {
        match self.take_value(&[DsonType::Float], "read_float")? {
            DsonValue::Float(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Float, other.dson_type())),
        }
    }

    fn read_double(&mut self) -> Result<f64> {
        match self.take_value(&[DsonType::Double, DsonType::Float], "read_double")? {
            DsonValue::Double(v) => Ok(v),
            DsonValue::Float(v) => Ok(v as f64),
            other => Err(Error::type_mismatch(DsonType::Double, other.dson_type())),
        }
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.take_value(&[DsonType::Boolean], "read_bool")? {
            DsonValue::Bool(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Boolean, other.dson_type())),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        match self.take_value(&[DsonType::String], "read_string")? {
            DsonValue::String(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::String, other.dson_type())),
        }
    }

    fn read_null(&mut self) -> Result<()> {
        self.take_value(&[DsonType::Null], "read_null").map(|_| ())
    }

    fn read_binary(&mut self) -> Result<Binary> {
        match self.take_value(&[DsonType::Binary], "read_binary")? {
            DsonValue::Binary(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Binary, other.dson_type())),
        }
    }

    fn read_ext_int32(&mut self) -> Result<ExtInt32> {
        match self.take_value(&[DsonType::ExtInt32], "read_ext_int32")? {
            DsonValue::ExtInt32(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::ExtInt32, other.dson_type())),
        }
    }

    fn read_ext_int64(&mut self) -> Result<ExtInt64> {
        match self.take_value(&[DsonType::ExtInt64], "read_ext_int64")? {
            DsonValue::ExtInt64(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::ExtInt64, other.dson_type())),
        }
    }

    fn read_ext_string(&mut self) -> Result<ExtString> {
        match self.take_value(&[DsonType::ExtString], "read_ext_string")? {
            DsonValue::ExtString(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::ExtString, other.dson_type())),
        }
    }

    fn read_ref(&mut self) -> Result<ObjectRef> {
        match self.take_value(&[DsonType::Reference], "read_ref")? {
            DsonValue::Reference(v) => Ok(v),
            other => Err(Error::type_mismatch(DsonType::Reference, other.dson_type())),
        }
    }

    fn read_start_object(&mut self) -> Result<()> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Object], "read_start_object")?;
        let header = self.pending_header.take();
        self.stack.push(
            ContextType::Object,
            ReaderState::Type,
            Frame {
                need_comma: false,
                header,
            },
        )
    }

    fn read_end_object(&mut self) -> Result<()> {
        self.end_container(ContextType::Object)
    }

    fn read_start_array(&mut self) -> Result<()> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Array], "read_start_array")?;
        let header = self.pending_header.take();
        self.stack.push(
            ContextType::Array,
            ReaderState::Type,
            Frame {
                need_comma: false,
                header,
            },
        )
    }

    fn read_end_array(&mut self) -> Result<()> {
        self.end_container(ContextType::Array)
    }

    fn read_start_header(&mut self) -> Result<()> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Header], "read_start_header")?;
        let tokens = self
            .stack
            .current_mut()
            .scratch
            .header
            .take()
            .ok_or_else(|| Error::protocol("no header to read"))?;
        for token in tokens.into_iter().rev() {
            self.queue.push_front(token);
        }
        self.stack
            .push(ContextType::Header, ReaderState::Type, Frame::default())
    }

    fn read_end_header(&mut self) -> Result<()> {
        self.end_container(ContextType::Header)
    }

    fn skip_name(&mut self) -> Result<()> {
        ensure_state(&self.stack, ReaderState::Name, "skip_name")?;
        self.stack.set_state(ReaderState::Value);
        Ok(())
    }

    fn skip_value(&mut self) -> Result<()> {
        ensure_state(&self.stack, ReaderState::Value, "skip_value")?;
        match self.current_type {
            Some(ty) if ty.is_container_or_header() => skip_container(self, ty),
            Some(_) => {
                self.pending = None;
                self.finish_value();
                Ok(())
            }
            None => Err(Error::protocol("skip_value called with no pending type")),
        }
    }

    fn skip_to_end_of_object(&mut self) -> Result<()> {
        skip_members(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> TextReader {
        TextReader::new(text, &DsonOptions::default())
    }

    #[test]
    fn test_object_fields_in_order() {
        let mut r = reader("-- {x: 1, y: 2}");
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Object);
        r.read_start_object().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Int32);
        assert_eq!(r.read_name().unwrap(), "x");
        assert_eq!(r.read_int32().unwrap(), 1);
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Int32);
        assert_eq!(r.read_name().unwrap(), "y");
        assert_eq!(r.read_int64().unwrap(), 2);
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        assert_eq!(r.state(), ReaderState::WaitEndObject);
        r.read_end_object().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        assert_eq!(r.state(), ReaderState::EndOfFile);
        assert!(r.read_dson_type().is_err());
    }

    #[test]
    fn test_protocol_violations() {
        let mut r = reader("-- {x: 1}");
        assert!(matches!(r.read_int32(), Err(Error::Protocol(_))));
        r.read_dson_type().unwrap();
        r.read_start_object().unwrap();
        r.read_dson_type().unwrap();
        // value before name
        assert!(matches!(r.read_int32(), Err(Error::Protocol(_))));
        r.read_name().unwrap();
        assert!(matches!(r.read_string(), Err(Error::TypeMismatch { .. })));
        r.read_int32().unwrap();
        // second read of the same value
        assert!(matches!(r.read_int32(), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_missing_comma() {
        let mut r = reader("-- [1 2]");
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        r.read_dson_type().unwrap();
        r.read_int32().unwrap();
        assert!(r.read_dson_type().unwrap_err().is_syntax());
    }

    #[test]
    fn test_trailing_comma_and_top_level_sequence() {
        let mut r = reader("-- [1, 2,]\n-- true, null");
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        r.read_dson_type().unwrap();
        r.skip_value().unwrap();
        r.read_dson_type().unwrap();
        r.skip_value().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        r.read_end_array().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Boolean);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Null);
        r.read_null().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
    }

    #[test]
    fn test_extension_sugar() {
        let text = "-- [@bin [3, \"0aff\"], @ei [1, -5], @eL [2, 9000000000], @es [4, hi], @ref obj7, @ref {ns: a, localId: b, type: 1, policy: 2}]";
        let mut r = reader(text);
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Binary);
        assert_eq!(r.read_binary().unwrap(), Binary::new(3, vec![0x0a, 0xff]));
        assert_eq!(r.read_dson_type().unwrap(), DsonType::ExtInt32);
        assert_eq!(r.read_ext_int32().unwrap(), ExtInt32::new(1, -5));
        assert_eq!(r.read_dson_type().unwrap(), DsonType::ExtInt64);
        assert_eq!(r.read_ext_int64().unwrap(), ExtInt64::new(2, 9_000_000_000));
        assert_eq!(r.read_dson_type().unwrap(), DsonType::ExtString);
        assert_eq!(r.read_ext_string().unwrap(), ExtString::new(4, "hi"));
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Reference);
        assert_eq!(r.read_ref().unwrap(), ObjectRef::local("obj7"));
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Reference);
        assert_eq!(
            r.read_ref().unwrap(),
            ObjectRef {
                namespace: "a".into(),
                local_id: "b".into(),
                kind: 1,
                policy: 2
            }
        );
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
    }

    #[test]
    fn test_header_block() {
        let mut r = reader("-- @{clsName: Pair, v: 2}[1, 2]");
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Array);
        assert_eq!(r.class_id().map(String::as_str), Some("Pair"));
        r.read_start_array().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Header);
        assert_eq!(r.current_name(), None);
        r.read_start_header().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::String);
        assert_eq!(r.read_name().unwrap(), CLASS_NAME_FIELD);
        assert_eq!(r.read_string().unwrap(), "Pair");
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Int32);
        assert_eq!(r.read_name().unwrap(), "v");
        r.skip_value().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        r.read_end_header().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Int32);
        assert_eq!(r.read_int32().unwrap(), 1);
        r.skip_to_end_of_object().unwrap();
        r.read_end_array().unwrap();
    }

    #[test]
    fn test_skip_nested() {
        let mut r = reader("-- {a: {b: [1, {c: 2}]}, d: 3}");
        r.read_dson_type().unwrap();
        r.read_start_object().unwrap();
        r.read_dson_type().unwrap();
        r.skip_name().unwrap();
        r.skip_value().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Int32);
        assert_eq!(r.read_name().unwrap(), "d");
    }

    #[test]
    fn test_long_text_value() {
        let mut r = reader("-- {t: @ss line one\n-> line two\n-- , n: 1}");
        r.read_dson_type().unwrap();
        r.read_start_object().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::String);
        r.read_name().unwrap();
        assert_eq!(r.read_string().unwrap(), "line one\nline two");
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Int32);
        assert_eq!(r.read_name().unwrap(), "n");
    }

    #[test]
    fn test_recursion_limit() {
        let options = DsonOptions::new().with_recursion_limit(2);
        let mut r = TextReader::new("-- [[[]]]", &options);
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        r.read_dson_type().unwrap();
        let err = r.read_start_array().unwrap_err();
        assert_eq!(err, Error::RecursionLimit { limit: 2 });
    }

    #[test]
    fn test_mismatched_bracket() {
        let mut r = reader("-- [1}");
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        r.read_dson_type().unwrap();
        r.read_int32().unwrap();
        assert!(r.read_dson_type().unwrap_err().is_syntax());
    }
}
