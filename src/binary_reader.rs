//! Binary codec reader.
//!
//! The container prefix (length and class id) is consumed by
//! [`read_dson_type`](DsonReader::read_dson_type), so the class id is known
//! before the caller decides how to decode the container, and
//! [`skip_value`](DsonReader::skip_value) can jump straight to the end marker.
//! A length that points past the input is reported as
//! [`Error::Corrupted`]; a length that does not land on an end marker makes
//! skipping fall back to walking the members tag by tag.

use bytes::Buf;
use integer_encoding::VarInt;
use tracing::{trace, warn};

use crate::binary_writer::END_TAG;
use crate::context::ContextStack;
use crate::error::{Error, Result};
use crate::options::DsonOptions;
use crate::reader::{
    ensure_state, ensure_value, skip_container, skip_members, state_after_type, value_consumed,
    DsonReader,
};
use crate::types::{ClassId, ContextType, DsonType, FieldNumber, ReaderState, WireType};
use crate::value::{Binary, ExtInt32, ExtInt64, ExtString, ObjectRef};

#[derive(Debug, Default)]
struct Frame {
    /// Offset of the closing tag, when the length prefix is trusted.
    end: Option<usize>,
}

/// Reads Dson binary from a byte slice.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    input: &'a [u8],
    stack: ContextStack<ReaderState, Frame>,
    current_type: Option<DsonType>,
    current_name: Option<FieldNumber>,
    wire_bits: u8,
    class_id: Option<ClassId>,
    pending_end: Option<usize>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8], options: &DsonOptions) -> Self {
        BinaryReader {
            data,
            input: data,
            stack: ContextStack::new(ReaderState::Initial, options.recursion_limit),
            current_type: None,
            current_name: None,
            wire_bits: 0,
            class_id: None,
            pending_end: None,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.data.len() - self.input.len()
    }

    fn corrupted(&self, msg: &str) -> Error {
        Error::corrupted(format!("{} at byte {}", msg, self.position()))
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.input.remaining() < n {
            return Err(self.corrupted(&format!("{} more bytes expected", n)));
        }
        Ok(())
    }

    fn get_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.input.get_u8())
    }

    fn get_fixed32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.input.get_u32_le())
    }

    fn get_fixed64(&mut self) -> Result<u64> {
        self.need(8)?;
        Ok(self.input.get_u64_le())
    }

    fn get_varint(&mut self) -> Result<u64> {
        let (value, len) =
            u64::decode_var(self.input).ok_or_else(|| self.corrupted("malformed varint"))?;
        self.input.advance(len);
        Ok(value)
    }

    fn get_sint(&mut self) -> Result<i64> {
        let (value, len) =
            i64::decode_var(self.input).ok_or_else(|| self.corrupted("malformed varint"))?;
        self.input.advance(len);
        Ok(value)
    }

    fn get_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let input: &'a [u8] = self.input;
        let (head, tail) = input.split_at(n);
        self.input = tail;
        Ok(head)
    }

    fn get_string(&mut self) -> Result<String> {
        let len = self.get_varint()? as usize;
        let bytes = self.get_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| self.corrupted("invalid UTF-8 in string"))
    }

    fn wire_type(&self) -> Result<WireType> {
        WireType::from_number(self.wire_bits)
            .ok_or_else(|| self.corrupted(&format!("unknown wire type {}", self.wire_bits)))
    }

    fn get_int32(&mut self) -> Result<i32> {
        match self.wire_type()? {
            WireType::VarInt => i32::try_from(self.get_varint()? as i64)
                .map_err(|_| self.corrupted("varint out of int32 range")),
            WireType::Uint => u32::try_from(self.get_varint()?)
                .map(|v| v as i32)
                .map_err(|_| self.corrupted("uint out of int32 range")),
            WireType::Sint => i32::try_from(self.get_sint()?)
                .map_err(|_| self.corrupted("sint out of int32 range")),
            WireType::Fixed => Ok(self.get_fixed32()? as i32),
        }
    }

    fn get_int64(&mut self) -> Result<i64> {
        match self.wire_type()? {
            WireType::VarInt | WireType::Uint => Ok(self.get_varint()? as i64),
            WireType::Sint => self.get_sint(),
            WireType::Fixed => Ok(self.get_fixed64()? as i64),
        }
    }

    /// Reads a container's length prefix and returns the offset of its end tag.
    fn container_end(&mut self) -> Result<usize> {
        let len = self.get_fixed32()? as usize;
        let end = self.position() + len;
        if end >= self.data.len() {
            return Err(self.corrupted(&format!(
                "length prefix {} points past the end of the input",
                len
            )));
        }
        Ok(end)
    }

    fn read_class_id(&mut self) -> Result<Option<ClassId>> {
        match self.get_u8()? {
            0 => Ok(None),
            1 => {
                let namespace = self.get_u8()?;
                let local_id = self.get_fixed32()? as i32;
                Ok(Some(ClassId::new(namespace, local_id)))
            }
            other => Err(self.corrupted(&format!("invalid class id marker {}", other))),
        }
    }

    fn finish_value(&mut self) {
        value_consumed(&mut self.stack);
    }

    fn enter(&mut self, context_type: ContextType, ty: DsonType, op: &str) -> Result<()> {
        ensure_value(&self.stack, self.current_type, &[ty], op)?;
        let end = self.pending_end.take();
        self.stack
            .push(context_type, ReaderState::Type, Frame { end })
    }

    fn leave(&mut self, context_type: ContextType, op: &str) -> Result<()> {
        ensure_state(&self.stack, ReaderState::WaitEndObject, op)?;
        self.stack.pop(context_type)?;
        self.finish_value();
        Ok(())
    }

    /// Offset of the end tag of the pending container, if its prefix is consistent.
    fn trusted_end(&self, end: Option<usize>) -> Option<usize> {
        end.filter(|&end| self.data.get(end) == Some(&END_TAG))
    }

    fn jump_to(&mut self, offset: usize) {
        let data: &'a [u8] = self.data;
        self.input = &data[offset..];
    }
}

impl DsonReader for BinaryReader<'_> {
    type Name = FieldNumber;

    fn context_type(&self) -> ContextType {
        self.stack.context_type()
    }

    fn state(&self) -> ReaderState {
        self.stack.state()
    }

    fn current_type(&self) -> Option<DsonType> {
        self.current_type
    }

    fn current_name(&self) -> Option<&FieldNumber> {
        self.current_name.as_ref()
    }

    fn class_id(&self) -> Option<&ClassId> {
        self.class_id.as_ref()
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn read_dson_type(&mut self) -> Result<DsonType> {
        let state = self.stack.state();
        if state != ReaderState::Initial && state != ReaderState::Type {
            return Err(Error::protocol(format!(
                "read_dson_type called in state {:?}",
                state
            )));
        }
        self.class_id = None;
        self.pending_end = None;
        self.current_name = None;

        let context_type = self.stack.context_type();
        if self.input.is_empty() {
            if context_type != ContextType::TopLevel {
                return Err(self.corrupted("input ends inside a container"));
            }
            self.current_type = Some(DsonType::EndOfObject);
            self.stack.set_state(ReaderState::EndOfFile);
            return Ok(DsonType::EndOfObject);
        }

        let tag_at = self.position();
        let tag = self.get_u8()?;
        let ty = DsonType::from_number(tag >> 3)
            .ok_or_else(|| self.corrupted(&format!("invalid tag byte {}", tag)))?;
        self.wire_bits = tag & 0b111;

        if ty == DsonType::EndOfObject {
            if context_type == ContextType::TopLevel {
                return Err(self.corrupted("end marker at the top level"));
            }
            if let Some(end) = self.stack.current().scratch.end {
                if end != tag_at {
                    return Err(self.corrupted(&format!(
                        "container length prefix says the end is at byte {}",
                        end
                    )));
                }
            }
        }

        let count = self.stack.current().count;
        let next = state_after_type(context_type, count, ty)?;
        if context_type.is_like_object() && ty != DsonType::EndOfObject && ty != DsonType::Header {
            let raw = self.get_varint()?;
            let raw = u32::try_from(raw).map_err(|_| self.corrupted("field number too large"))?;
            self.current_name = Some(FieldNumber::from_raw(raw));
        }
        match ty {
            DsonType::Object | DsonType::Array => {
                self.pending_end = Some(self.container_end()?);
                self.class_id = self.read_class_id()?;
            }
            DsonType::Header => {
                self.pending_end = Some(self.container_end()?);
            }
            _ => {}
        }

        self.current_type = Some(ty);
        self.stack.set_state(next);
        Ok(ty)
    }

    fn read_name(&mut self) -> Result<FieldNumber> {
        ensure_state(&self.stack, ReaderState::Name, "read_name")?;
        let name = self
            .current_name
            .ok_or_else(|| Error::protocol("read_name with no pending field number"))?;
        self.stack.set_state(ReaderState::Value);
        Ok(name)
    }

    fn read_int32(&mut self) -> Result<i32> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Int32], "read_int32")?;
        let value = self.get_int32()?;
        self.finish_value();
        Ok(value)
    }

    fn read_int64(&mut self) -> Result<i64> {
        let ty = ensure_value(
            &self.stack,
            self.current_type,
            &[DsonType::Int64, DsonType::Int32],
            "read_int64",
        )?;
        let value = if ty == DsonType::Int32 {
            i64::from(self.get_int32()?)
        } else {
            self.get_int64()?
        };
        self.finish_value();
        Ok(value)
    }

    fn read_float(&mut self) -> Result<f32> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Float], "read_float")?;
        let value = f32::from_bits(self.get_fixed32()?);
        self.finish_value();
        Ok(value)
    }

    fn read_double(&mut self) -> Result<f64> {
        let ty = ensure_value(
            &self.stack,
            self.current_type,
            &[DsonType::Double, DsonType::Float],
            "read_double",
        )?;
        let value = if ty == DsonType::Float {
            f64::from(f32::from_bits(self.get_fixed32()?))
        } else {
            f64::from_bits(self.get_fixed64()?)
        };
        self.finish_value();
        Ok(value)
    }

    fn read_bool(&mut self) -> Result<bool> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Boolean], "read_bool")?;
        let value = match self.wire_bits {
            0 => false,
            1 => true,
            other => return Err(self.corrupted(&format!("invalid boolean bits {}", other))),
        };
        self.finish_value();
        Ok(value)
    }

    fn read_string(&mut self) -> Result<String> {
        ensure_value(&self.stack, self.current_type, &[DsonType::String], "read_string")?;
        let value = self.get_string()?;
        self.finish_value();
        Ok(value)
    }

    fn read_null(&mut self) -> Result<()> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Null], "read_null")?;
        self.finish_value();
        Ok(())
    }

    fn read_binary(&mut self) -> Result<Binary> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Binary], "read_binary")?;
        let len = self.get_fixed32()? as usize;
        if len == 0 {
            return Err(self.corrupted("binary value without a subtype"));
        }
        let subtype = self.get_u8()?;
        let data = self.get_bytes(len - 1)?.to_vec();
        self.finish_value();
        Ok(Binary { subtype, data })
    }

    fn read_ext_int32(&mut self) -> Result<ExtInt32> {
        ensure_value(&self.stack, self.current_type, &[DsonType::ExtInt32], "read_ext_int32")?;
        let subtype = self.get_varint()? as u32 as i32;
        let value = self.get_int32()?;
        self.finish_value();
        Ok(ExtInt32 { subtype, value })
    }

    fn read_ext_int64(&mut self) -> Result<ExtInt64> {
        ensure_value(&self.stack, self.current_type, &[DsonType::ExtInt64], "read_ext_int64")?;
        let subtype = self.get_varint()? as u32 as i32;
        let value = self.get_int64()?;
        self.finish_value();
        Ok(ExtInt64 { subtype, value })
    }

    fn read_ext_string(&mut self) -> Result<ExtString> {
        ensure_value(&self.stack, self.current_type, &[DsonType::ExtString], "read_ext_string")?;
        let subtype = self.get_varint()? as u32 as i32;
        let value = self.get_string()?;
        self.finish_value();
        Ok(ExtString { subtype, value })
    }

    fn read_ref(&mut self) -> Result<ObjectRef> {
        ensure_value(&self.stack, self.current_type, &[DsonType::Reference], "read_ref")?;
        let len = self.get_fixed32()? as usize;
        let end = self.position() + len;
        let namespace = self.get_string()?;
        let local_id = self.get_string()?;
        self.wire_bits = WireType::VarInt.number();
        let kind = self.get_int32()?;
        let policy = self.get_int32()?;
        if self.position() != end {
            return Err(self.corrupted("reference length does not match its fields"));
        }
        self.finish_value();
        Ok(ObjectRef {
            namespace,
            local_id,
            kind,
            policy,
        })
    }

    fn read_start_object(&mut self) -> Result<()> {
        self.enter(ContextType::Object, DsonType::Object, "read_start_object")
    }

    fn read_end_object(&mut self) -> Result<()> {
        self.leave(ContextType::Object, "read_end_object")
    }

    fn read_start_array(&mut self) -> Result<()> {
        self.enter(ContextType::Array, DsonType::Array, "read_start_array")
    }

    fn read_end_array(&mut self) -> Result<()> {
        self.leave(ContextType::Array, "read_end_array")
    }

    fn read_start_header(&mut self) -> Result<()> {
        self.enter(ContextType::Header, DsonType::Header, "read_start_header")
    }

    fn read_end_header(&mut self) -> Result<()> {
        self.leave(ContextType::Header, "read_end_header")
    }

    fn skip_name(&mut self) -> Result<()> {
        self.read_name().map(drop)
    }

    fn skip_value(&mut self) -> Result<()> {
        ensure_state(&self.stack, ReaderState::Value, "skip_value")?;
        let ty = self
            .current_type
            .ok_or_else(|| Error::protocol("skip_value with no pending type"))?;
        match ty {
            DsonType::Object | DsonType::Array | DsonType::Header => {
                if let Some(end) = self.trusted_end(self.pending_end) {
                    trace!(end, "skipped container by length");
                    self.pending_end = None;
                    self.jump_to(end + 1);
                    self.finish_value();
                    Ok(())
                } else {
                    warn!(
                        position = self.position(),
                        "container length prefix is inconsistent, skipping member by member"
                    );
                    self.pending_end = None;
                    skip_container(self, ty)
                }
            }
            DsonType::Int32 => self.read_int32().map(drop),
            DsonType::Int64 => self.read_int64().map(drop),
            DsonType::Float => self.read_float().map(drop),
            DsonType::Double => self.read_double().map(drop),
            DsonType::Boolean => self.read_bool().map(drop),
            DsonType::String => self.read_string().map(drop),
            DsonType::Null => self.read_null(),
            DsonType::Binary => self.read_binary().map(drop),
            DsonType::ExtString => self.read_ext_string().map(drop),
            DsonType::ExtInt32 => self.read_ext_int32().map(drop),
            DsonType::ExtInt64 => self.read_ext_int64().map(drop),
            DsonType::Reference => self.read_ref().map(drop),
            DsonType::EndOfObject => Err(Error::protocol("skip_value at end of container")),
        }
    }

    fn skip_to_end_of_object(&mut self) -> Result<()> {
        if self.stack.state() == ReaderState::WaitEndObject {
            return Ok(());
        }
        match self.trusted_end(self.stack.current().scratch.end) {
            Some(end) if self.stack.context_type() != ContextType::TopLevel => {
                self.jump_to(end);
                self.stack.set_state(ReaderState::Type);
                self.read_dson_type().map(drop)
            }
            _ => skip_members(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_writer::BinaryWriter;
    use crate::writer::DsonWriter;

    fn encode(f: impl FnOnce(&mut BinaryWriter<'_>) -> Result<()>) -> Vec<u8> {
        let mut buf = vec![0u8; 512];
        let mut writer = BinaryWriter::new(&mut buf, &DsonOptions::default());
        f(&mut writer).unwrap();
        let len = writer.finish().unwrap();
        buf.truncate(len);
        buf
    }

    fn reader(bytes: &[u8]) -> BinaryReader<'_> {
        BinaryReader::new(bytes, &DsonOptions::default())
    }

    #[test]
    fn test_object_fields() {
        let bytes = encode(|w| {
            w.write_start_object(Some(&ClassId::new(1, 9)))?;
            w.write_name(FieldNumber::of(1))?;
            w.write_int32(-7, WireType::Sint)?;
            w.write_name(FieldNumber::new(2, 4))?;
            w.write_string("hi")?;
            w.write_end_object()
        });
        let mut r = reader(&bytes);
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Object);
        assert_eq!(r.class_id(), Some(&ClassId::new(1, 9)));
        r.read_start_object().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Int32);
        assert_eq!(r.read_name().unwrap(), FieldNumber::of(1));
        assert_eq!(r.read_int32().unwrap(), -7);
        assert_eq!(r.read_dson_type().unwrap(), DsonType::String);
        assert_eq!(r.read_name().unwrap(), FieldNumber::new(2, 4));
        assert_eq!(r.read_string().unwrap(), "hi");
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        r.read_end_object().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        assert_eq!(r.state(), ReaderState::EndOfFile);
    }

    #[test]
    fn test_every_wire_type() {
        let bytes = encode(|w| {
            for wire in [WireType::VarInt, WireType::Uint, WireType::Sint, WireType::Fixed] {
                w.write_int32(i32::MIN, wire)?;
                w.write_int64(i64::MIN, wire)?;
                w.write_ext_int32(&ExtInt32::new(-2, -1), wire)?;
            }
            Ok(())
        });
        let mut r = reader(&bytes);
        for _ in 0..4 {
            r.read_dson_type().unwrap();
            assert_eq!(r.read_int32().unwrap(), i32::MIN);
            r.read_dson_type().unwrap();
            assert_eq!(r.read_int64().unwrap(), i64::MIN);
            r.read_dson_type().unwrap();
            assert_eq!(r.read_ext_int32().unwrap(), ExtInt32::new(-2, -1));
        }
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
    }

    #[test]
    fn test_widening_reads() {
        let bytes = encode(|w| {
            w.write_int32(5, WireType::VarInt)?;
            w.write_float(0.5)
        });
        let mut r = reader(&bytes);
        r.read_dson_type().unwrap();
        assert_eq!(r.read_int64().unwrap(), 5);
        r.read_dson_type().unwrap();
        assert_eq!(r.read_double().unwrap(), 0.5);
    }

    #[test]
    fn test_extension_values() {
        let reference = ObjectRef {
            namespace: "ns".into(),
            local_id: "id".into(),
            kind: 3,
            policy: -1,
        };
        let bytes = encode(|w| {
            w.write_binary(&Binary::new(9, vec![1, 2, 3]))?;
            w.write_ext_string(&ExtString::new(2, "x"))?;
            w.write_ref(&reference)
        });
        let mut r = reader(&bytes);
        r.read_dson_type().unwrap();
        assert_eq!(r.read_binary().unwrap(), Binary::new(9, vec![1, 2, 3]));
        r.read_dson_type().unwrap();
        assert_eq!(r.read_ext_string().unwrap(), ExtString::new(2, "x"));
        r.read_dson_type().unwrap();
        assert_eq!(r.read_ref().unwrap(), reference);
    }

    #[test]
    fn test_skip_jumps_over_container() {
        let bytes = encode(|w| {
            w.write_start_array(None)?;
            w.write_start_object(None)?;
            w.write_name(FieldNumber::of(1))?;
            w.write_start_array(None)?;
            w.write_string("deep")?;
            w.write_end_array()?;
            w.write_end_object()?;
            w.write_bool(true)?;
            w.write_end_array()
        });
        let mut r = reader(&bytes);
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Object);
        r.skip_value().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Boolean);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        r.read_end_array().unwrap();
    }

    #[test]
    fn test_skip_to_end_of_object() {
        let bytes = encode(|w| {
            w.write_start_object(None)?;
            for i in 1..5 {
                w.write_name(FieldNumber::of(i))?;
                w.write_int64(i64::from(i), WireType::VarInt)?;
            }
            w.write_end_object()?;
            w.write_null()
        });
        let mut r = reader(&bytes);
        r.read_dson_type().unwrap();
        r.read_start_object().unwrap();
        r.read_dson_type().unwrap();
        r.skip_name().unwrap();
        r.skip_value().unwrap();
        r.skip_to_end_of_object().unwrap();
        assert_eq!(r.state(), ReaderState::WaitEndObject);
        r.read_end_object().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Null);
    }

    #[test]
    fn test_length_past_input_is_corrupted() {
        let bytes = [112, 0xff, 0, 0, 0, 0, 120];
        let mut r = reader(&bytes);
        assert!(matches!(r.read_dson_type(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_inconsistent_length_falls_back() {
        // array whose prefix claims 1 byte instead of 2
        let bytes = [112, 1, 0, 0, 0, 0, 48, 120, 33];
        let mut r = reader(&bytes);
        r.read_dson_type().unwrap();
        r.skip_value().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Boolean);

        let mut r = reader(&bytes);
        r.read_dson_type().unwrap();
        r.read_start_array().unwrap();
        r.read_dson_type().unwrap();
        r.read_null().unwrap();
        assert!(matches!(r.read_dson_type(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_type_mismatch_and_order() {
        let bytes = encode(|w| w.write_string("s"));
        let mut r = reader(&bytes);
        assert!(matches!(r.read_string(), Err(Error::Protocol(_))));
        r.read_dson_type().unwrap();
        assert!(matches!(r.read_int32(), Err(Error::TypeMismatch { .. })));
        assert!(matches!(r.read_name(), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode(|w| w.write_string("hello"));
        let mut r = reader(&bytes[..4]);
        r.read_dson_type().unwrap();
        assert!(matches!(r.read_string(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_header_member() {
        let bytes = encode(|w| {
            w.write_start_object(None)?;
            w.write_start_header()?;
            w.write_name(FieldNumber::of(1))?;
            w.write_string("meta")?;
            w.write_end_header()?;
            w.write_name(FieldNumber::of(2))?;
            w.write_null()?;
            w.write_end_object()
        });
        let mut r = reader(&bytes);
        r.read_dson_type().unwrap();
        r.read_start_object().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Header);
        assert_eq!(r.state(), ReaderState::Value);
        r.read_start_header().unwrap();
        r.read_dson_type().unwrap();
        r.skip_name().unwrap();
        assert_eq!(r.read_string().unwrap(), "meta");
        assert_eq!(r.read_dson_type().unwrap(), DsonType::EndOfObject);
        r.read_end_header().unwrap();
        assert_eq!(r.read_dson_type().unwrap(), DsonType::Null);
        assert_eq!(r.read_name().unwrap(), FieldNumber::of(2));
    }
}
