//! Binary codec writer.
//!
//! Every member starts with a tag byte, `(DsonType << 3) | wire bits`. Inside
//! objects and headers the tag is followed by the varint field number.
//! Containers reserve a 4-byte length when they start and patch it when they
//! end, so a reader can jump over a whole subtree.
//!
//! ```rust
//! use dson::{BinaryWriter, DsonOptions, DsonWriter, FieldNumber, WireType};
//!
//! let mut buf = [0u8; 64];
//! let mut writer = BinaryWriter::new(&mut buf, &DsonOptions::default());
//! writer.write_start_object(None).unwrap();
//! writer.write_name(FieldNumber::of(1)).unwrap();
//! writer.write_int32(-3, WireType::Sint).unwrap();
//! writer.write_end_object().unwrap();
//! let len = writer.finish().unwrap();
//! // tag, length, no class id, tag, field, zigzag(-3), end tag
//! assert_eq!(&buf[..len], &[104, 4, 0, 0, 0, 0, 2, 8, 5, 120]);
//! ```

use integer_encoding::VarInt;
use tracing::debug;

use crate::context::ContextStack;
use crate::error::{Error, Result};
use crate::options::DsonOptions;
use crate::types::{ClassId, ContextType, DsonType, FieldNumber, WireType, WriterState};
use crate::value::{Binary, ExtInt32, ExtInt64, ExtString, ObjectRef};
use crate::writer::{
    ensure_end_allowed, ensure_header_allowed, ensure_name_allowed, ensure_value_allowed,
    initial_state, value_written, DsonWriter,
};

/// Tag byte of the end-of-container marker.
pub const END_TAG: u8 = (DsonType::EndOfObject as u8) << 3;

/// Builds a tag byte.
#[inline]
#[must_use]
pub const fn make_tag(dson_type: DsonType, wire_bits: u8) -> u8 {
    ((dson_type as u8) << 3) | (wire_bits & 0b111)
}

/// A bounds-checked cursor over a caller-supplied output buffer.
#[derive(Debug)]
pub struct CodedOutput<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> CodedOutput<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        CodedOutput { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, needed: usize) -> Result<&mut [u8]> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(Error::BufferOverflow { needed, remaining });
        }
        let start = self.pos;
        self.pos += needed;
        Ok(&mut self.buf[start..start + needed])
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_fixed32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_fixed64(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// LEB128.
    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        let len = value.required_space();
        value.encode_var(self.reserve(len)?);
        Ok(())
    }

    /// Zigzag LEB128.
    pub fn write_sint(&mut self, value: i64) -> Result<()> {
        let len = value.required_space();
        value.encode_var(self.reserve(len)?);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_varint(value.len() as u64)?;
        self.write_bytes(value.as_bytes())
    }

    /// Overwrites four bytes written earlier.
    pub fn patch_fixed32(&mut self, at: usize, value: u32) -> Result<()> {
        match self.buf.get_mut(at..at + 4) {
            Some(slot) if at + 4 <= self.pos => {
                slot.copy_from_slice(&value.to_le_bytes());
                Ok(())
            }
            _ => Err(Error::protocol(format!(
                "patch at {} outside the {} bytes written",
                at, self.pos
            ))),
        }
    }

    pub fn write_int32(&mut self, value: i32, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::VarInt => self.write_varint(i64::from(value) as u64),
            WireType::Uint => self.write_varint(u64::from(value as u32)),
            WireType::Sint => self.write_sint(i64::from(value)),
            WireType::Fixed => self.write_fixed32(value as u32),
        }
    }

    pub fn write_int64(&mut self, value: i64, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::VarInt | WireType::Uint => self.write_varint(value as u64),
            WireType::Sint => self.write_sint(value),
            WireType::Fixed => self.write_fixed64(value as u64),
        }
    }
}

#[derive(Debug, Default)]
struct Frame {
    /// Offset of the length placeholder.
    len_at: usize,
}

/// Writes Dson binary into a fixed-size buffer.
#[derive(Debug)]
pub struct BinaryWriter<'a> {
    out: CodedOutput<'a>,
    stack: ContextStack<WriterState, Frame>,
    name: Option<FieldNumber>,
}

impl<'a> BinaryWriter<'a> {
    pub fn new(buf: &'a mut [u8], options: &DsonOptions) -> Self {
        BinaryWriter {
            out: CodedOutput::new(buf),
            stack: ContextStack::new(WriterState::Value, options.recursion_limit),
            name: None,
        }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.out.position()
    }

    /// Returns the number of bytes written. Fails if a container is still open.
    pub fn finish(self) -> Result<usize> {
        if self.stack.context_type() != ContextType::TopLevel {
            return Err(Error::protocol(format!(
                "{:?} left open at end of output",
                self.stack.context_type()
            )));
        }
        Ok(self.out.position())
    }

    /// Writes the member prefix: the tag and, in objects, the pending field number.
    fn member(&mut self, op: &str, dson_type: DsonType, wire_bits: u8) -> Result<()> {
        ensure_value_allowed(&self.stack, op)?;
        self.out.write_u8(make_tag(dson_type, wire_bits))?;
        if self.stack.context_type().is_like_object() {
            let name = self
                .name
                .take()
                .ok_or_else(|| Error::protocol(format!("{} without a field number", op)))?;
            self.out.write_varint(u64::from(name.raw()))?;
        }
        Ok(())
    }

    fn done(&mut self) -> Result<()> {
        value_written(&mut self.stack);
        Ok(())
    }

    fn start_container(
        &mut self,
        context_type: ContextType,
        class_id: Option<&ClassId>,
    ) -> Result<()> {
        let dson_type = if context_type == ContextType::Object {
            DsonType::Object
        } else {
            DsonType::Array
        };
        self.member("write_start_*", dson_type, 0)?;
        let len_at = self.out.position();
        self.out.write_fixed32(0)?;
        match class_id {
            Some(id) if !id.is_object() => {
                self.out.write_u8(1)?;
                self.out.write_u8(id.namespace)?;
                self.out.write_fixed32(id.local_id as u32)?;
            }
            _ => self.out.write_u8(0)?,
        }
        self.stack
            .push(context_type, initial_state(context_type), Frame { len_at })
    }

    fn end_container(&mut self, context_type: ContextType) -> Result<()> {
        ensure_end_allowed(&self.stack, context_type)?;
        let len_at = self.stack.current().scratch.len_at;
        let len = self.out.position() - len_at - 4;
        let len = u32::try_from(len)
            .map_err(|_| Error::protocol(format!("container of {} bytes is too long", len)))?;
        self.out.patch_fixed32(len_at, len)?;
        self.out.write_u8(END_TAG)?;
        self.stack.pop(context_type)?;
        debug!(?context_type, len, depth = self.stack.depth(), "closed binary container");
        Ok(())
    }
}

impl DsonWriter for BinaryWriter<'_> {
    type Name = FieldNumber;

    fn context_type(&self) -> ContextType {
        self.stack.context_type()
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn write_name(&mut self, name: FieldNumber) -> Result<()> {
        ensure_name_allowed(&self.stack)?;
        self.name = Some(name);
        self.stack.set_state(WriterState::Value);
        Ok(())
    }

    fn write_int32(&mut self, value: i32, wire_type: WireType) -> Result<()> {
        self.member("write_int32", DsonType::Int32, wire_type.number())?;
        self.out.write_int32(value, wire_type)?;
        self.done()
    }

    fn write_int64(&mut self, value: i64, wire_type: WireType) -> Result<()> {
        self.member("write_int64", DsonType::Int64, wire_type.number())?;
        self.out.write_int64(value, wire_type)?;
        self.done()
    }

    fn write_float(&mut self, value: f32) -> Result<()> {
        self.member("write_float", DsonType::Float, 0)?;
        self.out.write_fixed32(value.to_bits())?;
        self.done()
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        self.member("write_double", DsonType::Double, 0)?;
        self.out.write_fixed64(value.to_bits())?;
        self.done()
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.member("write_bool", DsonType::Boolean, u8::from(value))?;
        self.done()
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.member("write_string", DsonType::String, 0)?;
        self.out.write_string(value)?;
        self.done()
    }

    fn write_null(&mut self) -> Result<()> {
        self.member("write_null", DsonType::Null, 0)?;
        self.done()
    }

    fn write_binary(&mut self, value: &Binary) -> Result<()> {
        let len = u32::try_from(value.data.len() + 1)
            .map_err(|_| Error::protocol("binary payload is too long"))?;
        self.member("write_binary", DsonType::Binary, 0)?;
        self.out.write_fixed32(len)?;
        self.out.write_u8(value.subtype)?;
        self.out.write_bytes(&value.data)?;
        self.done()
    }

    fn write_ext_int32(&mut self, value: &ExtInt32, wire_type: WireType) -> Result<()> {
        self.member("write_ext_int32", DsonType::ExtInt32, wire_type.number())?;
        self.out.write_varint(u64::from(value.subtype as u32))?;
        self.out.write_int32(value.value, wire_type)?;
        self.done()
    }

    fn write_ext_int64(&mut self, value: &ExtInt64, wire_type: WireType) -> Result<()> {
        self.member("write_ext_int64", DsonType::ExtInt64, wire_type.number())?;
        self.out.write_varint(u64::from(value.subtype as u32))?;
        self.out.write_int64(value.value, wire_type)?;
        self.done()
    }

    fn write_ext_string(&mut self, value: &ExtString) -> Result<()> {
        self.member("write_ext_string", DsonType::ExtString, 0)?;
        self.out.write_varint(u64::from(value.subtype as u32))?;
        self.out.write_string(&value.value)?;
        self.done()
    }

    fn write_ref(&mut self, value: &ObjectRef) -> Result<()> {
        self.member("write_ref", DsonType::Reference, 0)?;
        let len_at = self.out.position();
        self.out.write_fixed32(0)?;
        self.out.write_string(&value.namespace)?;
        self.out.write_string(&value.local_id)?;
        self.out.write_int32(value.kind, WireType::VarInt)?;
        self.out.write_int32(value.policy, WireType::VarInt)?;
        let len = (self.out.position() - len_at - 4) as u32;
        self.out.patch_fixed32(len_at, len)?;
        self.done()
    }

    fn write_start_object(&mut self, class_id: Option<&ClassId>) -> Result<()> {
        self.start_container(ContextType::Object, class_id)
    }

    fn write_end_object(&mut self) -> Result<()> {
        self.end_container(ContextType::Object)?;
        self.done()
    }

    fn write_start_array(&mut self, class_id: Option<&ClassId>) -> Result<()> {
        self.start_container(ContextType::Array, class_id)
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.end_container(ContextType::Array)?;
        self.done()
    }

    fn write_start_header(&mut self) -> Result<()> {
        ensure_header_allowed(&self.stack)?;
        self.out.write_u8(make_tag(DsonType::Header, 0))?;
        let len_at = self.out.position();
        self.out.write_fixed32(0)?;
        self.stack.push(
            ContextType::Header,
            initial_state(ContextType::Header),
            Frame { len_at },
        )
    }

    fn write_end_header(&mut self) -> Result<()> {
        // Writers do not count the header as a member.
        self.end_container(ContextType::Header)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
