//! The push-style writing protocol shared by the text and binary codecs.
//!
//! Inside objects and headers every value is preceded by `write_name`; arrays
//! and the top level take values only. A header, when written, must be the
//! first member of its container and is never named.

use crate::context::ContextStack;
use crate::error::{Error, Result};
use crate::types::{ContextType, DsonName, WireType, WriterState};
use crate::value::{Binary, ExtInt32, ExtInt64, ExtString, ObjectRef};

/// A Dson writer.
pub trait DsonWriter {
    type Name: DsonName;

    fn context_type(&self) -> ContextType;
    /// Container nesting depth.
    fn depth(&self) -> usize;

    fn write_name(&mut self, name: Self::Name) -> Result<()>;

    fn write_int32(&mut self, value: i32, wire_type: WireType) -> Result<()>;
    fn write_int64(&mut self, value: i64, wire_type: WireType) -> Result<()>;
    fn write_float(&mut self, value: f32) -> Result<()>;
    fn write_double(&mut self, value: f64) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;
    fn write_null(&mut self) -> Result<()>;
    fn write_binary(&mut self, value: &Binary) -> Result<()>;
    fn write_ext_int32(&mut self, value: &ExtInt32, wire_type: WireType) -> Result<()>;
    fn write_ext_int64(&mut self, value: &ExtInt64, wire_type: WireType) -> Result<()>;
    fn write_ext_string(&mut self, value: &ExtString) -> Result<()>;
    fn write_ref(&mut self, value: &ObjectRef) -> Result<()>;

    fn write_start_object(
        &mut self,
        class_id: Option<&<Self::Name as DsonName>::ClassId>,
    ) -> Result<()>;
    fn write_end_object(&mut self) -> Result<()>;
    fn write_start_array(
        &mut self,
        class_id: Option<&<Self::Name as DsonName>::ClassId>,
    ) -> Result<()>;
    fn write_end_array(&mut self) -> Result<()>;
    fn write_start_header(&mut self) -> Result<()>;
    fn write_end_header(&mut self) -> Result<()>;

    /// Completes any deferred output.
    fn flush(&mut self) -> Result<()>;
}

/// Fails unless a value may be written now.
pub(crate) fn ensure_value_allowed<X: Default>(
    stack: &ContextStack<WriterState, X>,
    op: &str,
) -> Result<()> {
    let frame = stack.current();
    if frame.context_type.is_like_object() && frame.state != WriterState::Value {
        return Err(Error::protocol(format!(
            "{} in {:?} context requires a name first",
            op, frame.context_type
        )));
    }
    Ok(())
}

/// Fails unless a name may be written now.
pub(crate) fn ensure_name_allowed<X: Default>(stack: &ContextStack<WriterState, X>) -> Result<()> {
    let frame = stack.current();
    if !frame.context_type.is_like_object() {
        return Err(Error::protocol(format!(
            "write_name in {:?} context",
            frame.context_type
        )));
    }
    if frame.state != WriterState::Name {
        return Err(Error::protocol("write_name while a name is already pending"));
    }
    Ok(())
}

/// Fails unless a header may be started now.
pub(crate) fn ensure_header_allowed<X: Default>(stack: &ContextStack<WriterState, X>) -> Result<()> {
    let frame = stack.current();
    match frame.context_type {
        ContextType::Object | ContextType::Array if frame.count == 0 => {}
        other => {
            return Err(Error::protocol(format!(
                "a header must be the first member of an object or array, not in {:?} at member {}",
                other, frame.count
            )))
        }
    }
    if frame.context_type == ContextType::Object && frame.state == WriterState::Value {
        return Err(Error::protocol("a header is never named"));
    }
    Ok(())
}

/// Fails if the current container still expects a value for a written name.
pub(crate) fn ensure_end_allowed<X: Default>(
    stack: &ContextStack<WriterState, X>,
    context_type: ContextType,
) -> Result<()> {
    let frame = stack.current();
    if frame.context_type != context_type {
        return Err(Error::protocol(format!(
            "cannot end {:?} while in {:?} context",
            context_type, frame.context_type
        )));
    }
    if frame.context_type.is_like_object() && frame.state == WriterState::Value {
        return Err(Error::protocol("container ended with a pending name"));
    }
    Ok(())
}

/// Marks a member written in the current frame.
pub(crate) fn value_written<X: Default>(stack: &mut ContextStack<WriterState, X>) {
    let frame = stack.current_mut();
    if frame.context_type.is_like_object() {
        frame.state = WriterState::Name;
    }
    frame.count += 1;
}

/// Initial state of a fresh frame.
pub(crate) fn initial_state(context_type: ContextType) -> WriterState {
    if context_type.is_like_object() {
        WriterState::Name
    } else {
        WriterState::Value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_requires_names() {
        let mut stack: ContextStack<WriterState> = ContextStack::new(WriterState::Value, 4);
        assert!(ensure_value_allowed(&stack, "write_int32").is_ok());
        assert!(ensure_name_allowed(&stack).is_err());

        stack
            .push(ContextType::Object, initial_state(ContextType::Object), ())
            .unwrap();
        assert!(ensure_value_allowed(&stack, "write_int32").is_err());
        assert!(ensure_name_allowed(&stack).is_ok());
        stack.set_state(WriterState::Value);
        assert!(ensure_name_allowed(&stack).is_err());
        assert!(ensure_end_allowed(&stack, ContextType::Object).is_err());
        value_written(&mut stack);
        assert_eq!(stack.state(), WriterState::Name);
        assert!(ensure_end_allowed(&stack, ContextType::Object).is_ok());
        assert!(ensure_header_allowed(&stack).is_err());
    }
}
