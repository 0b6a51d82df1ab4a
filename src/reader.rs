//! The pull-style reading protocol shared by the text and binary codecs.
//!
//! Every member is consumed as **type → name → value**:
//!
//! ```text
//! read_dson_type()        // Int32, Object, EndOfObject, ...
//! read_name()             // only inside objects and headers
//! read_int32() / read_start_object() / skip_value() / ...
//! ```
//!
//! `EndOfObject` marks the end of the current container (or of the input at
//! the top level) and must be followed by the matching `read_end_*` call.
//! Calls out of this order fail with [`Error::Protocol`](crate::Error::Protocol).
//!
//! A container may open with a single unnamed `Header` member carrying type
//! metadata. Its class id is also available through [`DsonReader::class_id`]
//! as soon as `read_dson_type` has returned `Object` or `Array`.

use crate::context::ContextStack;
use crate::error::{Error, Result};
use crate::types::{ContextType, DsonName, DsonType, ReaderState};
use crate::value::{Binary, ExtInt32, ExtInt64, ExtString, ObjectRef};

/// A Dson reader.
pub trait DsonReader {
    /// Field name type: `String` for text, [`FieldNumber`](crate::FieldNumber) for binary.
    type Name: DsonName;

    fn context_type(&self) -> ContextType;
    fn state(&self) -> ReaderState;
    /// Type returned by the last `read_dson_type`.
    fn current_type(&self) -> Option<DsonType>;
    fn current_name(&self) -> Option<&Self::Name>;
    /// Class id of the container whose type was just read.
    fn class_id(&self) -> Option<&<Self::Name as DsonName>::ClassId>;
    /// Container nesting depth.
    fn depth(&self) -> usize;

    fn read_dson_type(&mut self) -> Result<DsonType>;
    fn read_name(&mut self) -> Result<Self::Name>;

    fn read_int32(&mut self) -> Result<i32>;
    /// Also accepts an `Int32` member.
    fn read_int64(&mut self) -> Result<i64>;
    fn read_float(&mut self) -> Result<f32>;
    /// Also accepts a `Float` member.
    fn read_double(&mut self) -> Result<f64>;
    fn read_bool(&mut self) -> Result<bool>;
    fn read_string(&mut self) -> Result<String>;
    fn read_null(&mut self) -> Result<()>;
    fn read_binary(&mut self) -> Result<Binary>;
    fn read_ext_int32(&mut self) -> Result<ExtInt32>;
    fn read_ext_int64(&mut self) -> Result<ExtInt64>;
    fn read_ext_string(&mut self) -> Result<ExtString>;
    fn read_ref(&mut self) -> Result<ObjectRef>;

    fn read_start_object(&mut self) -> Result<()>;
    fn read_end_object(&mut self) -> Result<()>;
    fn read_start_array(&mut self) -> Result<()>;
    fn read_end_array(&mut self) -> Result<()>;
    fn read_start_header(&mut self) -> Result<()>;
    fn read_end_header(&mut self) -> Result<()>;

    /// Discards the pending name.
    fn skip_name(&mut self) -> Result<()>;
    /// Discards the pending value, including a whole container.
    fn skip_value(&mut self) -> Result<()>;
    /// Discards the remaining members of the current container and leaves the
    /// reader waiting for the matching `read_end_*`.
    fn skip_to_end_of_object(&mut self) -> Result<()>;
}

/// Fails unless the current frame is in `expected` state.
pub(crate) fn ensure_state<X>(
    stack: &ContextStack<ReaderState, X>,
    expected: ReaderState,
    op: &str,
) -> Result<()>
where
    X: Default,
{
    let state = stack.state();
    if state != expected {
        return Err(Error::protocol(format!(
            "{} called in state {:?}, expected {:?}",
            op, state, expected
        )));
    }
    Ok(())
}

/// Fails unless a value of one of `accepted` types is pending.
pub(crate) fn ensure_value<X>(
    stack: &ContextStack<ReaderState, X>,
    current: Option<DsonType>,
    accepted: &[DsonType],
    op: &str,
) -> Result<DsonType>
where
    X: Default,
{
    ensure_state(stack, ReaderState::Value, op)?;
    match current {
        Some(ty) if accepted.contains(&ty) => Ok(ty),
        Some(ty) => Err(Error::type_mismatch(accepted[0], ty)),
        None => Err(Error::protocol(format!("{} called with no pending type", op))),
    }
}

/// State after `read_dson_type` returned `ty` as member number `count`.
pub(crate) fn state_after_type(
    context_type: ContextType,
    count: usize,
    ty: DsonType,
) -> Result<ReaderState> {
    match ty {
        DsonType::EndOfObject => Ok(if context_type == ContextType::TopLevel {
            ReaderState::EndOfFile
        } else {
            ReaderState::WaitEndObject
        }),
        DsonType::Header => match context_type {
            ContextType::Object | ContextType::Array if count == 0 => Ok(ReaderState::Value),
            _ => Err(Error::protocol(format!(
                "a header must be the first member of an object or array, found in {:?} at member {}",
                context_type, count
            ))),
        },
        _ if context_type.is_like_object() => Ok(ReaderState::Name),
        _ => Ok(ReaderState::Value),
    }
}

/// Marks the pending value consumed.
pub(crate) fn value_consumed<X: Default>(stack: &mut ContextStack<ReaderState, X>) {
    let frame = stack.current_mut();
    frame.state = ReaderState::Type;
    frame.count += 1;
}

/// Walks the remaining members of the current container member by member.
pub(crate) fn skip_members<R: DsonReader + ?Sized>(reader: &mut R) -> Result<()> {
    if reader.context_type() == ContextType::TopLevel {
        return Err(Error::protocol("skip_to_end_of_object called at the top level"));
    }
    loop {
        match reader.state() {
            ReaderState::WaitEndObject => return Ok(()),
            ReaderState::Name => reader.skip_name()?,
            ReaderState::Value => reader.skip_value()?,
            ReaderState::Initial | ReaderState::Type => {
                reader.read_dson_type()?;
            }
            ReaderState::EndOfFile => {
                return Err(Error::protocol("end of input inside a container"));
            }
        }
    }
}

/// Enters, skips and leaves a pending container value.
pub(crate) fn skip_container<R: DsonReader + ?Sized>(reader: &mut R, ty: DsonType) -> Result<()> {
    match ty {
        DsonType::Object => {
            reader.read_start_object()?;
            skip_members(reader)?;
            reader.read_end_object()
        }
        DsonType::Array => {
            reader.read_start_array()?;
            skip_members(reader)?;
            reader.read_end_array()
        }
        DsonType::Header => {
            reader.read_start_header()?;
            skip_members(reader)?;
            reader.read_end_header()
        }
        other => Err(Error::protocol(format!("{} is not a container", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_after_type() {
        assert_eq!(
            state_after_type(ContextType::Object, 0, DsonType::Int32).unwrap(),
            ReaderState::Name
        );
        assert_eq!(
            state_after_type(ContextType::Array, 3, DsonType::String).unwrap(),
            ReaderState::Value
        );
        assert_eq!(
            state_after_type(ContextType::TopLevel, 1, DsonType::EndOfObject).unwrap(),
            ReaderState::EndOfFile
        );
        assert_eq!(
            state_after_type(ContextType::Header, 2, DsonType::EndOfObject).unwrap(),
            ReaderState::WaitEndObject
        );
    }

    #[test]
    fn test_header_only_first() {
        assert_eq!(
            state_after_type(ContextType::Object, 0, DsonType::Header).unwrap(),
            ReaderState::Value
        );
        assert!(state_after_type(ContextType::Object, 1, DsonType::Header).is_err());
        assert!(state_after_type(ContextType::Header, 0, DsonType::Header).is_err());
        assert!(state_after_type(ContextType::TopLevel, 0, DsonType::Header).is_err());
    }

    #[test]
    fn test_ensure_value_reports_mismatch() {
        let mut stack: ContextStack<ReaderState> = ContextStack::new(ReaderState::Value, 4);
        let err = ensure_value(&stack, Some(DsonType::String), &[DsonType::Int32], "read_int32")
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        stack.set_state(ReaderState::Name);
        assert!(matches!(
            ensure_value(&stack, Some(DsonType::Int32), &[DsonType::Int32], "read_int32"),
            Err(Error::Protocol(_))
        ));
    }
}
