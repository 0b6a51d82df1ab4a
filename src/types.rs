//! Core enumerations and identifiers shared by both codecs.
//!
//! - [`DsonType`]: the closed set of value kinds
//! - [`WireType`]: integer encoding strategy for the binary form
//! - [`ContextType`], [`ReaderState`], [`WriterState`]: codec state machine vocabulary
//! - [`FieldNumber`], [`ClassId`]: the binary form's field names and type ids
//! - [`DsonName`]: abstracts over text (`String`) and binary ([`FieldNumber`]) names

use crate::registry::{TypeMeta, TypeRegistry};
use crate::text_reader::CLASS_NAME_FIELD;
use crate::value::DsonValue;
use std::fmt;
use std::hash::Hash;

/// The kind of a Dson value.
///
/// The discriminant is the value written into the high bits of a binary tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DsonType {
    Int32 = 0,
    Int64 = 1,
    Float = 2,
    Double = 3,
    Boolean = 4,
    String = 5,
    Null = 6,
    Binary = 7,
    ExtString = 8,
    ExtInt32 = 9,
    ExtInt64 = 10,
    Reference = 11,
    Header = 12,
    Object = 13,
    Array = 14,
    EndOfObject = 15,
}

impl DsonType {
    const ALL: [DsonType; 16] = [
        DsonType::Int32,
        DsonType::Int64,
        DsonType::Float,
        DsonType::Double,
        DsonType::Boolean,
        DsonType::String,
        DsonType::Null,
        DsonType::Binary,
        DsonType::ExtString,
        DsonType::ExtInt32,
        DsonType::ExtInt64,
        DsonType::Reference,
        DsonType::Header,
        DsonType::Object,
        DsonType::Array,
        DsonType::EndOfObject,
    ];

    #[inline]
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_number(number: u8) -> Option<DsonType> {
        Self::ALL.get(number as usize).copied()
    }

    /// `Object` or `Array`.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, DsonType::Object | DsonType::Array)
    }

    /// `Object`, `Array` or `Header`.
    #[inline]
    #[must_use]
    pub const fn is_container_or_header(self) -> bool {
        matches!(self, DsonType::Object | DsonType::Array | DsonType::Header)
    }

    /// Types whose binary body is encoded according to a [`WireType`].
    #[inline]
    #[must_use]
    pub const fn has_wire_type(self) -> bool {
        matches!(
            self,
            DsonType::Int32 | DsonType::Int64 | DsonType::ExtInt32 | DsonType::ExtInt64
        )
    }
}

impl fmt::Display for DsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Integer encoding used on the binary wire.
///
/// # Examples
///
/// ```rust
/// use dson::WireType;
///
/// assert_eq!(WireType::from_number(2), Some(WireType::Sint));
/// assert_eq!(WireType::default(), WireType::VarInt);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum WireType {
    /// LEB128 of the sign-extended value; negatives take ten bytes.
    #[default]
    VarInt = 0,
    /// LEB128 of the value reinterpreted as unsigned at its own width.
    Uint = 1,
    /// Zigzag LEB128.
    Sint = 2,
    /// Little-endian fixed width.
    Fixed = 3,
}

impl WireType {
    #[inline]
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_number(number: u8) -> Option<WireType> {
        match number {
            0 => Some(WireType::VarInt),
            1 => Some(WireType::Uint),
            2 => Some(WireType::Sint),
            3 => Some(WireType::Fixed),
            _ => None,
        }
    }
}

/// The kind of frame a reader or writer is positioned in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextType {
    TopLevel,
    Object,
    Array,
    Header,
}

impl ContextType {
    /// Contexts whose members are named.
    #[inline]
    #[must_use]
    pub const fn is_like_object(self) -> bool {
        matches!(self, ContextType::Object | ContextType::Header)
    }

    /// The type that starts a frame of this kind.
    #[must_use]
    pub const fn dson_type(self) -> Option<DsonType> {
        match self {
            ContextType::TopLevel => None,
            ContextType::Object => Some(DsonType::Object),
            ContextType::Array => Some(DsonType::Array),
            ContextType::Header => Some(DsonType::Header),
        }
    }
}

/// Per-frame reader state.
///
/// `Initial -> Type -> (Name ->) Value -> Type ...`, ending in `WaitEndObject`
/// inside containers or `EndOfFile` at the top level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    Initial,
    Type,
    Name,
    Value,
    WaitEndObject,
    EndOfFile,
}

/// Per-frame writer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    Initial,
    Name,
    Value,
}

/// Binary field name: `idep` (inheritance depth, 3 bits) and a local number (29 bits).
///
/// # Examples
///
/// ```rust
/// use dson::FieldNumber;
///
/// let number = FieldNumber::new(1, 5);
/// assert_eq!(number.idep(), 1);
/// assert_eq!(number.lnumber(), 5);
/// assert_eq!(FieldNumber::from_raw(number.raw()), number);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldNumber(u32);

impl FieldNumber {
    pub const MAX_IDEP: u8 = 7;
    pub const MAX_LNUMBER: u32 = (1 << 29) - 1;

    /// Packs `idep` and `lnumber`. Values outside their bit ranges are masked.
    #[must_use]
    pub const fn new(idep: u8, lnumber: u32) -> Self {
        FieldNumber(((lnumber & Self::MAX_LNUMBER) << 3) | (idep & Self::MAX_IDEP) as u32)
    }

    /// Shorthand for a field declared directly on the type (`idep == 0`).
    #[must_use]
    pub const fn of(lnumber: u32) -> Self {
        Self::new(0, lnumber)
    }

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        FieldNumber(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn idep(self) -> u8 {
        (self.0 & Self::MAX_IDEP as u32) as u8
    }

    #[must_use]
    pub const fn lnumber(self) -> u32 {
        self.0 >> 3
    }
}

impl fmt::Display for FieldNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.idep(), self.lnumber())
    }
}

/// Binary type identifier. Namespace 0 is reserved for built-in types and
/// `(0, 0)` means "no declared type".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId {
    pub namespace: u8,
    pub local_id: i32,
}

impl ClassId {
    pub const OBJECT: ClassId = ClassId::new(0, 0);

    #[must_use]
    pub const fn new(namespace: u8, local_id: i32) -> Self {
        ClassId {
            namespace,
            local_id,
        }
    }

    #[must_use]
    pub const fn is_object(&self) -> bool {
        self.namespace == 0 && self.local_id == 0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.local_id)
    }
}

/// A field's identity as seen by generated codec glue: a text name and a
/// binary number. Each codec picks the half it needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub name: &'static str,
    pub number: FieldNumber,
}

impl FieldKey {
    #[must_use]
    pub const fn new(name: &'static str, number: FieldNumber) -> Self {
        FieldKey { name, number }
    }
}

/// A field name type usable as a Dson object key.
///
/// `String` is the text codec's name type and names classes by string;
/// [`FieldNumber`] is the binary codec's and names classes by [`ClassId`].
pub trait DsonName: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + 'static {
    /// The type id written in front of typed containers.
    type ClassId: Clone + Eq + Hash + fmt::Debug + fmt::Display + 'static;

    /// Picks this codec's half of a [`FieldKey`].
    fn from_key(key: &FieldKey) -> Self;

    /// The canonical id of a registered type, if it has one.
    fn canonical_id(meta: &TypeMeta) -> Option<Self::ClassId>;

    /// Resolves an id against a registry, accepting aliases.
    fn lookup<'r>(id: &Self::ClassId, registry: &'r TypeRegistry) -> Option<&'r TypeMeta>;

    /// Recognizes a header member that restates the container's class id.
    /// Such members are folded into the class id instead of the header map.
    fn class_id_from_header(_name: &Self, _value: &DsonValue<Self>) -> Option<Self::ClassId> {
        None
    }
}

impl DsonName for String {
    type ClassId = String;

    fn from_key(key: &FieldKey) -> Self {
        key.name.to_string()
    }

    fn canonical_id(meta: &TypeMeta) -> Option<String> {
        meta.class_names().first().cloned()
    }

    fn lookup<'r>(id: &String, registry: &'r TypeRegistry) -> Option<&'r TypeMeta> {
        registry.of_name(id)
    }

    fn class_id_from_header(name: &String, value: &DsonValue<String>) -> Option<String> {
        match value {
            DsonValue::String(class_name) if name == CLASS_NAME_FIELD => Some(class_name.clone()),
            _ => None,
        }
    }
}

impl DsonName for FieldNumber {
    type ClassId = ClassId;

    fn from_key(key: &FieldKey) -> Self {
        key.number
    }

    fn canonical_id(meta: &TypeMeta) -> Option<ClassId> {
        meta.class_ids().first().copied()
    }

    fn lookup<'r>(id: &ClassId, registry: &'r TypeRegistry) -> Option<&'r TypeMeta> {
        registry.of_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dson_type_numbers_follow_declaration_order() {
        assert_eq!(DsonType::Int32.number(), 0);
        assert_eq!(DsonType::EndOfObject.number(), 15);
        for number in 0..16u8 {
            let ty = DsonType::from_number(number).unwrap();
            assert_eq!(ty.number(), number);
        }
        assert_eq!(DsonType::from_number(16), None);
    }

    #[test]
    fn test_container_kinds() {
        assert!(DsonType::Object.is_container());
        assert!(!DsonType::Header.is_container());
        assert!(DsonType::Header.is_container_or_header());
        assert!(!DsonType::EndOfObject.is_container_or_header());
    }

    #[test]
    fn test_field_number_packing() {
        let number = FieldNumber::new(3, 1000);
        assert_eq!(number.idep(), 3);
        assert_eq!(number.lnumber(), 1000);
        assert_eq!(number.raw(), (1000 << 3) | 3);
        assert_eq!(number.to_string(), "3.1000");
    }

    #[test]
    fn test_class_id_object_sentinel() {
        assert!(ClassId::OBJECT.is_object());
        assert!(!ClassId::new(1, 0).is_object());
        assert_eq!(ClassId::new(2, 17).to_string(), "2:17");
    }

    #[test]
    fn test_field_key_halves() {
        let key = FieldKey::new("name", FieldNumber::of(4));
        assert_eq!(String::from_key(&key), "name");
        assert_eq!(FieldNumber::from_key(&key), FieldNumber::of(4));
    }
}
