//! Dynamic value representation for Dson data.
//!
//! [`DsonValue`] is a tagged union over [`DsonType`]: primitives, binary and
//! extension payloads, references, and the two container kinds. Containers
//! carry an optional class id and a generic header map next to their members.
//!
//! The name type `K` is [`String`] for values read from or written to text and
//! [`FieldNumber`](crate::FieldNumber) for the binary form. [`DsonValue::map_names`]
//! converts between the two.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{dson, DsonType, DsonValue};
//!
//! let value: DsonValue = dson!({
//!     "name": "Alice",
//!     "age": 30,
//!     "tags": ["a", "b"]
//! });
//! assert_eq!(value.dson_type(), DsonType::Object);
//!
//! let obj = value.as_object().unwrap();
//! assert_eq!(obj.fields.get("age").and_then(|v| v.as_i64()), Some(30));
//! ```

use crate::types::{DsonName, DsonType};
use crate::DsonMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dynamically-typed Dson value.
#[derive(Clone, Debug, PartialEq)]
pub enum DsonValue<K: DsonName = String> {
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Null,
    Binary(Binary),
    ExtInt32(ExtInt32),
    ExtInt64(ExtInt64),
    ExtString(ExtString),
    Reference(ObjectRef),
    Object(DsonObject<K>),
    Array(DsonArray<K>),
}

/// A byte payload with a one-byte application-defined subtype.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Binary {
    pub subtype: u8,
    pub data: Vec<u8>,
}

impl Binary {
    #[must_use]
    pub fn new(subtype: u8, data: impl Into<Vec<u8>>) -> Self {
        Binary {
            subtype,
            data: data.into(),
        }
    }
}

/// An `i32` tagged with an application-defined subtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExtInt32 {
    pub subtype: i32,
    pub value: i32,
}

impl ExtInt32 {
    #[must_use]
    pub const fn new(subtype: i32, value: i32) -> Self {
        ExtInt32 { subtype, value }
    }
}

/// An `i64` tagged with an application-defined subtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExtInt64 {
    pub subtype: i32,
    pub value: i64,
}

impl ExtInt64 {
    #[must_use]
    pub const fn new(subtype: i32, value: i64) -> Self {
        ExtInt64 { subtype, value }
    }
}

/// A string tagged with an application-defined subtype.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ExtString {
    pub subtype: i32,
    pub value: String,
}

impl ExtString {
    #[must_use]
    pub fn new(subtype: i32, value: impl Into<String>) -> Self {
        ExtString {
            subtype,
            value: value.into(),
        }
    }
}

/// A reference to an object stored elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub namespace: String,
    pub local_id: String,
    pub kind: i32,
    pub policy: i32,
}

impl ObjectRef {
    /// A reference carrying only a local id.
    #[must_use]
    pub fn local(local_id: impl Into<String>) -> Self {
        ObjectRef {
            local_id: local_id.into(),
            ..Default::default()
        }
    }

    /// `true` when only the local id is set, which the text form writes as `@ref id`.
    #[must_use]
    pub fn is_local_only(&self) -> bool {
        self.namespace.is_empty() && self.kind == 0 && self.policy == 0
    }
}

/// An object: named fields plus optional type metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct DsonObject<K: DsonName = String> {
    pub class_id: Option<K::ClassId>,
    pub header: DsonMap<K>,
    pub fields: DsonMap<K>,
}

impl<K: DsonName> DsonObject<K> {
    #[must_use]
    pub fn new() -> Self {
        DsonObject {
            class_id: None,
            header: DsonMap::new(),
            fields: DsonMap::new(),
        }
    }

    #[must_use]
    pub fn with_class_id(mut self, class_id: K::ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn insert(&mut self, name: K, value: DsonValue<K>) -> Option<DsonValue<K>> {
        self.fields.insert(name, value)
    }

    /// `true` when the object has a class id or header fields.
    #[must_use]
    pub fn has_header(&self) -> bool {
        self.class_id.is_some() || !self.header.is_empty()
    }
}

impl<K: DsonName> Default for DsonObject<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: DsonName> From<DsonMap<K>> for DsonObject<K> {
    fn from(fields: DsonMap<K>) -> Self {
        DsonObject {
            class_id: None,
            header: DsonMap::new(),
            fields,
        }
    }
}

/// An array: ordered elements plus optional type metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct DsonArray<K: DsonName = String> {
    pub class_id: Option<K::ClassId>,
    pub header: DsonMap<K>,
    pub elements: Vec<DsonValue<K>>,
}

impl<K: DsonName> DsonArray<K> {
    #[must_use]
    pub fn new() -> Self {
        DsonArray {
            class_id: None,
            header: DsonMap::new(),
            elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_class_id(mut self, class_id: K::ClassId) -> Self {
        self.class_id = Some(class_id);
        self
    }

    pub fn push(&mut self, value: DsonValue<K>) {
        self.elements.push(value);
    }

    #[must_use]
    pub fn has_header(&self) -> bool {
        self.class_id.is_some() || !self.header.is_empty()
    }
}

impl<K: DsonName> Default for DsonArray<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: DsonName> From<Vec<DsonValue<K>>> for DsonArray<K> {
    fn from(elements: Vec<DsonValue<K>>) -> Self {
        DsonArray {
            class_id: None,
            header: DsonMap::new(),
            elements,
        }
    }
}

impl<K: DsonName> DsonValue<K> {
    /// The [`DsonType`] this value encodes as.
    #[must_use]
    pub const fn dson_type(&self) -> DsonType {
        match self {
            DsonValue::Int32(_) => DsonType::Int32,
            DsonValue::Int64(_) => DsonType::Int64,
            DsonValue::Float(_) => DsonType::Float,
            DsonValue::Double(_) => DsonType::Double,
            DsonValue::Bool(_) => DsonType::Boolean,
            DsonValue::String(_) => DsonType::String,
            DsonValue::Null => DsonType::Null,
            DsonValue::Binary(_) => DsonType::Binary,
            DsonValue::ExtInt32(_) => DsonType::ExtInt32,
            DsonValue::ExtInt64(_) => DsonType::ExtInt64,
            DsonValue::ExtString(_) => DsonType::ExtString,
            DsonValue::Reference(_) => DsonType::Reference,
            DsonValue::Object(_) => DsonType::Object,
            DsonValue::Array(_) => DsonType::Array,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, DsonValue::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(
            self,
            DsonValue::Int32(_) | DsonValue::Int64(_) | DsonValue::Float(_) | DsonValue::Double(_)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, DsonValue::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, DsonValue::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, DsonValue::Array(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Widens `Int32` and `Int64` to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DsonValue::Int32(v) => Some(*v as i64),
            DsonValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Widens any numeric variant to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DsonValue::Int32(v) => Some(*v as f64),
            DsonValue::Int64(v) => Some(*v as f64),
            DsonValue::Float(v) => Some(*v as f64),
            DsonValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            DsonValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&DsonObject<K>> {
        match self {
            DsonValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&DsonArray<K>> {
        match self {
            DsonValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Rebuilds the value with a different name type.
    ///
    /// `names` converts every field and header key; `ids` converts class ids and
    /// may drop them by returning `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dson::{dson, DsonValue, FieldNumber};
    ///
    /// let text: DsonValue = dson!({ "x": 1 });
    /// let binary: DsonValue<FieldNumber> =
    ///     text.map_names(&mut |_name| FieldNumber::of(1), &mut |_id| None);
    /// assert!(binary.as_object().unwrap().fields.contains_key(&FieldNumber::of(1)));
    /// ```
    pub fn map_names<K2, N, I>(self, names: &mut N, ids: &mut I) -> DsonValue<K2>
    where
        K2: DsonName,
        N: FnMut(K) -> K2,
        I: FnMut(K::ClassId) -> Option<K2::ClassId>,
    {
        fn map_fields<K: DsonName, K2: DsonName, N, I>(
            map: DsonMap<K>,
            names: &mut N,
            ids: &mut I,
        ) -> DsonMap<K2>
        where
            N: FnMut(K) -> K2,
            I: FnMut(K::ClassId) -> Option<K2::ClassId>,
        {
            map.into_iter()
                .map(|(k, v)| (names(k), v.map_names(names, ids)))
                .collect()
        }

        match self {
            DsonValue::Int32(v) => DsonValue::Int32(v),
            DsonValue::Int64(v) => DsonValue::Int64(v),
            DsonValue::Float(v) => DsonValue::Float(v),
            DsonValue::Double(v) => DsonValue::Double(v),
            DsonValue::Bool(v) => DsonValue::Bool(v),
            DsonValue::String(v) => DsonValue::String(v),
            DsonValue::Null => DsonValue::Null,
            DsonValue::Binary(v) => DsonValue::Binary(v),
            DsonValue::ExtInt32(v) => DsonValue::ExtInt32(v),
            DsonValue::ExtInt64(v) => DsonValue::ExtInt64(v),
            DsonValue::ExtString(v) => DsonValue::ExtString(v),
            DsonValue::Reference(v) => DsonValue::Reference(v),
            DsonValue::Object(obj) => DsonValue::Object(DsonObject {
                class_id: obj.class_id.and_then(&mut *ids),
                header: map_fields(obj.header, names, ids),
                fields: map_fields(obj.fields, names, ids),
            }),
            DsonValue::Array(arr) => DsonValue::Array(DsonArray {
                class_id: arr.class_id.and_then(&mut *ids),
                header: map_fields(arr.header, names, ids),
                elements: arr
                    .elements
                    .into_iter()
                    .map(|v| v.map_names(names, ids))
                    .collect(),
            }),
        }
    }
}

impl<K: DsonName> Default for DsonValue<K> {
    fn default() -> Self {
        DsonValue::Null
    }
}

/// Renders a compact, single-line view. Not the text wire form: line heads are omitted.
impl<K: DsonName> fmt::Display for DsonValue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_header<K: DsonName>(
            f: &mut fmt::Formatter<'_>,
            class_id: &Option<K::ClassId>,
            header: &DsonMap<K>,
        ) -> fmt::Result {
            if let Some(id) = class_id {
                write!(f, "@{}", id)?;
            }
            if !header.is_empty() {
                write!(f, "@{{")?;
                for (i, (k, v)) in header.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")?;
            }
            Ok(())
        }

        match self {
            DsonValue::Int32(v) => write!(f, "{}", v),
            DsonValue::Int64(v) => write!(f, "{}", v),
            DsonValue::Float(v) => write!(f, "{}", v),
            DsonValue::Double(v) => write!(f, "{}", v),
            DsonValue::Bool(v) => write!(f, "{}", v),
            DsonValue::String(s) => write!(f, "{:?}", s),
            DsonValue::Null => write!(f, "null"),
            DsonValue::Binary(b) => write!(f, "@bin [{}, {}]", b.subtype, hex::encode(&b.data)),
            DsonValue::ExtInt32(e) => write!(f, "@ei [{}, {}]", e.subtype, e.value),
            DsonValue::ExtInt64(e) => write!(f, "@eL [{}, {}]", e.subtype, e.value),
            DsonValue::ExtString(e) => write!(f, "@es [{}, {:?}]", e.subtype, e.value),
            DsonValue::Reference(r) => write!(f, "@ref {}", r.local_id),
            DsonValue::Object(obj) => {
                write_header(f, &obj.class_id, &obj.header)?;
                write!(f, "{{")?;
                for (i, (k, v)) in obj.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            DsonValue::Array(arr) => {
                write_header(f, &arr.class_id, &arr.header)?;
                write!(f, "[")?;
                for (i, v) in arr.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Serializes the data view of a value: containers become maps and sequences,
/// class ids and headers are not included.
impl<K: DsonName> Serialize for DsonValue<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DsonValue::Int32(v) => serializer.serialize_i32(*v),
            DsonValue::Int64(v) => serializer.serialize_i64(*v),
            DsonValue::Float(v) => serializer.serialize_f32(*v),
            DsonValue::Double(v) => serializer.serialize_f64(*v),
            DsonValue::Bool(v) => serializer.serialize_bool(*v),
            DsonValue::String(s) => serializer.serialize_str(s),
            DsonValue::Null => serializer.serialize_unit(),
            DsonValue::Binary(b) => b.serialize(serializer),
            DsonValue::ExtInt32(e) => e.serialize(serializer),
            DsonValue::ExtInt64(e) => e.serialize(serializer),
            DsonValue::ExtString(e) => e.serialize(serializer),
            DsonValue::Reference(r) => r.serialize(serializer),
            DsonValue::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.elements.len()))?;
                for element in &arr.elements {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            DsonValue::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.fields.len()))?;
                for (k, v) in obj.fields.iter() {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for DsonValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct DsonValueVisitor;

        impl<'de> Visitor<'de> for DsonValueVisitor {
            type Value = DsonValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid Dson value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(DsonValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(match i32::try_from(value) {
                    Ok(v) => DsonValue::Int32(v),
                    Err(_) => DsonValue::Int64(value),
                })
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                if let Ok(v) = i32::try_from(value) {
                    Ok(DsonValue::Int32(v))
                } else if let Ok(v) = i64::try_from(value) {
                    Ok(DsonValue::Int64(v))
                } else {
                    Ok(DsonValue::Double(value as f64))
                }
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(DsonValue::Double(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(DsonValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(DsonValue::String(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E> {
                Ok(DsonValue::Binary(Binary::new(0, value)))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(DsonValue::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(DsonValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut array = DsonArray::new();
                while let Some(elem) = seq.next_element()? {
                    array.push(elem);
                }
                Ok(DsonValue::Array(array))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut object = DsonObject::new();
                while let Some((key, value)) = map.next_entry()? {
                    object.insert(key, value);
                }
                Ok(DsonValue::Object(object))
            }
        }

        deserializer.deserialize_any(DsonValueVisitor)
    }
}

impl<K: DsonName> TryFrom<DsonValue<K>> for i32 {
    type Error = crate::Error;

    fn try_from(value: DsonValue<K>) -> crate::Result<Self> {
        match value {
            DsonValue::Int32(v) => Ok(v),
            DsonValue::Int64(v) => i32::try_from(v)
                .map_err(|_| crate::Error::custom(format!("{} does not fit in i32", v))),
            other => Err(crate::Error::type_mismatch("Int32", other.dson_type())),
        }
    }
}

impl<K: DsonName> TryFrom<DsonValue<K>> for i64 {
    type Error = crate::Error;

    fn try_from(value: DsonValue<K>) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::type_mismatch("Int64", value.dson_type()))
    }
}

impl<K: DsonName> TryFrom<DsonValue<K>> for f64 {
    type Error = crate::Error;

    fn try_from(value: DsonValue<K>) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::type_mismatch("Double", value.dson_type()))
    }
}

impl<K: DsonName> TryFrom<DsonValue<K>> for bool {
    type Error = crate::Error;

    fn try_from(value: DsonValue<K>) -> crate::Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| crate::Error::type_mismatch("Boolean", value.dson_type()))
    }
}

impl<K: DsonName> TryFrom<DsonValue<K>> for String {
    type Error = crate::Error;

    fn try_from(value: DsonValue<K>) -> crate::Result<Self> {
        match value {
            DsonValue::String(s) => Ok(s),
            other => Err(crate::Error::type_mismatch("String", other.dson_type())),
        }
    }
}

// From implementations for creating DsonValue from primitives
impl<K: DsonName> From<bool> for DsonValue<K> {
    fn from(value: bool) -> Self {
        DsonValue::Bool(value)
    }
}

impl<K: DsonName> From<i8> for DsonValue<K> {
    fn from(value: i8) -> Self {
        DsonValue::Int32(value as i32)
    }
}

impl<K: DsonName> From<i16> for DsonValue<K> {
    fn from(value: i16) -> Self {
        DsonValue::Int32(value as i32)
    }
}

impl<K: DsonName> From<i32> for DsonValue<K> {
    fn from(value: i32) -> Self {
        DsonValue::Int32(value)
    }
}

impl<K: DsonName> From<i64> for DsonValue<K> {
    fn from(value: i64) -> Self {
        DsonValue::Int64(value)
    }
}

impl<K: DsonName> From<u8> for DsonValue<K> {
    fn from(value: u8) -> Self {
        DsonValue::Int32(value as i32)
    }
}

impl<K: DsonName> From<u16> for DsonValue<K> {
    fn from(value: u16) -> Self {
        DsonValue::Int32(value as i32)
    }
}

impl<K: DsonName> From<u32> for DsonValue<K> {
    fn from(value: u32) -> Self {
        DsonValue::Int64(value as i64)
    }
}

impl<K: DsonName> From<f32> for DsonValue<K> {
    fn from(value: f32) -> Self {
        DsonValue::Float(value)
    }
}

impl<K: DsonName> From<f64> for DsonValue<K> {
    fn from(value: f64) -> Self {
        DsonValue::Double(value)
    }
}

impl<K: DsonName> From<String> for DsonValue<K> {
    fn from(value: String) -> Self {
        DsonValue::String(value)
    }
}

impl<K: DsonName> From<&str> for DsonValue<K> {
    fn from(value: &str) -> Self {
        DsonValue::String(value.to_string())
    }
}

impl<K: DsonName> From<Binary> for DsonValue<K> {
    fn from(value: Binary) -> Self {
        DsonValue::Binary(value)
    }
}

impl<K: DsonName> From<ObjectRef> for DsonValue<K> {
    fn from(value: ObjectRef) -> Self {
        DsonValue::Reference(value)
    }
}

impl<K: DsonName> From<Vec<DsonValue<K>>> for DsonValue<K> {
    fn from(value: Vec<DsonValue<K>>) -> Self {
        DsonValue::Array(DsonArray::from(value))
    }
}

impl<K: DsonName> From<DsonMap<K>> for DsonValue<K> {
    fn from(value: DsonMap<K>) -> Self {
        DsonValue::Object(DsonObject::from(value))
    }
}

impl<K: DsonName> From<DsonObject<K>> for DsonValue<K> {
    fn from(value: DsonObject<K>) -> Self {
        DsonValue::Object(value)
    }
}

impl<K: DsonName> From<DsonArray<K>> for DsonValue<K> {
    fn from(value: DsonArray<K>) -> Self {
        DsonValue::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldNumber;

    #[test]
    fn test_tryfrom_i32() {
        let value: DsonValue = DsonValue::Int64(42);
        assert_eq!(i32::try_from(value).unwrap(), 42);

        let value: DsonValue = DsonValue::Int64(i64::MAX);
        assert!(i32::try_from(value).is_err());

        let value: DsonValue = DsonValue::from("x");
        assert!(matches!(
            i32::try_from(value),
            Err(crate::Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_tryfrom_f64_widens() {
        let value: DsonValue = DsonValue::Float(1.5);
        assert_eq!(f64::try_from(value).unwrap(), 1.5);
        let value: DsonValue = DsonValue::Int32(2);
        assert_eq!(f64::try_from(value).unwrap(), 2.0);
    }

    #[test]
    fn test_from_primitives() {
        let v: DsonValue = DsonValue::from(true);
        assert_eq!(v, DsonValue::Bool(true));
        let v: DsonValue = DsonValue::from(42i32);
        assert_eq!(v.dson_type(), DsonType::Int32);
        let v: DsonValue = DsonValue::from(42i64);
        assert_eq!(v.dson_type(), DsonType::Int64);
        let v: DsonValue = DsonValue::from(3.5f32);
        assert_eq!(v.dson_type(), DsonType::Float);
        let v: DsonValue = DsonValue::from("test");
        assert_eq!(v.as_str(), Some("test"));
    }

    #[test]
    fn test_object_header_flag() {
        let mut obj: DsonObject = DsonObject::new();
        assert!(!obj.has_header());
        obj.header
            .insert("tag".to_string(), DsonValue::Int32(1));
        assert!(obj.has_header());
        let obj: DsonObject = DsonObject::new().with_class_id("Point".to_string());
        assert!(obj.has_header());
    }

    #[test]
    fn test_map_names_converts_nested() {
        let mut inner: DsonObject = DsonObject::new().with_class_id("Inner".to_string());
        inner.insert("b".to_string(), DsonValue::Int32(2));
        let mut outer: DsonObject = DsonObject::new();
        outer.insert("a".to_string(), DsonValue::Object(inner));

        let converted: DsonValue<FieldNumber> = DsonValue::Object(outer).map_names(
            &mut |name: String| FieldNumber::of(name.as_bytes()[0] as u32),
            &mut |_id| Some(crate::ClassId::new(1, 9)),
        );
        let outer = converted.as_object().unwrap();
        let inner = outer
            .fields
            .get(&FieldNumber::of(b'a' as u32))
            .and_then(|v| v.as_object())
            .unwrap();
        assert_eq!(inner.class_id, Some(crate::ClassId::new(1, 9)));
        assert_eq!(
            inner.fields.get(&FieldNumber::of(b'b' as u32)),
            Some(&DsonValue::Int32(2))
        );
    }

    #[test]
    fn test_serde_json_view() {
        let mut obj: DsonObject = DsonObject::new();
        obj.insert("n".to_string(), DsonValue::Int32(1));
        obj.insert("s".to_string(), DsonValue::from("x"));
        let json = serde_json::to_string(&DsonValue::Object(obj)).unwrap();
        assert_eq!(json, r#"{"n":1,"s":"x"}"#);

        let back: DsonValue = serde_json::from_str(r#"{"n":1,"big":5000000000,"f":1.5}"#).unwrap();
        let back = back.as_object().unwrap();
        assert_eq!(back.fields.get("n"), Some(&DsonValue::Int32(1)));
        assert_eq!(back.fields.get("big"), Some(&DsonValue::Int64(5_000_000_000)));
        assert_eq!(back.fields.get("f"), Some(&DsonValue::Double(1.5)));
    }

    #[test]
    fn test_display_is_compact() {
        let mut obj: DsonObject = DsonObject::new();
        obj.insert("x".to_string(), DsonValue::Int32(1));
        obj.insert(
            "y".to_string(),
            DsonValue::from(vec![DsonValue::Bool(true), DsonValue::Null]),
        );
        assert_eq!(DsonValue::Object(obj).to_string(), "{x: 1, y: [true, null]}");
    }
}
