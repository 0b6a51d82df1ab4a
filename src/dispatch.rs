//! Runtime-type dispatch for typed containers.
//!
//! A [`DsonCodec`] converts one runtime type to and from a [`DsonValue`].
//! [`ObjectConverter`] combines a [`TypeRegistry`], a [`CodecRegistry`] and a
//! [`TypeIdPolicy`]:
//!
//! - encoding tags a container with its runtime type's class id when the
//!   policy asks for one ([`needs_class_id`])
//! - decoding picks a codec from the container's class id and the declared
//!   type ([`resolve_decoder`])
//!
//! ```rust
//! use std::collections::HashMap;
//! use dson::dispatch::{CodecRegistry, ObjectConverter};
//! use dson::registry::{kinds, TypeRegistry};
//! use dson::{DsonValue, TypeIdPolicy};
//!
//! let converter = ObjectConverter::new(
//!     TypeRegistry::builtins::<String>(),
//!     CodecRegistry::<String>::with_builtins(),
//!     TypeIdPolicy::Optimized,
//! );
//!
//! let mut map: HashMap<String, DsonValue> = HashMap::new();
//! map.insert("a".to_string(), DsonValue::Int32(1));
//!
//! // HashMap is the default Map, so no class id is written.
//! let value = converter.encode_as::<_, kinds::Map>(&map).unwrap();
//! assert_eq!(value.as_object().unwrap().class_id, None);
//!
//! let back: HashMap<String, DsonValue> = converter.decode(value).unwrap();
//! assert_eq!(back, map);
//! ```

use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::de::from_value;
use crate::error::{Error, Result};
use crate::map::DsonMap;
use crate::options::TypeIdPolicy;
use crate::registry::{TypeKey, TypeRegistry};
use crate::ser::to_value;
use crate::types::{DsonName, DsonType};
use crate::value::{DsonArray, DsonObject, DsonValue};

/// Converts one runtime type to and from a [`DsonValue`].
///
/// The trait is object safe; values cross it as [`Any`].
pub trait DsonCodec<K: DsonName>: Send + Sync {
    /// The runtime type this codec handles.
    fn type_key(&self) -> TypeKey;

    fn encode_any(&self, value: &dyn Any) -> Result<DsonValue<K>>;

    /// Returns a boxed value of the type named by [`type_key`](Self::type_key).
    fn decode_any(&self, value: DsonValue<K>) -> Result<Box<dyn Any>>;
}

type EncodeFn<T, K> = dyn Fn(&T) -> Result<DsonValue<K>> + Send + Sync;
type DecodeFn<T, K> = dyn Fn(DsonValue<K>) -> Result<T> + Send + Sync;

/// A codec built from a pair of closures.
pub struct FnCodec<T, K: DsonName> {
    encode: Box<EncodeFn<T, K>>,
    decode: Box<DecodeFn<T, K>>,
}

impl<T: 'static, K: DsonName> FnCodec<T, K> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<DsonValue<K>> + Send + Sync + 'static,
        D: Fn(DsonValue<K>) -> Result<T> + Send + Sync + 'static,
    {
        FnCodec {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }
}

impl<T: 'static, K: DsonName> DsonCodec<K> for FnCodec<T, K> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn encode_any(&self, value: &dyn Any) -> Result<DsonValue<K>> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| Error::type_mismatch(type_name::<T>(), "a value of another type"))?;
        (self.encode)(value)
    }

    fn decode_any(&self, value: DsonValue<K>) -> Result<Box<dyn Any>> {
        Ok(Box::new((self.decode)(value)?))
    }
}

/// A text-named codec for any serde type, through [`to_value`] and [`from_value`].
pub struct SerdeCodec<T>(PhantomData<fn() -> T>);

impl<T> SerdeCodec<T> {
    #[must_use]
    pub fn new() -> Self {
        SerdeCodec(PhantomData)
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DsonCodec<String> for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn encode_any(&self, value: &dyn Any) -> Result<DsonValue> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| Error::type_mismatch(type_name::<T>(), "a value of another type"))?;
        to_value(value)
    }

    fn decode_any(&self, value: DsonValue) -> Result<Box<dyn Any>> {
        Ok(Box::new(from_value::<T>(value)?))
    }
}

/// Codecs indexed by the runtime type they handle.
pub struct CodecRegistry<K: DsonName> {
    codecs: HashMap<TypeKey, Box<dyn DsonCodec<K>>>,
}

impl<K: DsonName> Default for CodecRegistry<K> {
    fn default() -> Self {
        CodecRegistry {
            codecs: HashMap::new(),
        }
    }
}

impl<K: DsonName> CodecRegistry<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Codecs for every type in [`TypeRegistry::builtins`].
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut codecs = Self::new();
        codecs.insert_builtin(FnCodec::new(
            |object: &DsonObject<K>| Ok(DsonValue::Object(object.clone())),
            |value| match value {
                DsonValue::Object(object) => Ok(object),
                other => Err(Error::type_mismatch(DsonType::Object, other.dson_type())),
            },
        ));
        codecs.insert_builtin(FnCodec::new(
            |array: &DsonArray<K>| Ok(DsonValue::Array(array.clone())),
            |value| match value {
                DsonValue::Array(array) => Ok(array),
                other => Err(Error::type_mismatch(DsonType::Array, other.dson_type())),
            },
        ));
        codecs.insert_builtin(FnCodec::new(
            |map: &HashMap<K, DsonValue<K>>| Ok(object_of(map.iter())),
            |value| Ok(fields_of(value)?.into_iter().collect::<HashMap<_, _>>()),
        ));
        codecs.insert_builtin(FnCodec::new(
            |map: &BTreeMap<K, DsonValue<K>>| Ok(object_of(map.iter())),
            |value| Ok(fields_of(value)?.into_iter().collect::<BTreeMap<_, _>>()),
        ));
        codecs.insert_builtin(FnCodec::new(
            |map: &IndexMap<K, DsonValue<K>>| Ok(object_of(map.iter())),
            |value| Ok(fields_of(value)?.into_iter().collect::<IndexMap<_, _>>()),
        ));
        codecs.insert_builtin(FnCodec::new(
            |list: &Vec<DsonValue<K>>| Ok(array_of(list.iter())),
            elements_of,
        ));
        codecs.insert_builtin(FnCodec::new(
            |list: &VecDeque<DsonValue<K>>| Ok(array_of(list.iter())),
            |value| Ok(elements_of(value)?.into_iter().collect::<VecDeque<_>>()),
        ));
        codecs
    }

    fn insert_builtin<C: DsonCodec<K> + 'static>(&mut self, codec: C) {
        self.codecs.insert(codec.type_key(), Box::new(codec));
    }

    /// Adds a codec. A second codec for the same type is an error.
    pub fn register<C: DsonCodec<K> + 'static>(&mut self, codec: C) -> Result<()> {
        let key = codec.type_key();
        if self.codecs.contains_key(&key) {
            return Err(Error::registry(format!("codec for {} registered twice", key)));
        }
        self.codecs.insert(key, Box::new(codec));
        Ok(())
    }

    pub fn get(&self, key: &TypeKey) -> Option<&dyn DsonCodec<K>> {
        self.codecs.get(key).map(|codec| codec.as_ref())
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.codecs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

fn object_of<'a, K, I>(entries: I) -> DsonValue<K>
where
    K: DsonName,
    I: Iterator<Item = (&'a K, &'a DsonValue<K>)>,
{
    let fields: DsonMap<K> = entries.map(|(k, v)| (k.clone(), v.clone())).collect();
    DsonValue::Object(DsonObject::from(fields))
}

fn array_of<'a, K, I>(elements: I) -> DsonValue<K>
where
    K: DsonName,
    I: Iterator<Item = &'a DsonValue<K>>,
{
    DsonValue::Array(DsonArray::from(elements.cloned().collect::<Vec<_>>()))
}

fn fields_of<K: DsonName>(value: DsonValue<K>) -> Result<DsonMap<K>> {
    match value {
        DsonValue::Object(object) => Ok(object.fields),
        other => Err(Error::type_mismatch(DsonType::Object, other.dson_type())),
    }
}

fn elements_of<K: DsonName>(value: DsonValue<K>) -> Result<Vec<DsonValue<K>>> {
    match value {
        DsonValue::Array(array) => Ok(array.elements),
        other => Err(Error::type_mismatch(DsonType::Array, other.dson_type())),
    }
}

/// How a decoder was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The container's class id named a registered, assignable type.
    Actual(TypeKey),
    /// The declared type's own codec, ignoring or lacking a class id.
    Declared(TypeKey),
    /// The registered default implementation of a declared family.
    DefaultImpl(TypeKey),
}

impl Resolution {
    /// The runtime type whose codec decodes the value.
    pub fn key(&self) -> TypeKey {
        match *self {
            Resolution::Actual(key) | Resolution::Declared(key) | Resolution::DefaultImpl(key) => {
                key
            }
        }
    }
}

/// Picks the codec for a container declared as `declared` and tagged with `class_id`.
///
/// Order: the tagged type if it is registered, assignable and has a codec;
/// then the declared type; then the default implementation of the declared
/// family. An unknown tag is not an error: the value is projected onto the
/// declared type.
pub fn resolve_decoder<K: DsonName>(
    registry: &TypeRegistry,
    codecs: &CodecRegistry<K>,
    declared: &TypeKey,
    class_id: Option<&K::ClassId>,
) -> Result<Resolution> {
    if let Some(id) = class_id {
        match K::lookup(id, registry) {
            Some(meta) if meta.is_assignable_to(declared) && codecs.contains(&meta.key()) => {
                trace!(%id, actual = %meta.key(), "decoding by actual type");
                return Ok(Resolution::Actual(meta.key()));
            }
            Some(meta) => {
                trace!(%id, actual = %meta.key(), %declared, "tagged type not usable, projecting");
            }
            None => {
                trace!(%id, %declared, "unknown class id, projecting");
            }
        }
    }
    if codecs.contains(declared) {
        trace!(%declared, "decoding by declared type");
        return Ok(Resolution::Declared(*declared));
    }
    if let Some(meta) = registry.default_for(declared) {
        if codecs.contains(&meta.key()) {
            trace!(%declared, implementation = %meta.key(), "decoding by default implementation");
            return Ok(Resolution::DefaultImpl(meta.key()));
        }
    }
    Err(Error::NoCodec(declared.to_string()))
}

/// Whether a value of type `runtime` stored where `declared` is expected
/// carries a class id.
pub fn needs_class_id(
    policy: TypeIdPolicy,
    registry: &TypeRegistry,
    runtime: &TypeKey,
    declared: &TypeKey,
) -> bool {
    match policy {
        TypeIdPolicy::Always => true,
        TypeIdPolicy::None => false,
        TypeIdPolicy::Optimized => {
            if runtime == declared {
                return false;
            }
            registry
                .default_for(declared)
                .map_or(true, |meta| meta.key() != *runtime)
        }
    }
}

/// Typed encode/decode over a registry, a codec set and an id policy.
pub struct ObjectConverter<K: DsonName> {
    registry: TypeRegistry,
    codecs: CodecRegistry<K>,
    policy: TypeIdPolicy,
}

impl<K: DsonName> ObjectConverter<K> {
    pub fn new(registry: TypeRegistry, codecs: CodecRegistry<K>, policy: TypeIdPolicy) -> Self {
        ObjectConverter {
            registry,
            codecs,
            policy,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn codecs(&self) -> &CodecRegistry<K> {
        &self.codecs
    }

    pub fn policy(&self) -> TypeIdPolicy {
        self.policy
    }

    /// Encodes `value` where its own type is declared.
    pub fn encode<T: 'static>(&self, value: &T) -> Result<DsonValue<K>> {
        self.encode_any(value, TypeKey::of::<T>(), &TypeKey::of::<T>())
    }

    /// Encodes `value` stored where `D` is declared.
    pub fn encode_as<T: 'static, D: ?Sized + 'static>(&self, value: &T) -> Result<DsonValue<K>> {
        self.encode_any(value, TypeKey::of::<T>(), &TypeKey::of::<D>())
    }

    pub fn encode_any(
        &self,
        value: &dyn Any,
        runtime: TypeKey,
        declared: &TypeKey,
    ) -> Result<DsonValue<K>> {
        let codec = self
            .codecs
            .get(&runtime)
            .ok_or_else(|| Error::NoCodec(runtime.to_string()))?;
        let mut encoded = codec.encode_any(value)?;

        let class_id = if needs_class_id(self.policy, &self.registry, &runtime, declared) {
            self.registry.of_type(&runtime).and_then(K::canonical_id)
        } else {
            None
        };
        trace!(%runtime, %declared, tagged = class_id.is_some(), "encoded typed value");
        match &mut encoded {
            DsonValue::Object(object) => object.class_id = class_id,
            DsonValue::Array(array) => array.class_id = class_id,
            _ => {}
        }
        Ok(encoded)
    }

    /// Decodes a value declared as `T`. A class id naming a different
    /// runtime type is a type mismatch; use [`decode_as`](Self::decode_as)
    /// for declared families.
    pub fn decode<T: 'static>(&self, value: DsonValue<K>) -> Result<T> {
        let (resolution, decoded) = self.decode_as::<T>(value)?;
        decoded
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Error::type_mismatch(type_name::<T>(), resolution.key()))
    }

    /// Decodes a value declared as `D`, returning the chosen runtime type.
    pub fn decode_as<D: ?Sized + 'static>(
        &self,
        value: DsonValue<K>,
    ) -> Result<(Resolution, Box<dyn Any>)> {
        let class_id = match &value {
            DsonValue::Object(object) => object.class_id.clone(),
            DsonValue::Array(array) => array.class_id.clone(),
            _ => None,
        };
        let declared = TypeKey::of::<D>();
        let resolution =
            resolve_decoder(&self.registry, &self.codecs, &declared, class_id.as_ref())?;
        let codec = self
            .codecs
            .get(&resolution.key())
            .ok_or_else(|| Error::NoCodec(resolution.key().to_string()))?;
        Ok((resolution, codec.decode_any(value)?))
    }
}
