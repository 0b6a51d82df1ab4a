//! Type identifiers for typed containers.
//!
//! A [`TypeRegistry`] maps runtime types to the ids written in front of typed
//! objects and arrays: a [`ClassId`] in binary, a class name in text. Every
//! type may have several ids of each kind; the first is canonical and the
//! rest are accepted aliases when reading.
//!
//! ```rust
//! use dson::registry::{TypeKey, TypeMeta, TypeRegistry};
//! use dson::ClassId;
//!
//! struct Point;
//!
//! let registry = TypeRegistry::builder()
//!     .register(TypeMeta::of::<Point>().with_id(ClassId::new(1, 1)).with_name("Point").with_name("Pt"))
//!     .build()
//!     .unwrap();
//!
//! let meta = registry.of_name("Pt").unwrap();
//! assert_eq!(meta.key(), TypeKey::of::<Point>());
//! assert_eq!(registry.of_id(&ClassId::new(1, 1)).unwrap().class_names()[0], "Point");
//! ```
//!
//! Registries are immutable once built and can be shared between threads.
//! [`TypeRegistry::compose`] layers several registries, typically user types
//! over [`TypeRegistry::builtins`], and fails on any collision.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::tokenizer::RESERVED_HEADER_NAMES;
use crate::types::{ClassId, DsonName};
use crate::value::{DsonArray, DsonObject, DsonValue};

/// Declared-type families that have no single runtime type.
pub mod kinds {
    /// Any type. Every registered type is assignable to it.
    pub enum Object {}
    /// Key/value collections.
    pub enum Map {}
    /// Ordered collections.
    pub enum List {}
}

/// Identity of a runtime type.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The Rust type name, for messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Registration of one runtime type.
#[derive(Clone, Debug)]
pub struct TypeMeta {
    key: TypeKey,
    class_ids: Vec<ClassId>,
    class_names: Vec<String>,
    supertypes: Vec<TypeKey>,
    default_for: Option<TypeKey>,
}

impl TypeMeta {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeMeta {
            key: TypeKey::of::<T>(),
            class_ids: Vec::new(),
            class_names: Vec::new(),
            supertypes: Vec::new(),
            default_for: None,
        }
    }

    /// Adds a binary id. The first one added is canonical.
    #[must_use]
    pub fn with_id(mut self, id: ClassId) -> Self {
        self.class_ids.push(id);
        self
    }

    /// Adds a text class name. The first one added is canonical.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.class_names.push(name.into());
        self
    }

    /// Declares that values of this type may stand where `S` is declared.
    #[must_use]
    pub fn with_supertype<S: ?Sized + 'static>(mut self) -> Self {
        self.supertypes.push(TypeKey::of::<S>());
        self
    }

    /// Makes this type the implementation used for the declared family `F`.
    /// Implies `F` as a supertype.
    #[must_use]
    pub fn default_for<F: ?Sized + 'static>(mut self) -> Self {
        let family = TypeKey::of::<F>();
        if !self.supertypes.contains(&family) {
            self.supertypes.push(family);
        }
        self.default_for = Some(family);
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn class_ids(&self) -> &[ClassId] {
        &self.class_ids
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }

    /// The family this type is the default implementation of.
    pub fn default_family(&self) -> Option<TypeKey> {
        self.default_for
    }

    /// `true` when a value of this type may be used where `declared` is expected.
    pub fn is_assignable_to(&self, declared: &TypeKey) -> bool {
        self.key == *declared
            || *declared == TypeKey::of::<kinds::Object>()
            || self.supertypes.contains(declared)
    }
}

/// Immutable bidirectional map between runtime types and class ids.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    metas: Vec<TypeMeta>,
    by_type: HashMap<TypeKey, usize>,
    by_id: HashMap<ClassId, usize>,
    by_name: HashMap<String, usize>,
    defaults: HashMap<TypeKey, usize>,
}

impl TypeRegistry {
    /// A builder for user types. Namespace 0 is rejected.
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder {
            metas: Vec::new(),
            allow_builtin_namespace: false,
        }
    }

    /// Built-in collection types over `DsonValue<K>`.
    ///
    /// `HashMap` is the default [`kinds::Map`], `Vec` the default
    /// [`kinds::List`] and [`DsonObject`] the default [`kinds::Object`].
    pub fn builtins<K: DsonName>() -> TypeRegistry {
        let builder = TypeRegistryBuilder {
            metas: Vec::new(),
            allow_builtin_namespace: true,
        };
        let registry = builder
            .register(
                TypeMeta::of::<DsonObject<K>>()
                    .with_id(ClassId::new(0, 1))
                    .with_name("Object")
                    .default_for::<kinds::Object>(),
            )
            .register(
                TypeMeta::of::<DsonArray<K>>()
                    .with_id(ClassId::new(0, 2))
                    .with_name("Array")
                    .with_supertype::<kinds::List>(),
            )
            .register(
                TypeMeta::of::<HashMap<K, DsonValue<K>>>()
                    .with_id(ClassId::new(0, 3))
                    .with_name("HashMap")
                    .default_for::<kinds::Map>(),
            )
            .register(
                TypeMeta::of::<BTreeMap<K, DsonValue<K>>>()
                    .with_id(ClassId::new(0, 4))
                    .with_name("BTreeMap")
                    .with_supertype::<kinds::Map>(),
            )
            .register(
                TypeMeta::of::<IndexMap<K, DsonValue<K>>>()
                    .with_id(ClassId::new(0, 5))
                    .with_name("IndexMap")
                    .with_supertype::<kinds::Map>(),
            )
            .register(
                TypeMeta::of::<Vec<DsonValue<K>>>()
                    .with_id(ClassId::new(0, 6))
                    .with_name("Vec")
                    .default_for::<kinds::List>(),
            )
            .register(
                TypeMeta::of::<VecDeque<DsonValue<K>>>()
                    .with_id(ClassId::new(0, 7))
                    .with_name("VecDeque")
                    .with_supertype::<kinds::List>(),
            )
            .build();
        // The table above is fixed; a failure here is a bug in it.
        registry.unwrap_or_default()
    }

    /// Merges registries. Any type, id, name or default collision is an error.
    pub fn compose<I>(sources: I) -> Result<TypeRegistry>
    where
        I: IntoIterator<Item = TypeRegistry>,
    {
        let mut composed = TypeRegistry::default();
        for (index, source) in sources.into_iter().enumerate() {
            debug!(source = index, types = source.len(), "composing type registry");
            for meta in source.metas {
                composed.insert(meta)?;
            }
        }
        Ok(composed)
    }

    fn insert(&mut self, meta: TypeMeta) -> Result<()> {
        if self.by_type.contains_key(&meta.key) {
            return Err(Error::registry(format!("type {} registered twice", meta.key)));
        }
        if let Some(id) = meta.class_ids.iter().find(|id| self.by_id.contains_key(id)) {
            return Err(Error::registry(format!(
                "class id {} of {} is already taken",
                id, meta.key
            )));
        }
        if let Some(name) = meta.class_names.iter().find(|n| self.by_name.contains_key(*n)) {
            return Err(Error::registry(format!(
                "class name {:?} of {} is already taken",
                name, meta.key
            )));
        }
        if let Some(family) = meta.default_for {
            if self.defaults.contains_key(&family) {
                return Err(Error::registry(format!(
                    "{} already has a default implementation",
                    family
                )));
            }
        }
        if has_duplicates(&meta.class_ids) || has_duplicates(&meta.class_names) {
            return Err(Error::registry(format!("{} lists an id twice", meta.key)));
        }

        let index = self.metas.len();
        self.by_type.insert(meta.key, index);
        for id in &meta.class_ids {
            self.by_id.insert(*id, index);
        }
        for name in &meta.class_names {
            self.by_name.insert(name.clone(), index);
        }
        if let Some(family) = meta.default_for {
            self.defaults.insert(family, index);
        }
        self.metas.push(meta);
        Ok(())
    }

    pub fn of_type(&self, key: &TypeKey) -> Option<&TypeMeta> {
        self.by_type.get(key).map(|&i| &self.metas[i])
    }

    pub fn of_id(&self, id: &ClassId) -> Option<&TypeMeta> {
        self.by_id.get(id).map(|&i| &self.metas[i])
    }

    pub fn of_name(&self, name: &str) -> Option<&TypeMeta> {
        self.by_name.get(name).map(|&i| &self.metas[i])
    }

    /// The default implementation registered for a declared family.
    pub fn default_for(&self, family: &TypeKey) -> Option<&TypeMeta> {
        self.defaults.get(family).map(|&i| &self.metas[i])
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeMeta> {
        self.metas.iter()
    }
}

fn has_duplicates<T: PartialEq>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, item)| items[..i].contains(item))
}

/// Collects and validates registrations.
#[derive(Debug)]
pub struct TypeRegistryBuilder {
    metas: Vec<TypeMeta>,
    allow_builtin_namespace: bool,
}

impl TypeRegistryBuilder {
    #[must_use]
    pub fn register(mut self, meta: TypeMeta) -> Self {
        self.metas.push(meta);
        self
    }

    pub fn build(self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::default();
        for meta in self.metas {
            for id in &meta.class_ids {
                if id.is_object() {
                    return Err(Error::registry(format!(
                        "{}: class id 0:0 means no declared type",
                        meta.key
                    )));
                }
                if id.namespace == 0 && !self.allow_builtin_namespace {
                    return Err(Error::registry(format!(
                        "{}: namespace 0 is reserved for built-in types",
                        meta.key
                    )));
                }
            }
            for name in &meta.class_names {
                if name.is_empty() {
                    return Err(Error::registry(format!("{}: empty class name", meta.key)));
                }
                if RESERVED_HEADER_NAMES.contains(&name.as_str()) {
                    return Err(Error::registry(format!(
                        "{}: class name {:?} is reserved",
                        meta.key, name
                    )));
                }
            }
            registry.insert(meta)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldNumber;

    struct Point;
    struct Point3;
    trait Shape {}

    #[test]
    fn test_lookup_both_ways_with_aliases() {
        let registry = TypeRegistry::builder()
            .register(
                TypeMeta::of::<Point>()
                    .with_id(ClassId::new(1, 10))
                    .with_id(ClassId::new(1, 11))
                    .with_name("Point"),
            )
            .build()
            .unwrap();
        let meta = registry.of_type(&TypeKey::of::<Point>()).unwrap();
        assert_eq!(meta.class_ids()[0], ClassId::new(1, 10));
        assert_eq!(
            registry.of_id(&ClassId::new(1, 11)).map(TypeMeta::key),
            Some(TypeKey::of::<Point>())
        );
        assert!(registry.of_name("Point3").is_none());
    }

    #[test]
    fn test_builder_validation() {
        let reserved = TypeRegistry::builder()
            .register(TypeMeta::of::<Point>().with_name("ref"))
            .build();
        assert!(matches!(reserved, Err(Error::Registry(_))));

        let builtin_ns = TypeRegistry::builder()
            .register(TypeMeta::of::<Point>().with_id(ClassId::new(0, 9)))
            .build();
        assert!(builtin_ns.is_err());

        let object_id = TypeRegistry::builder()
            .register(TypeMeta::of::<Point>().with_id(ClassId::OBJECT))
            .build();
        assert!(object_id.is_err());

        let duplicate = TypeRegistry::builder()
            .register(TypeMeta::of::<Point>().with_name("P"))
            .register(TypeMeta::of::<Point3>().with_name("P"))
            .build();
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_compose_rejects_collisions() {
        let user = TypeRegistry::builder()
            .register(TypeMeta::of::<Point>().with_id(ClassId::new(1, 1)))
            .build()
            .unwrap();
        let composed =
            TypeRegistry::compose([TypeRegistry::builtins::<String>(), user]).unwrap();
        assert_eq!(composed.len(), TypeRegistry::builtins::<String>().len() + 1);

        let clash = TypeRegistry::builder()
            .register(TypeMeta::of::<Point3>().with_id(ClassId::new(1, 1)))
            .build()
            .unwrap();
        let again = TypeRegistry::builder()
            .register(TypeMeta::of::<Point>().with_id(ClassId::new(1, 1)))
            .build()
            .unwrap();
        assert!(TypeRegistry::compose([again, clash]).is_err());
    }

    #[test]
    fn test_builtins_defaults() {
        let registry = TypeRegistry::builtins::<FieldNumber>();
        assert_eq!(registry.len(), 7);
        let map = registry.default_for(&TypeKey::of::<kinds::Map>()).unwrap();
        assert_eq!(
            map.key(),
            TypeKey::of::<HashMap<FieldNumber, DsonValue<FieldNumber>>>()
        );
        let list = registry.default_for(&TypeKey::of::<kinds::List>()).unwrap();
        assert_eq!(list.class_names()[0], "Vec");
        let tree = registry.of_name("BTreeMap").unwrap();
        assert!(tree.is_assignable_to(&TypeKey::of::<kinds::Map>()));
        assert!(!tree.is_assignable_to(&TypeKey::of::<kinds::List>()));
        assert!(tree.is_assignable_to(&TypeKey::of::<kinds::Object>()));
    }

    #[test]
    fn test_supertype_assignability() {
        let meta = TypeMeta::of::<Point>().with_supertype::<dyn Shape>();
        assert!(meta.is_assignable_to(&TypeKey::of::<dyn Shape>()));
        assert!(meta.is_assignable_to(&TypeKey::of::<Point>()));
        assert!(!meta.is_assignable_to(&TypeKey::of::<Point3>()));
    }
}
