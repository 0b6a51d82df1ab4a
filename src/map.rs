//! Ordered field map for Dson objects and headers.
//!
//! [`DsonMap`] wraps an [`IndexMap`] so fields keep the order they were read
//! or inserted in. Field order is part of the encoded form, so a decoded map
//! re-encodes byte-for-byte.
//!
//! The key type is generic over [`DsonName`]: `String` for text, [`FieldNumber`](crate::FieldNumber)
//! for binary.
//!
//! ## Examples
//!
//! ```rust
//! use dson::{DsonMap, DsonValue};
//!
//! let mut map: DsonMap = DsonMap::new();
//! map.insert("name".to_string(), DsonValue::from("Alice"));
//! map.insert("age".to_string(), DsonValue::from(30));
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["name", "age"]);
//! ```

use crate::types::DsonName;
use crate::DsonValue;
use indexmap::IndexMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// An ordered map of field names to Dson values.
#[derive(Debug, Clone, PartialEq)]
pub struct DsonMap<K: DsonName = String>(IndexMap<K, DsonValue<K>>);

impl<K: DsonName> DsonMap<K> {
    /// Creates an empty `DsonMap`.
    #[must_use]
    pub fn new() -> Self {
        DsonMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        DsonMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a field, keeping the original position if the key already existed.
    ///
    /// Returns the previous value for the key.
    pub fn insert(&mut self, key: K, value: DsonValue<K>) -> Option<DsonValue<K>> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&DsonValue<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut DsonValue<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.get_mut(key)
    }

    /// Removes a field, preserving the order of the remaining ones.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<DsonValue<K>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, K, DsonValue<K>> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, K, DsonValue<K>> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, DsonValue<K>> {
        self.0.iter()
    }
}

impl<K: DsonName> Default for DsonMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: DsonName> IntoIterator for DsonMap<K> {
    type Item = (K, DsonValue<K>);
    type IntoIter = indexmap::map::IntoIter<K, DsonValue<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, K: DsonName> IntoIterator for &'a DsonMap<K> {
    type Item = (&'a K, &'a DsonValue<K>);
    type IntoIter = indexmap::map::Iter<'a, K, DsonValue<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: DsonName> FromIterator<(K, DsonValue<K>)> for DsonMap<K> {
    fn from_iter<T: IntoIterator<Item = (K, DsonValue<K>)>>(iter: T) -> Self {
        DsonMap(IndexMap::from_iter(iter))
    }
}

impl<K: DsonName> Extend<(K, DsonValue<K>)> for DsonMap<K> {
    fn extend<T: IntoIterator<Item = (K, DsonValue<K>)>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}
