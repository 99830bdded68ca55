//! Domain object structure for the Ripple object store.
//!
//! This module defines `DomainObject`, the identity-bearing unit of domain
//! data, together with the process-wide object id allocator.

use crate::value::Value;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a domain object. Never reused within a process run.
pub type ObjectId = u64;

/// Global object id counter for generating unique ids.
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Gets the next unique object id.
pub fn next_object_id() -> ObjectId {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::SeqCst)
}

/// Sets the next object id. Used by persistence backends during reload.
pub fn set_next_object_id(id: ObjectId) {
    NEXT_OBJECT_ID.store(id, Ordering::SeqCst);
}

/// Sets the next object id only if it's greater than the current value.
pub fn set_next_object_id_if_greater(id: ObjectId) {
    NEXT_OBJECT_ID.fetch_max(id, Ordering::SeqCst);
}

/// An identity-bearing unit of domain data.
///
/// Attributes are stored by name. `changed_attributes` records the attribute
/// names dirtied since the last persist; it is seeded with `"id"` at
/// creation because the identity itself must reach durable storage.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainObject {
    /// Unique identifier, immutable for the object's lifetime.
    id: ObjectId,
    /// Attribute name -> value.
    attributes: BTreeMap<String, Value>,
    /// Attribute names dirtied since last persist.
    changed_attributes: BTreeSet<String>,
}

impl DomainObject {
    /// Creates a new object with the given id and initial attributes.
    pub fn new(id: ObjectId, attributes: BTreeMap<String, Value>) -> Self {
        let mut changed_attributes = BTreeSet::new();
        changed_attributes.insert("id".to_string());
        Self {
            id,
            attributes,
            changed_attributes,
        }
    }

    /// Creates a new object with an automatically assigned id.
    pub fn create(attributes: BTreeMap<String, Value>) -> Self {
        Self::new(next_object_id(), attributes)
    }

    /// Returns the object id.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Gets an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns all attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of attributes.
    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the object carries no attributes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Sets an attribute value. Does not touch `changed_attributes`; the
    /// owning table decides whether the name is tracked.
    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Records an attribute name as dirtied since last persist.
    pub fn mark_changed(&mut self, name: impl Into<String>) {
        self.changed_attributes.insert(name.into());
    }

    /// Returns the attribute names dirtied since last persist.
    #[inline]
    pub fn changed_attributes(&self) -> &BTreeSet<String> {
        &self.changed_attributes
    }

    /// Clears the dirty set after a successful persist.
    pub fn clear_changed_attributes(&mut self) {
        self.changed_attributes.clear();
    }
}
