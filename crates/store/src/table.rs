//! Object tables: per-type storage and the object mutation lifecycle.
//!
//! A `TableInner` owns the objects of one declared type, keyed by id in
//! ascending order. Callers operate through `ObjectTable`, a non-owning
//! handle into the store arena; every mutation raises its raw signal through
//! the registry before the call returns.

use crate::event::TableEvent;
use crate::registry::TrackerRegistry;
use crate::store::StoreHandle;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use ripple_core::schema::ObjectSchema;
use ripple_core::{next_object_id, DomainObject, Error, ObjectId, Result, Value};

/// Index of a table within its store arena.
pub type TableId = u32;

/// Owned storage for one declared object type.
pub struct TableInner {
    id: TableId,
    schema: ObjectSchema,
    objects: BTreeMap<ObjectId, DomainObject>,
    /// Ids currently inside their post-creation hook.
    settling: BTreeSet<ObjectId>,
    /// Settling ids whose removal is deferred until the hook returns.
    pending_removal: BTreeSet<ObjectId>,
}

impl TableInner {
    pub(crate) fn new(id: TableId, schema: ObjectSchema) -> Self {
        Self {
            id,
            schema,
            objects: BTreeMap::new(),
            settling: BTreeSet::new(),
            pending_removal: BTreeSet::new(),
        }
    }

    /// Returns the table id.
    #[inline]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the table schema.
    #[inline]
    pub fn schema(&self) -> &ObjectSchema {
        &self.schema
    }

    /// Gets an object by id.
    pub fn get(&self, id: ObjectId) -> Option<&DomainObject> {
        self.objects.get(&id)
    }

    /// Returns true if the id is present.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Returns the number of live objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the table holds no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates objects in ascending-id order.
    pub fn iter(&self) -> impl Iterator<Item = &DomainObject> {
        self.objects.values()
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut DomainObject> {
        self.objects.get_mut(&id)
    }

    pub(crate) fn insert(&mut self, object: DomainObject) {
        debug_assert!(!self.objects.contains_key(&object.id()));
        self.objects.insert(object.id(), object);
    }

    pub(crate) fn take(&mut self, id: ObjectId) -> Option<DomainObject> {
        self.objects.remove(&id)
    }

    pub(crate) fn begin_settling(&mut self, id: ObjectId) {
        self.settling.insert(id);
    }

    /// Ends the settling window for `id`. A removal deferred during the hook
    /// takes effect here; returns whether the object survived.
    pub(crate) fn end_settling(&mut self, id: ObjectId) -> bool {
        self.settling.remove(&id);
        if self.pending_removal.remove(&id) {
            self.objects.remove(&id);
            return false;
        }
        self.objects.contains_key(&id)
    }

    pub(crate) fn is_settling(&self, id: ObjectId) -> bool {
        self.settling.contains(&id)
    }

    pub(crate) fn is_pending_removal(&self, id: ObjectId) -> bool {
        self.pending_removal.contains(&id)
    }

    pub(crate) fn mark_pending_removal(&mut self, id: ObjectId) {
        self.pending_removal.insert(id);
    }

    pub(crate) fn clear(&mut self) {
        self.objects.clear();
        self.settling.clear();
        self.pending_removal.clear();
    }
}

/// Non-owning handle to one object table in the store arena.
///
/// Cheap to clone; all operations resolve the table through the store and
/// fail with `Error::InvalidState` once the store is dropped or reloaded.
#[derive(Clone)]
pub struct ObjectTable {
    store: StoreHandle,
    table: TableId,
    name: String,
}

impl core::fmt::Debug for ObjectTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectTable")
            .field("table", &self.table)
            .field("name", &self.name)
            .finish()
    }
}

impl ObjectTable {
    pub(crate) fn new(store: StoreHandle, table: TableId, name: String) -> Self {
        Self { store, table, name }
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table id within the store arena.
    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table
    }

    /// Returns the store handle this table resolves through.
    #[inline]
    pub fn store_handle(&self) -> &StoreHandle {
        &self.store
    }

    /// Returns a clone of the table schema.
    pub fn schema(&self) -> Result<ObjectSchema> {
        self.store.with_table(self.table, |t| t.schema().clone())
    }

    /// Creates an object from its initial attributes.
    ///
    /// Allocates a fresh id, validates declared attribute types, inserts the
    /// object, and emits an `Added` signal.
    pub fn create(&self, attributes: BTreeMap<String, Value>) -> Result<ObjectId> {
        self.create_with(attributes, |_, _| Ok(()))
    }

    /// Creates an object, running `hook` after insertion but before the
    /// `Added` signal.
    ///
    /// The hook may mutate the object or remove it. `id_exists` answers true
    /// for the whole hook even after a removal; the removal takes effect
    /// when the hook returns, and a hook-removed object never emits `Added`.
    pub fn create_with<F>(&self, attributes: BTreeMap<String, Value>, hook: F) -> Result<ObjectId>
    where
        F: FnOnce(&ObjectTable, ObjectId) -> Result<()>,
    {
        if attributes.contains_key("id") {
            return Err(Error::invalid_schema("attribute name 'id' is reserved"));
        }
        let table = self.store.table_rc(self.table)?;
        let id = {
            let mut inner = table.borrow_mut();
            for (name, value) in &attributes {
                check_attribute_type(inner.schema(), name, value)?;
            }
            let id = next_object_id();
            inner.insert(DomainObject::new(id, attributes));
            inner.begin_settling(id);
            id
        };

        let hook_result = hook(self, id);
        let survived = table.borrow_mut().end_settling(id);

        if let Err(err) = hook_result {
            table.borrow_mut().take(id);
            return Err(err);
        }

        if survived {
            let snapshot = table.borrow().get(id).cloned();
            if let Some(snapshot) = snapshot {
                self.dispatch(TableEvent::added(self.table, snapshot))?;
                self.commit(id)?;
            }
        }
        Ok(id)
    }

    /// Gets a snapshot of an object by id.
    pub fn get_by_id(&self, id: ObjectId) -> Result<DomainObject> {
        self.store
            .with_table(self.table, |t| t.get(id).cloned())?
            .ok_or_else(|| Error::object_not_found(&self.name, id))
    }

    /// Returns true until the object's eviction completes. Answers true for
    /// the whole post-creation hook even if the hook removed the object.
    pub fn id_exists(&self, id: ObjectId) -> bool {
        self.store
            .with_table(self.table, |t| t.contains(id))
            .unwrap_or(false)
    }

    /// Sets an attribute, recording it in `changed_attributes` if the schema
    /// tracks it, and emits a `Changed` signal.
    pub fn set_attribute(&self, id: ObjectId, name: &str, value: Value) -> Result<()> {
        if name == "id" {
            return Err(Error::invalid_schema("attribute name 'id' is reserved"));
        }
        let table = self.store.table_rc(self.table)?;
        let (snapshot, settling) = {
            let mut inner = table.borrow_mut();
            if !inner.contains(id) {
                return Err(Error::object_not_found(&self.name, id));
            }
            check_attribute_type(inner.schema(), name, &value)?;
            let tracked = inner.schema().is_tracked(name);
            let settling = inner.is_settling(id);
            let obj = inner
                .get_mut(id)
                .ok_or_else(|| Error::object_not_found(&self.name, id))?;
            obj.set_value(name, value);
            if tracked {
                obj.mark_changed(name);
            }
            (obj.clone(), settling)
        };
        // Mutations inside the post-creation hook stay silent; the object
        // has not been announced yet.
        if !settling {
            self.dispatch(TableEvent::changed(self.table, snapshot))?;
            self.commit(id)?;
        }
        Ok(())
    }

    /// Removes an object, emitting a `Removed` signal carrying the
    /// pre-removal snapshot.
    ///
    /// Fails with `Error::AlreadyRemoved` if the id is no longer present.
    /// Inside the object's post-creation hook the eviction is deferred until
    /// the hook returns and no signal is emitted.
    pub fn remove(&self, id: ObjectId) -> Result<()> {
        let table = self.store.table_rc(self.table)?;
        let evicted = {
            let mut inner = table.borrow_mut();
            if inner.is_settling(id) && inner.contains(id) {
                if inner.is_pending_removal(id) {
                    return Err(Error::already_removed(&self.name, id));
                }
                inner.mark_pending_removal(id);
                None
            } else {
                match inner.take(id) {
                    Some(obj) => Some(obj),
                    None => return Err(Error::already_removed(&self.name, id)),
                }
            }
        };
        if let Some(snapshot) = evicted {
            self.dispatch(TableEvent::removed(self.table, snapshot))?;
            if let Some(persister) = self.store.persister()? {
                persister.forget(&self.name, id)?;
            }
        }
        Ok(())
    }

    /// Announces that this object changed in a way views joined against this
    /// table care about. Emits a `RelatedChange` signal; never emitted
    /// automatically by `set_attribute`.
    pub fn signal_related_change(&self, id: ObjectId) -> Result<()> {
        let snapshot = self
            .store
            .with_table(self.table, |t| t.get(id).cloned())?
            .ok_or_else(|| Error::object_not_found(&self.name, id))?;
        self.dispatch(TableEvent::related_change(self.table, snapshot))
    }

    /// Returns the number of live objects.
    pub fn len(&self) -> Result<usize> {
        self.store.with_table(self.table, |t| t.len())
    }

    /// Returns true if the table holds no objects.
    pub fn is_empty(&self) -> Result<bool> {
        self.store.with_table(self.table, |t| t.is_empty())
    }

    /// Returns a restartable iterator over a snapshot of all objects, in
    /// ascending-id order.
    pub fn iter_all(&self) -> Result<impl Iterator<Item = DomainObject>> {
        let snapshot: Vec<DomainObject> = self
            .store
            .with_table(self.table, |t| t.iter().cloned().collect())?;
        Ok(snapshot.into_iter())
    }

    fn dispatch(&self, event: TableEvent) -> Result<()> {
        let registry = self.store.registry()?;
        TrackerRegistry::dispatch(&registry, &event)
    }

    /// Commit point: hands the dirty set to the persister, if any, then
    /// clears it.
    fn commit(&self, id: ObjectId) -> Result<()> {
        let persister = match self.store.persister()? {
            Some(persister) => persister,
            None => return Ok(()),
        };
        let table = self.store.table_rc(self.table)?;
        // An observer may have removed the object during signal delivery;
        // its removal already reached the persister via `forget`.
        let changed = match table.borrow().get(id) {
            Some(obj) => obj.changed_attributes().clone(),
            None => return Ok(()),
        };
        persister.persist(&self.name, id, &changed)?;
        if let Some(obj) = table.borrow_mut().get_mut(id) {
            obj.clear_changed_attributes();
        }
        Ok(())
    }
}

fn check_attribute_type(schema: &ObjectSchema, name: &str, value: &Value) -> Result<()> {
    if let Some(attr) = schema.get_attribute(name) {
        match value.data_type() {
            None => {
                if !attr.is_nullable() {
                    return Err(Error::type_mismatch(attr.data_type(), None));
                }
            }
            Some(dt) => {
                if dt != attr.data_type() {
                    return Err(Error::type_mismatch(attr.data_type(), Some(dt)));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use alloc::rc::Rc;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use ripple_core::schema::SchemaBuilder;
    use ripple_core::DataType;

    fn item_store() -> Store {
        Store::open(vec![SchemaBuilder::new("item")
            .unwrap()
            .add_attribute("title", DataType::String)
            .unwrap()
            .add_attribute("feed_id", DataType::Int64)
            .unwrap()
            .track_attribute_changes("title")
            .unwrap()
            .build()])
        .unwrap()
    }

    fn attrs(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_create_and_get() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let id = items
            .create(attrs(&[
                ("title", Value::from("item1")),
                ("feed_id", Value::Int64(1)),
            ]))
            .unwrap();

        assert!(items.id_exists(id));
        let obj = items.get_by_id(id).unwrap();
        assert_eq!(obj.get("title"), Some(&Value::from("item1")));
        assert_eq!(items.len().unwrap(), 1);
    }

    #[test]
    fn test_get_missing_fails() {
        let store = item_store();
        let items = store.table("item").unwrap();
        assert!(matches!(
            items.get_by_id(999).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
    }

    #[test]
    fn test_create_type_check() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let err = items
            .create(attrs(&[("feed_id", Value::from("not a number"))]))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_undeclared_attribute_allowed() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let id = items.create(attrs(&[])).unwrap();
        items
            .set_attribute(id, "bar", Value::Int64(2))
            .unwrap();
        assert_eq!(
            items.get_by_id(id).unwrap().get("bar"),
            Some(&Value::Int64(2))
        );
    }

    #[test]
    fn test_changed_attributes_tracking() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let id = items.create(attrs(&[])).unwrap();

        let changed = items.get_by_id(id).unwrap().changed_attributes().clone();
        assert_eq!(changed.iter().collect::<Vec<_>>(), ["id"]);

        // "title" is tracked, "bar" is not.
        items.set_attribute(id, "title", Value::from("x")).unwrap();
        items.set_attribute(id, "bar", Value::Int64(2)).unwrap();
        let changed = items.get_by_id(id).unwrap().changed_attributes().clone();
        assert!(changed.contains("id"));
        assert!(changed.contains("title"));
        assert!(!changed.contains("bar"));
    }

    #[test]
    fn test_remove_and_double_remove() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let id = items.create(attrs(&[])).unwrap();

        items.remove(id).unwrap();
        assert!(!items.id_exists(id));
        assert!(matches!(
            items.remove(id).unwrap_err(),
            Error::AlreadyRemoved { .. }
        ));
    }

    #[test]
    fn test_set_attribute_id_reserved() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let id = items.create(attrs(&[])).unwrap();
        assert!(items.set_attribute(id, "id", Value::Int64(5)).is_err());
    }

    #[test]
    fn test_id_exists_inside_hook() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();
        items
            .create_with(attrs(&[]), move |table, id| {
                *seen_clone.borrow_mut() = Some(table.id_exists(id));
                Ok(())
            })
            .unwrap();
        assert_eq!(*seen.borrow(), Some(true));
    }

    #[test]
    fn test_remove_inside_hook() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let id = items
            .create_with(attrs(&[]), move |table, id| {
                table.remove(id)?;
                // Removal defers until the hook returns.
                seen_clone.borrow_mut().push(table.id_exists(id));
                Ok(())
            })
            .unwrap();
        assert_eq!(*seen.borrow(), vec![true]);
        assert!(!items.id_exists(id));
        assert_eq!(items.len().unwrap(), 0);
    }

    #[test]
    fn test_double_remove_inside_hook() {
        let store = item_store();
        let items = store.table("item").unwrap();
        items
            .create_with(attrs(&[]), |table, id| {
                table.remove(id).unwrap();
                assert!(matches!(
                    table.remove(id).unwrap_err(),
                    Error::AlreadyRemoved { .. }
                ));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_hook_error_discards_object() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let result = items.create_with(attrs(&[]), |_, _| {
            Err(Error::invalid_state("hook failure"))
        });
        assert!(result.is_err());
        assert_eq!(items.len().unwrap(), 0);
    }

    #[test]
    fn test_iter_all_ascending_order() {
        let store = item_store();
        let items = store.table("item").unwrap();
        let a = items.create(attrs(&[])).unwrap();
        let b = items.create(attrs(&[])).unwrap();

        let ids: Vec<ObjectId> = items.iter_all().unwrap().map(|o| o.id()).collect();
        assert_eq!(ids, vec![a, b]);

        // Restartable: a second call observes the same snapshot semantics.
        let again: Vec<ObjectId> = items.iter_all().unwrap().map(|o| o.id()).collect();
        assert_eq!(again, ids);
    }

    #[test]
    fn test_signal_related_change_requires_object() {
        let store = item_store();
        let items = store.table("item").unwrap();
        assert!(matches!(
            items.signal_related_change(42).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
    }

    #[test]
    fn test_nullable_attribute() {
        let store = Store::open(vec![SchemaBuilder::new("feed")
            .unwrap()
            .add_attribute("user_title", DataType::String)
            .unwrap()
            .nullable(&["user_title"])
            .build()])
        .unwrap();
        let feeds = store.table("feed").unwrap();
        let id = feeds.create(attrs(&[("user_title", Value::Null)])).unwrap();
        feeds.set_attribute(id, "user_title", Value::Null).unwrap();

        // Non-nullable attributes reject null.
        let store = item_store();
        let items = store.table("item").unwrap();
        let id = items.create(attrs(&[])).unwrap();
        assert!(items.set_attribute(id, "title", Value::Null).is_err());
    }
}
