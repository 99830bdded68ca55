//! The central store arena.
//!
//! A `Store` owns one `TableInner` per declared schema plus the tracker
//! registry and the optional persister. Everything else — table handles,
//! views, trackers — holds a `StoreHandle`: a weak, generation-checked
//! reference that goes stale when the store is dropped or reloaded.

use crate::persist::Persister;
use crate::registry::{SharedRegistry, TrackerRegistry};
use crate::table::{ObjectTable, TableId, TableInner};
use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use ripple_core::schema::ObjectSchema;
use ripple_core::{Error, Result};

pub(crate) struct StoreInner {
    /// Bumped on reload; handles from earlier generations are stale.
    generation: u64,
    tables: BTreeMap<TableId, Rc<RefCell<TableInner>>>,
    by_name: BTreeMap<String, TableId>,
    registry: SharedRegistry,
    persister: Option<Rc<dyn Persister>>,
}

/// The owning arena for a set of object tables.
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl core::fmt::Debug for Store {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Opens a store over the closed set of schemas declared for this run.
    pub fn open(schemas: Vec<ObjectSchema>) -> Result<Store> {
        let mut tables = BTreeMap::new();
        let mut by_name = BTreeMap::new();
        for (index, schema) in schemas.into_iter().enumerate() {
            let id = index as TableId;
            if by_name.contains_key(schema.name()) {
                return Err(Error::invalid_schema(alloc::format!(
                    "duplicate table name: {}",
                    schema.name()
                )));
            }
            by_name.insert(schema.name().to_string(), id);
            tables.insert(id, Rc::new(RefCell::new(TableInner::new(id, schema))));
        }
        Ok(Store {
            inner: Rc::new(RefCell::new(StoreInner {
                generation: 0,
                tables,
                by_name,
                registry: TrackerRegistry::new_shared(),
                persister: None,
            })),
        })
    }

    /// Returns a handle to the named table.
    pub fn table(&self, name: &str) -> Result<ObjectTable> {
        let inner = self.inner.borrow();
        let id = *inner
            .by_name
            .get(name)
            .ok_or_else(|| Error::table_not_found(name))?;
        Ok(ObjectTable::new(
            StoreHandle::new(Rc::downgrade(&self.inner), inner.generation),
            id,
            name.to_string(),
        ))
    }

    /// Returns a current-generation handle to this store.
    pub fn handle(&self) -> StoreHandle {
        StoreHandle::new(Rc::downgrade(&self.inner), self.inner.borrow().generation)
    }

    /// Returns the shared tracker registry.
    pub fn registry(&self) -> SharedRegistry {
        self.inner.borrow().registry.clone()
    }

    /// Installs the durability collaborator.
    pub fn set_persister(&self, persister: Rc<dyn Persister>) {
        self.inner.borrow_mut().persister = Some(persister);
    }

    /// Forcibly unlinks every live tracker.
    pub fn reset_trackers(&self) {
        let registry = self.registry();
        registry.borrow_mut().reset_trackers();
    }

    /// Full database reload: resets all trackers, empties every table, and
    /// invalidates all outstanding handles. New handles must be re-fetched
    /// with `table()` before re-populating.
    pub fn reload(&self) {
        log::debug!("reloading store");
        self.reset_trackers();
        let mut inner = self.inner.borrow_mut();
        inner.generation += 1;
        for table in inner.tables.values() {
            table.borrow_mut().clear();
        }
    }
}

/// Weak, generation-checked reference into a store arena.
#[derive(Clone)]
pub struct StoreHandle {
    store: Weak<RefCell<StoreInner>>,
    generation: u64,
}

impl StoreHandle {
    pub(crate) fn new(store: Weak<RefCell<StoreInner>>, generation: u64) -> Self {
        Self { store, generation }
    }

    fn upgrade(&self) -> Result<Rc<RefCell<StoreInner>>> {
        let store = self
            .store
            .upgrade()
            .ok_or_else(|| Error::invalid_state("store has been dropped"))?;
        if store.borrow().generation != self.generation {
            return Err(Error::invalid_state(
                "store has been reloaded; handle is stale",
            ));
        }
        Ok(store)
    }

    /// Returns true if the store is alive and the handle is current.
    pub fn is_alive(&self) -> bool {
        self.upgrade().is_ok()
    }

    pub(crate) fn table_rc(&self, table: TableId) -> Result<Rc<RefCell<TableInner>>> {
        let store = self.upgrade()?;
        let inner = store.borrow();
        inner
            .tables
            .get(&table)
            .cloned()
            .ok_or_else(|| Error::invalid_state("table has been torn down"))
    }

    /// Runs a read-only closure against a table.
    ///
    /// The table borrow is released before this returns; never dispatch
    /// signals from inside the closure.
    pub fn with_table<R>(&self, table: TableId, f: impl FnOnce(&TableInner) -> R) -> Result<R> {
        let table_rc = self.table_rc(table)?;
        let inner = table_rc.borrow();
        Ok(f(&inner))
    }

    /// Resolves a table name to its id.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        let store = self.upgrade()?;
        let inner = store.borrow();
        inner
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::table_not_found(name))
    }

    /// Returns a handle to the identified table.
    pub fn object_table(&self, table: TableId) -> Result<ObjectTable> {
        let name = self.with_table(table, |t| t.schema().name().to_string())?;
        Ok(ObjectTable::new(self.clone(), table, name))
    }

    /// Returns a clone of a table's schema.
    pub fn schema(&self, table: TableId) -> Result<ObjectSchema> {
        self.with_table(table, |t| t.schema().clone())
    }

    /// Returns the shared tracker registry.
    pub fn registry(&self) -> Result<SharedRegistry> {
        Ok(self.upgrade()?.borrow().registry.clone())
    }

    pub(crate) fn persister(&self) -> Result<Option<Rc<dyn Persister>>> {
        Ok(self.upgrade()?.borrow().persister.clone())
    }
}
