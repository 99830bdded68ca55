//! Tracker registry and signal fan-out.
//!
//! The registry tracks every live observer (view trackers, in practice) and
//! routes raw table signals to the observers of the signalling table. It is
//! owned by the `Store` and injected into table handles and views — there is
//! no process-global registry state.

use crate::event::TableEvent;
use crate::observer::{ObserverId, TableObserver};
use crate::table::TableId;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;

/// Shared handle to the registry. Single-threaded interior mutability; the
/// registry is never borrowed across observer callbacks.
pub type SharedRegistry = Rc<RefCell<TrackerRegistry>>;

struct ObserverEntry {
    observer: Weak<dyn TableObserver>,
    tables: Vec<TableId>,
}

/// Process-wide set of live observers, routed by table.
pub struct TrackerRegistry {
    /// Table id -> observers registered for it, in registration order.
    by_table: HashMap<TableId, Vec<ObserverId>>,
    /// Observer id -> entry.
    observers: HashMap<ObserverId, ObserverEntry>,
    /// Next observer id to assign.
    next_id: ObserverId,
}

impl Default for TrackerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            by_table: HashMap::new(),
            observers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a shared registry handle.
    pub fn new_shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Registers an observer for the given tables and returns its id.
    ///
    /// The observer is held weakly; a dropped observer is skipped during
    /// dispatch and pruned by `cleanup`.
    pub fn register(&mut self, observer: Weak<dyn TableObserver>, tables: &[TableId]) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;

        for table in tables {
            self.by_table.entry(*table).or_default().push(id);
        }
        self.observers.insert(
            id,
            ObserverEntry {
                observer,
                tables: tables.to_vec(),
            },
        );
        log::trace!("registered observer {} for {} table(s)", id, tables.len());
        id
    }

    /// Unregisters an observer by id.
    ///
    /// Returns true if the observer was found and removed.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        match self.observers.remove(&id) {
            Some(entry) => {
                for table in entry.tables {
                    if let Some(ids) = self.by_table.get_mut(&table) {
                        ids.retain(|other| *other != id);
                    }
                }
                self.by_table.retain(|_, ids| !ids.is_empty());
                true
            }
            None => false,
        }
    }

    /// Dispatches a raw signal to every observer of the signalling table, in
    /// registration order.
    ///
    /// Takes the shared handle rather than `&self` so no registry borrow is
    /// held while observers run — observers may re-enter the registry
    /// (unlinking themselves, registering new trackers) or mutate tables.
    /// The first observer error aborts remaining delivery and propagates.
    pub fn dispatch(registry: &SharedRegistry, event: &TableEvent) -> ripple_core::Result<()> {
        let targets: Vec<Weak<dyn TableObserver>> = {
            let reg = registry.borrow();
            match reg.by_table.get(&event.table) {
                Some(ids) => ids
                    .iter()
                    .filter_map(|id| reg.observers.get(id))
                    .map(|entry| entry.observer.clone())
                    .collect(),
                None => return Ok(()),
            }
        };
        log::trace!(
            "dispatching {:?} for object {} to {} observer(s)",
            event.kind,
            event.id(),
            targets.len()
        );
        for target in targets {
            if let Some(observer) = target.upgrade() {
                observer.on_table_event(event)?;
            }
        }
        Ok(())
    }

    /// Detaches every live observer and empties the registry.
    ///
    /// Called by a full database reload before tables are re-populated, so
    /// no stale tracker observes post-reload objects.
    pub fn reset_trackers(&mut self) {
        log::debug!("resetting {} observer(s)", self.observers.len());
        for entry in self.observers.values() {
            if let Some(observer) = entry.observer.upgrade() {
                observer.detach();
            }
        }
        self.by_table.clear();
        self.observers.clear();
    }

    /// Returns the number of registered observers (live or not).
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Returns the number of live observers registered for a table.
    pub fn observers_for_table(&self, table: TableId) -> usize {
        self.by_table
            .get(&table)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.observers.get(id))
                    .filter(|entry| entry.observer.strong_count() > 0)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns true if no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Prunes observers whose weak references are dead.
    pub fn cleanup(&mut self) {
        let dead: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|(_, entry)| entry.observer.strong_count() == 0)
            .map(|(id, _)| *id)
            .collect();
        for id in dead {
            self.unregister(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TableEvent;
    use alloc::collections::BTreeMap;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::Cell;
    use ripple_core::{DomainObject, Error};

    struct CountingObserver {
        seen: Cell<usize>,
        active: Cell<bool>,
        fail: bool,
    }

    impl CountingObserver {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                seen: Cell::new(0),
                active: Cell::new(true),
                fail: false,
            })
        }

        fn failing() -> Rc<Self> {
            Rc::new(Self {
                seen: Cell::new(0),
                active: Cell::new(true),
                fail: true,
            })
        }
    }

    impl TableObserver for CountingObserver {
        fn on_table_event(&self, _event: &TableEvent) -> ripple_core::Result<()> {
            self.seen.set(self.seen.get() + 1);
            if self.fail {
                return Err(Error::invalid_state("observer failure"));
            }
            Ok(())
        }

        fn detach(&self) {
            self.active.set(false);
        }
    }

    fn event(table: TableId) -> TableEvent {
        TableEvent::added(table, DomainObject::new(1, BTreeMap::new()))
    }

    #[test]
    fn test_register_and_dispatch() {
        let registry = TrackerRegistry::new_shared();
        let observer = CountingObserver::new();
        let observer_dyn: Rc<dyn TableObserver> = observer.clone();
        let weak: Weak<dyn TableObserver> = Rc::downgrade(&observer_dyn);
        registry.borrow_mut().register(weak, &[0]);

        TrackerRegistry::dispatch(&registry, &event(0)).unwrap();
        assert_eq!(observer.seen.get(), 1);

        // Signals for other tables don't reach the observer.
        TrackerRegistry::dispatch(&registry, &event(1)).unwrap();
        assert_eq!(observer.seen.get(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = TrackerRegistry::new_shared();
        let observer = CountingObserver::new();
        let observer_dyn: Rc<dyn TableObserver> = observer.clone();
        let weak: Weak<dyn TableObserver> = Rc::downgrade(&observer_dyn);
        let id = registry.borrow_mut().register(weak, &[0]);

        assert!(registry.borrow_mut().unregister(id));
        assert!(!registry.borrow_mut().unregister(id));

        TrackerRegistry::dispatch(&registry, &event(0)).unwrap();
        assert_eq!(observer.seen.get(), 0);
    }

    #[test]
    fn test_dropped_observer_skipped() {
        let registry = TrackerRegistry::new_shared();
        {
            let observer = CountingObserver::new();
            let observer_dyn: Rc<dyn TableObserver> = observer.clone();
        let weak: Weak<dyn TableObserver> = Rc::downgrade(&observer_dyn);
            registry.borrow_mut().register(weak, &[0]);
        }
        // Dropped observer must not panic dispatch.
        TrackerRegistry::dispatch(&registry, &event(0)).unwrap();
        assert_eq!(registry.borrow().observers_for_table(0), 0);

        registry.borrow_mut().cleanup();
        assert!(registry.borrow().is_empty());
    }

    #[test]
    fn test_observer_error_propagates() {
        let registry = TrackerRegistry::new_shared();
        let failing = CountingObserver::failing();
        let after = CountingObserver::new();
        let failing_dyn: Rc<dyn TableObserver> = failing.clone();
        let after_dyn: Rc<dyn TableObserver> = after.clone();
        let weak_failing: Weak<dyn TableObserver> = Rc::downgrade(&failing_dyn);
        let weak_after: Weak<dyn TableObserver> = Rc::downgrade(&after_dyn);
        registry.borrow_mut().register(weak_failing, &[0]);
        registry.borrow_mut().register(weak_after, &[0]);

        assert!(TrackerRegistry::dispatch(&registry, &event(0)).is_err());
        // Delivery aborts at the failing observer.
        assert_eq!(after.seen.get(), 0);
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = TrackerRegistry::new_shared();
        let order = Rc::new(RefCell::new(Vec::new()));

        struct OrderObserver {
            tag: usize,
            order: Rc<RefCell<Vec<usize>>>,
        }
        impl TableObserver for OrderObserver {
            fn on_table_event(&self, _event: &TableEvent) -> ripple_core::Result<()> {
                self.order.borrow_mut().push(self.tag);
                Ok(())
            }
            fn detach(&self) {}
        }

        let first = Rc::new(OrderObserver {
            tag: 1,
            order: order.clone(),
        });
        let second = Rc::new(OrderObserver {
            tag: 2,
            order: order.clone(),
        });
        let first_dyn: Rc<dyn TableObserver> = first.clone();
        let second_dyn: Rc<dyn TableObserver> = second.clone();
        let weak_first: Weak<dyn TableObserver> = Rc::downgrade(&first_dyn);
        let weak_second: Weak<dyn TableObserver> = Rc::downgrade(&second_dyn);
        registry.borrow_mut().register(weak_first, &[0]);
        registry.borrow_mut().register(weak_second, &[0]);

        TrackerRegistry::dispatch(&registry, &event(0)).unwrap();
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_reset_trackers() {
        let registry = TrackerRegistry::new_shared();
        let observer = CountingObserver::new();
        let observer_dyn: Rc<dyn TableObserver> = observer.clone();
        let weak: Weak<dyn TableObserver> = Rc::downgrade(&observer_dyn);
        registry.borrow_mut().register(weak, &[0]);

        registry.borrow_mut().reset_trackers();
        assert!(registry.borrow().is_empty());
        assert!(!observer.active.get());

        TrackerRegistry::dispatch(&registry, &event(0)).unwrap();
        assert_eq!(observer.seen.get(), 0);
    }

    #[test]
    fn test_multi_table_registration() {
        let registry = TrackerRegistry::new_shared();
        let observer = CountingObserver::new();
        let observer_dyn: Rc<dyn TableObserver> = observer.clone();
        let weak: Weak<dyn TableObserver> = Rc::downgrade(&observer_dyn);
        let id = registry.borrow_mut().register(weak, &[0, 1]);

        TrackerRegistry::dispatch(&registry, &event(0)).unwrap();
        TrackerRegistry::dispatch(&registry, &event(1)).unwrap();
        assert_eq!(observer.seen.get(), 2);

        registry.borrow_mut().unregister(id);
        assert_eq!(registry.borrow().observers_for_table(0), 0);
        assert_eq!(registry.borrow().observers_for_table(1), 0);
    }
}
