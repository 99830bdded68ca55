//! View trackers: incremental membership over live views.
//!
//! A tracker subscribes (through the store's registry) to the base table
//! and every join target of its view, maintains the set of member ids, and
//! translates raw table signals into `added`/`removed`/`changed` events.
//!
//! State is fine-grained interior mutability: no borrow is held while
//! subscriber callbacks run, so callbacks may freely mutate tables,
//! connect/disconnect subscriptions, or unlink the tracker.

use alloc::collections::BTreeSet;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use ripple_core::{DomainObject, Error, ObjectId, Result};
use ripple_store::{ObserverId, SignalKind, TableEvent, TableObserver, TrackerRegistry};

use crate::view::{Matcher, View};

/// Unique identifier for one connected callback.
pub type SubscriptionId = u64;

/// The scoped events a tracker emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// An object entered the view.
    Added,
    /// An object left the view (or was removed outright).
    Removed,
    /// A member changed while staying in the view.
    Changed,
}

type EventCallback = Rc<dyn Fn(&ViewTracker, &DomainObject) -> Result<()>>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    callback: EventCallback,
}

pub(crate) struct TrackerInner {
    matcher: Matcher,
    members: RefCell<BTreeSet<ObjectId>>,
    subscriptions: RefCell<Vec<Subscription>>,
    next_subscription: Cell<SubscriptionId>,
    active: Cell<bool>,
    observer_id: Cell<ObserverId>,
    registry: Weak<RefCell<TrackerRegistry>>,
    self_weak: Weak<TrackerInner>,
}

/// Stateful subscriber translating raw table signals into scoped
/// added/removed/changed events for one view.
#[derive(Clone)]
pub struct ViewTracker {
    inner: Rc<TrackerInner>,
}

impl core::fmt::Debug for ViewTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewTracker")
            .field("observer_id", &self.inner.observer_id.get())
            .field("active", &self.inner.active.get())
            .finish()
    }
}

impl ViewTracker {
    /// Builds a tracker over the view's matcher, seeds its member set from
    /// the current matching set (silently), and registers it.
    pub(crate) fn attach(view: &View) -> Result<ViewTracker> {
        let matcher = view.matcher.clone();
        let registry = matcher.store.registry()?;
        let members: BTreeSet<ObjectId> = matcher.matching_ids()?.into_iter().collect();

        let mut tables = alloc::vec![matcher.base];
        tables.extend(matcher.joins.iter().map(|join| join.table));

        let inner = Rc::new_cyclic(|weak| TrackerInner {
            matcher,
            members: RefCell::new(members),
            subscriptions: RefCell::new(Vec::new()),
            next_subscription: Cell::new(1),
            active: Cell::new(true),
            observer_id: Cell::new(0),
            registry: Rc::downgrade(&registry),
            self_weak: weak.clone(),
        });

        let observer_rc: Rc<dyn TableObserver> = inner.clone();
        let observer: Weak<dyn TableObserver> = Rc::downgrade(&observer_rc);
        let observer_id = registry.borrow_mut().register(observer, &tables);
        inner.observer_id.set(observer_id);

        Ok(ViewTracker { inner })
    }

    /// Connects a callback for one event kind. Callbacks receive
    /// `(tracker, object)` and run synchronously, in connection order,
    /// before the mutating call returns.
    ///
    /// Fails with `Error::InvalidState` on an unlinked tracker.
    pub fn connect<F>(&self, kind: EventKind, callback: F) -> Result<SubscriptionId>
    where
        F: Fn(&ViewTracker, &DomainObject) -> Result<()> + 'static,
    {
        if !self.inner.active.get() {
            return Err(Error::invalid_state("tracker is unlinked"));
        }
        let id = self.inner.next_subscription.get();
        self.inner.next_subscription.set(id + 1);
        self.inner.subscriptions.borrow_mut().push(Subscription {
            id,
            kind,
            callback: Rc::new(callback),
        });
        Ok(id)
    }

    /// Disconnects a callback. Returns true if it was connected.
    ///
    /// Fails with `Error::InvalidState` on an unlinked tracker.
    pub fn disconnect(&self, id: SubscriptionId) -> Result<bool> {
        if !self.inner.active.get() {
            return Err(Error::invalid_state("tracker is unlinked"));
        }
        let mut subscriptions = self.inner.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        Ok(subscriptions.len() != before)
    }

    /// Unlinks the tracker: no further events are delivered and it leaves
    /// the registry. Idempotent.
    pub fn unlink(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        if let Some(registry) = self.inner.registry.upgrade() {
            registry
                .borrow_mut()
                .unregister(self.inner.observer_id.get());
        }
        log::trace!("tracker {} unlinked", self.inner.observer_id.get());
    }

    /// Returns true while the tracker delivers events.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Returns the ids the tracker currently believes are in the view, in
    /// ascending order.
    pub fn current_members(&self) -> Vec<ObjectId> {
        self.inner.members.borrow().iter().copied().collect()
    }
}

impl TrackerInner {
    fn handle_added(&self, obj: &DomainObject) -> Result<()> {
        if self.matcher.matches(obj)? {
            self.members.borrow_mut().insert(obj.id());
            self.emit(EventKind::Added, obj)?;
        }
        Ok(())
    }

    fn handle_changed(&self, obj: &DomainObject) -> Result<()> {
        let was_member = self.members.borrow().contains(&obj.id());
        let is_member = self.matcher.matches(obj)?;
        match (was_member, is_member) {
            (true, true) => self.emit(EventKind::Changed, obj),
            (true, false) => {
                self.members.borrow_mut().remove(&obj.id());
                self.emit(EventKind::Removed, obj)
            }
            (false, true) => {
                self.members.borrow_mut().insert(obj.id());
                self.emit(EventKind::Added, obj)
            }
            (false, false) => Ok(()),
        }
    }

    fn handle_removed(&self, obj: &DomainObject) -> Result<()> {
        // Membership comes from the tracker's own set (the pre-removal
        // view), never from re-evaluating the predicate.
        if self.members.borrow_mut().remove(&obj.id()) {
            self.emit(EventKind::Removed, obj)?;
        }
        Ok(())
    }

    /// A joined-to object announced a relevant change: re-diff the whole
    /// matching set. Join-driven churn emits added/removed; every surviving
    /// member gets exactly one changed.
    fn handle_related_change(&self) -> Result<()> {
        let current_objects = self.matcher.matching_objects()?;
        let current: BTreeSet<ObjectId> = current_objects.iter().map(|o| o.id()).collect();
        let previous = self.members.replace(current.clone());

        let mut events: Vec<(EventKind, DomainObject)> = Vec::new();
        for id in previous.difference(&current) {
            if let Some(obj) = self.matcher.base_object(*id)? {
                events.push((EventKind::Removed, obj));
            }
        }
        for obj in current_objects {
            let kind = if previous.contains(&obj.id()) {
                EventKind::Changed
            } else {
                EventKind::Added
            };
            events.push((kind, obj));
        }

        for (kind, obj) in events {
            self.emit(kind, &obj)?;
        }
        Ok(())
    }

    /// Invokes the callbacks connected for `kind`. The subscription list is
    /// snapshotted first so callbacks may connect/disconnect freely.
    fn emit(&self, kind: EventKind, obj: &DomainObject) -> Result<()> {
        let callbacks: Vec<EventCallback> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.callback.clone())
            .collect();
        if callbacks.is_empty() {
            return Ok(());
        }
        let inner = self
            .self_weak
            .upgrade()
            .ok_or_else(|| Error::invalid_state("tracker dropped during delivery"))?;
        let handle = ViewTracker { inner };
        for callback in callbacks {
            callback(&handle, obj)?;
        }
        Ok(())
    }
}

impl TableObserver for TrackerInner {
    fn on_table_event(&self, event: &TableEvent) -> Result<()> {
        if !self.active.get() {
            return Ok(());
        }
        let base_signal = event.table == self.matcher.base;
        match event.kind {
            SignalKind::Added if base_signal => self.handle_added(&event.object),
            SignalKind::Changed if base_signal => self.handle_changed(&event.object),
            SignalKind::Removed if base_signal => self.handle_removed(&event.object),
            SignalKind::RelatedChange
                if self.matcher.joins.iter().any(|j| j.table == event.table) =>
            {
                self.handle_related_change()
            }
            _ => Ok(()),
        }
    }

    fn detach(&self) {
        self.active.set(false);
    }
}
