//! Raw change signals raised by object tables.

use crate::table::TableId;
use ripple_core::{DomainObject, ObjectId};

/// The kind of raw signal a table mutation raises.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    /// An object was created (and survived its post-creation hook).
    Added,
    /// An object attribute was set.
    Changed,
    /// An object was removed.
    Removed,
    /// The object announced a change relevant to views joined against its
    /// table. Raised only by an explicit `signal_related_change` call.
    RelatedChange,
}

/// A raw change signal, carrying a snapshot of the object at signal time.
#[derive(Clone, Debug)]
pub struct TableEvent {
    /// The table the signal originates from.
    pub table: TableId,
    /// What happened.
    pub kind: SignalKind,
    /// Snapshot of the object at signal time. For `Removed` this is the
    /// pre-removal state.
    pub object: DomainObject,
}

impl TableEvent {
    /// Creates an `Added` signal.
    pub fn added(table: TableId, object: DomainObject) -> Self {
        Self {
            table,
            kind: SignalKind::Added,
            object,
        }
    }

    /// Creates a `Changed` signal.
    pub fn changed(table: TableId, object: DomainObject) -> Self {
        Self {
            table,
            kind: SignalKind::Changed,
            object,
        }
    }

    /// Creates a `Removed` signal.
    pub fn removed(table: TableId, object: DomainObject) -> Self {
        Self {
            table,
            kind: SignalKind::Removed,
            object,
        }
    }

    /// Creates a `RelatedChange` signal.
    pub fn related_change(table: TableId, object: DomainObject) -> Self {
        Self {
            table,
            kind: SignalKind::RelatedChange,
            object,
        }
    }

    /// Returns the id of the object the signal is about.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.object.id()
    }
}
