//! Ripple Reactive - Live views and view trackers.
//!
//! This crate implements the read side of the Ripple object store:
//!
//! - `View`: a live, predicate-bound (optionally joined) projection over an
//!   `ObjectTable`. A view owns no objects; `count()`/`iter()` re-query
//!   lazily on every call.
//! - `ViewTracker`: the incremental counterpart. A tracker subscribes to
//!   every table its view reaches and translates raw table signals into
//!   scoped `added`/`removed`/`changed` events against its member set.
//!
//! # Core Concepts
//!
//! - `make_view(predicate, params, joins)`: build a view on a table handle
//! - `make_tracker()`: attach a tracker to a view
//! - `connect(EventKind, callback)`: subscribe; callbacks receive
//!   `(tracker, object)` and run synchronously before the mutating call
//!   returns
//! - `unlink()`: detach a tracker (idempotent)
//!
//! # Example
//!
//! ```rust
//! use ripple_core::{DataType, Value};
//! use ripple_core::schema::SchemaBuilder;
//! use ripple_reactive::{EventKind, TableViews};
//! use ripple_query::{Operand, Predicate};
//! use ripple_store::Store;
//!
//! let store = Store::open(vec![SchemaBuilder::new("item")
//!     .unwrap()
//!     .add_attribute("feed_id", DataType::Int64)
//!     .unwrap()
//!     .build()])
//! .unwrap();
//! let items = store.table("item").unwrap();
//!
//! let view = items
//!     .make_view(
//!         Predicate::eq("feed_id", Operand::param(0)),
//!         &[Value::Int64(1)],
//!         &[],
//!     )
//!     .unwrap();
//! let tracker = view.make_tracker().unwrap();
//! tracker
//!     .connect(EventKind::Added, |_tracker, obj| {
//!         let _ = obj.id();
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! items
//!     .create([("feed_id".into(), Value::Int64(1))].into())
//!     .unwrap();
//! assert_eq!(view.count().unwrap(), 1);
//! ```

#![no_std]

extern crate alloc;

mod tracker;
mod view;

pub use tracker::{EventKind, SubscriptionId, ViewTracker};
pub use view::{TableViews, View};

// Re-export commonly used types from dependencies
pub use ripple_core::{DomainObject, Error, ObjectId, Result, Value};
pub use ripple_query::{JoinSpec, Operand, Predicate};
pub use ripple_store::{ObjectTable, Store};
