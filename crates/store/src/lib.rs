//! Ripple Store - Object tables, change signals, and the tracker registry.
//!
//! This crate implements the mutation side of the Ripple object store:
//!
//! - `Store`: the central arena owning one `ObjectTable` per declared schema
//!   plus the `TrackerRegistry`; handles into it are non-owning
//! - `ObjectTable`: per-type store of `DomainObject`s keyed by id, with the
//!   full object lifecycle (`create`/`create_with`, `set_attribute`,
//!   `remove`, `signal_related_change`)
//! - `TableEvent`/`SignalKind`: the raw change signals a mutation raises
//! - `TrackerRegistry`/`TableObserver`: synchronous fan-out of raw signals
//!   to live observers, with registry-wide reset for database reloads
//! - `Persister`: the durability collaborator receiving
//!   `(table, id, changed_attributes)` at each commit point
//!
//! All signal delivery is synchronous: observers run to completion before
//! the mutating call returns, and observer errors propagate to the caller.
//!
//! # Example
//!
//! ```rust
//! use ripple_core::{DataType, Value};
//! use ripple_core::schema::SchemaBuilder;
//! use ripple_store::Store;
//!
//! let store = Store::open(vec![SchemaBuilder::new("feed")
//!     .unwrap()
//!     .add_attribute("url", DataType::String)
//!     .unwrap()
//!     .build()])
//! .unwrap();
//!
//! let feeds = store.table("feed").unwrap();
//! let id = feeds
//!     .create([("url".into(), Value::from("http://feed.org"))].into())
//!     .unwrap();
//! assert!(feeds.id_exists(id));
//! ```

#![no_std]

extern crate alloc;

mod event;
mod observer;
mod persist;
mod registry;
mod store;
mod table;

pub use event::{SignalKind, TableEvent};
pub use observer::{ObserverId, TableObserver};
pub use persist::Persister;
pub use registry::{SharedRegistry, TrackerRegistry};
pub use store::{Store, StoreHandle};
pub use table::{ObjectTable, TableId, TableInner};
