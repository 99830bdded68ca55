//! Durability collaborator seam.

use alloc::collections::BTreeSet;
use alloc::string::String;
use ripple_core::{ObjectId, Result};

/// Receives object state at each commit point and is responsible for
/// durable storage.
///
/// The store is agnostic to whether an implementation writes immediately or
/// batches. After a successful `persist` the object's `changed_attributes`
/// set is cleared; with no persister installed the set accumulates.
pub trait Persister {
    /// Called after a create or attribute mutation has been delivered to
    /// observers. `changed_attributes` is the accumulated dirty set.
    fn persist(&self, table: &str, id: ObjectId, changed_attributes: &BTreeSet<String>)
        -> Result<()>;

    /// Called after an object has been removed and the removal delivered.
    fn forget(&self, table: &str, id: ObjectId) -> Result<()>;
}
