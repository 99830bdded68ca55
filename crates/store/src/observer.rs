//! Observer seam between tables and trackers.

use crate::event::TableEvent;
use ripple_core::Result;

/// Unique identifier for a registered observer.
pub type ObserverId = u64;

/// A synchronous observer of raw table signals.
///
/// Implementations use interior mutability: event handling takes `&self`
/// and may re-enter table mutation (no borrow may be held across the
/// callbacks an implementation invokes).
pub trait TableObserver {
    /// Handles one raw table signal. Errors propagate to the mutating
    /// caller.
    fn on_table_event(&self, event: &TableEvent) -> Result<()>;

    /// Flips the observer into its terminal, silent state. Called by the
    /// registry during `reset_trackers`; must not call back into the
    /// registry.
    fn detach(&self);
}
