//! Schema module for the Ripple object store.
//!
//! This module contains the schema-related declarations: attribute
//! definitions and per-type object schemas with change tracking.

mod attribute;
mod definition;

pub use attribute::AttributeDef;
pub use definition::{ObjectSchema, SchemaBuilder};
