//! Ripple Core - Core types and schema definitions for the Ripple object store.
//!
//! This crate provides the foundational types for the Ripple in-process
//! reactive object store:
//!
//! - `DataType`: Supported attribute types (Boolean, Int64, Float64, String, DateTime, Bytes)
//! - `Value`: Runtime values that can be stored in an object attribute
//! - `DomainObject`: An identity-bearing unit of domain data with attribute-change tracking
//! - `schema`: Schema declarations (AttributeDef, ObjectSchema, SchemaBuilder)
//! - `Error`: Error types for object-store operations
//!
//! # Example
//!
//! ```rust
//! use ripple_core::{DataType, DomainObject, Value};
//! use ripple_core::schema::SchemaBuilder;
//!
//! // Declare an object type
//! let schema = SchemaBuilder::new("item")
//!     .unwrap()
//!     .add_attribute("title", DataType::String)
//!     .unwrap()
//!     .add_attribute("feed_id", DataType::Int64)
//!     .unwrap()
//!     .track_attribute_changes("title")
//!     .unwrap()
//!     .build();
//!
//! assert_eq!(schema.name(), "item");
//! assert!(schema.is_tracked("title"));
//!
//! // Objects carry attributes by name
//! let mut obj = DomainObject::new(1, [("title".into(), Value::from("item1"))].into());
//! assert_eq!(obj.id(), 1);
//! assert_eq!(obj.get("title"), Some(&Value::from("item1")));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod object;
pub mod pattern_match;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use object::{
    next_object_id, set_next_object_id, set_next_object_id_if_greater, DomainObject, ObjectId,
};
pub use types::DataType;
pub use value::Value;
