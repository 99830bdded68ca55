//! Ripple Query - Predicate and join evaluation for the Ripple object store.
//!
//! This crate defines the predicate language live views are built from:
//!
//! - `Predicate`: a boolean expression tree over one object's attributes,
//!   optionally referencing joined tables through qualified `AttrRef`s
//! - `Operand` / `CompareOp`: comparison building blocks, with positional
//!   `Param` placeholders resolved by `Predicate::bind`
//! - `JoinSpec`: an equi-join declaration against another object table
//! - `EvalContext`: the resolution seam predicate evaluation runs against
//!
//! Predicates are validated eagerly against object schemas so that malformed
//! expressions surface at view construction, not at iteration time.
//!
//! # Example
//!
//! ```rust
//! use ripple_core::{DataType, Value};
//! use ripple_core::schema::SchemaBuilder;
//! use ripple_query::{validate_predicate, Operand, Predicate};
//!
//! let schema = SchemaBuilder::new("item")
//!     .unwrap()
//!     .add_attribute("feed_id", DataType::Int64)
//!     .unwrap()
//!     .build();
//!
//! // feed_id = ? bound to 1
//! let predicate = Predicate::eq("feed_id", Operand::param(0))
//!     .bind(&[Value::Int64(1)])
//!     .unwrap();
//!
//! assert!(validate_predicate(&predicate, &schema, &[]).is_ok());
//! ```

#![no_std]

extern crate alloc;

mod ast;
mod eval;
mod join;
mod validate;

pub use ast::{AttrRef, CompareOp, Operand, Predicate};
pub use eval::EvalContext;
pub use join::JoinSpec;
pub use validate::{attr_data_type, validate_join, validate_predicate};
