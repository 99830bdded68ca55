//! Eager validation of predicates and join specs against schemas.
//!
//! Malformed expressions fail at view construction, close to the mistake,
//! rather than lazily at iteration time.

use crate::ast::{AttrRef, Operand, Predicate};
use crate::join::JoinSpec;
use alloc::format;
use ripple_core::schema::ObjectSchema;
use ripple_core::{DataType, Error, Result, Value};

/// Returns the declared type of an attribute, treating the pseudo-attribute
/// `id` as Int64 object identity.
pub fn attr_data_type(schema: &ObjectSchema, attr: &str) -> Option<DataType> {
    if attr == "id" {
        return Some(DataType::Int64);
    }
    schema.get_attribute(attr).map(|a| a.data_type())
}

/// Validates a bound predicate against the base schema and the schemas of
/// joined tables (alias → schema).
///
/// Checks that every attribute reference resolves to a declared attribute
/// of the table it names, that comparison operands are type-compatible, and
/// that no unbound parameters remain.
pub fn validate_predicate(
    predicate: &Predicate,
    base: &ObjectSchema,
    joins: &[(&str, &ObjectSchema)],
) -> Result<()> {
    match predicate {
        Predicate::True => Ok(()),
        Predicate::Compare { left, op: _, right } => {
            let left_type = operand_type(left, base, joins)?;
            let right_type = operand_type(right, base, joins)?;
            if let (Some(l), Some(r)) = (left_type, right_type) {
                if !l.is_comparable_with(r) {
                    return Err(Error::type_mismatch(l, Some(r)));
                }
            }
            Ok(())
        }
        Predicate::Like { attr, pattern: _ } => {
            let dt = resolve_attr(attr, base, joins)?;
            if dt != DataType::String {
                return Err(Error::type_mismatch(DataType::String, Some(dt)));
            }
            Ok(())
        }
        Predicate::IsNull(attr) | Predicate::IsNotNull(attr) => {
            resolve_attr(attr, base, joins).map(|_| ())
        }
        Predicate::And(children) | Predicate::Or(children) => {
            for child in children {
                validate_predicate(child, base, joins)?;
            }
            Ok(())
        }
        Predicate::Not(child) => validate_predicate(child, base, joins),
    }
}

/// Validates a join spec against the base and joined schemas: both join
/// attributes must be declared and type-comparable.
pub fn validate_join(join: &JoinSpec, base: &ObjectSchema, joined: &ObjectSchema) -> Result<()> {
    let base_type = attr_data_type(base, join.base_attr()).ok_or_else(|| {
        Error::invalid_join(format!(
            "attribute {} not declared in base table {}",
            join.base_attr(),
            base.name()
        ))
    })?;
    let joined_type = attr_data_type(joined, join.joined_attr()).ok_or_else(|| {
        Error::invalid_join(format!(
            "attribute {} not declared in joined table {}",
            join.joined_attr(),
            joined.name()
        ))
    })?;
    if !base_type.is_comparable_with(joined_type) {
        return Err(Error::invalid_join(format!(
            "join attributes have incomparable types: {}.{} is {:?}, {}.{} is {:?}",
            base.name(),
            join.base_attr(),
            base_type,
            joined.name(),
            join.joined_attr(),
            joined_type
        )));
    }
    Ok(())
}

fn operand_type(
    operand: &Operand,
    base: &ObjectSchema,
    joins: &[(&str, &ObjectSchema)],
) -> Result<Option<DataType>> {
    match operand {
        Operand::Attr(r) => resolve_attr(r, base, joins).map(Some),
        Operand::Literal(Value::Null) => Err(Error::invalid_predicate(
            "comparison against a null literal is never true; use IsNull",
        )),
        Operand::Literal(value) => Ok(value.data_type()),
        Operand::Param(index) => Err(Error::invalid_predicate(format!(
            "unbound parameter {}",
            index
        ))),
    }
}

fn resolve_attr(
    r: &AttrRef,
    base: &ObjectSchema,
    joins: &[(&str, &ObjectSchema)],
) -> Result<DataType> {
    let schema = match r.table.as_deref() {
        None => base,
        Some(table) if table == base.name() => base,
        Some(table) => joins
            .iter()
            .find(|(alias, _)| *alias == table)
            .map(|(_, schema)| *schema)
            .ok_or_else(|| Error::table_not_found(table))?,
    };
    attr_data_type(schema, &r.attr)
        .ok_or_else(|| Error::attribute_not_found(schema.name(), r.attr.clone()))
}
