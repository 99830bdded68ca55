//! Predicate AST definitions.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use ripple_core::{Error, Result, Value};

/// Reference to an object attribute, optionally qualified by table name.
///
/// An unqualified reference resolves against the view's base table; a
/// qualified reference may also name a joined table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttrRef {
    /// Table name, or None for the base table.
    pub table: Option<String>,
    /// Attribute name. The pseudo-attribute `id` names object identity.
    pub attr: String,
}

impl AttrRef {
    /// Creates an unqualified attribute reference.
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            table: None,
            attr: attr.into(),
        }
    }

    /// Creates a table-qualified attribute reference.
    pub fn qualified(table: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            attr: attr.into(),
        }
    }

    /// Returns the normalized name (`table.attr` or `attr`).
    pub fn normalized_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.attr),
            None => self.attr.clone(),
        }
    }
}

impl From<&str> for AttrRef {
    /// Parses `"attr"` or `"table.attr"`.
    fn from(s: &str) -> Self {
        match s.split_once('.') {
            Some((table, attr)) => AttrRef::qualified(table, attr),
            None => AttrRef::new(s),
        }
    }
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// Attribute reference.
    Attr(AttrRef),
    /// Literal value.
    Literal(Value),
    /// Positional parameter, resolved by `Predicate::bind`.
    Param(usize),
}

impl Operand {
    /// Creates an attribute operand.
    pub fn attr(r: impl Into<AttrRef>) -> Self {
        Operand::Attr(r.into())
    }

    /// Creates a literal operand.
    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }

    /// Creates a positional parameter operand.
    pub fn param(index: usize) -> Self {
        Operand::Param(index)
    }
}

/// A boolean expression over one object's attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Always true; selects the whole table.
    True,
    /// Binary comparison.
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    /// SQL LIKE pattern match against a string attribute.
    Like { attr: AttrRef, pattern: String },
    /// Attribute is null or absent.
    IsNull(AttrRef),
    /// Attribute is present and non-null.
    IsNotNull(AttrRef),
    /// All children hold.
    And(Vec<Predicate>),
    /// Any child holds.
    Or(Vec<Predicate>),
    /// Child does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates the always-true predicate.
    pub fn all() -> Self {
        Predicate::True
    }

    /// Creates a comparison predicate.
    pub fn compare(left: Operand, op: CompareOp, right: Operand) -> Self {
        Predicate::Compare { left, op, right }
    }

    /// Creates an equality predicate on an attribute.
    pub fn eq(attr: impl Into<AttrRef>, right: Operand) -> Self {
        Self::compare(Operand::Attr(attr.into()), CompareOp::Eq, right)
    }

    /// Creates a not-equal predicate on an attribute.
    pub fn ne(attr: impl Into<AttrRef>, right: Operand) -> Self {
        Self::compare(Operand::Attr(attr.into()), CompareOp::Ne, right)
    }

    /// Creates a less-than predicate on an attribute.
    pub fn lt(attr: impl Into<AttrRef>, right: Operand) -> Self {
        Self::compare(Operand::Attr(attr.into()), CompareOp::Lt, right)
    }

    /// Creates a less-than-or-equal predicate on an attribute.
    pub fn le(attr: impl Into<AttrRef>, right: Operand) -> Self {
        Self::compare(Operand::Attr(attr.into()), CompareOp::Le, right)
    }

    /// Creates a greater-than predicate on an attribute.
    pub fn gt(attr: impl Into<AttrRef>, right: Operand) -> Self {
        Self::compare(Operand::Attr(attr.into()), CompareOp::Gt, right)
    }

    /// Creates a greater-than-or-equal predicate on an attribute.
    pub fn ge(attr: impl Into<AttrRef>, right: Operand) -> Self {
        Self::compare(Operand::Attr(attr.into()), CompareOp::Ge, right)
    }

    /// Creates a LIKE predicate.
    pub fn like(attr: impl Into<AttrRef>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            attr: attr.into(),
            pattern: pattern.into(),
        }
    }

    /// Creates an is-null predicate.
    pub fn is_null(attr: impl Into<AttrRef>) -> Self {
        Predicate::IsNull(attr.into())
    }

    /// Creates an is-not-null predicate.
    pub fn is_not_null(attr: impl Into<AttrRef>) -> Self {
        Predicate::IsNotNull(attr.into())
    }

    /// Creates a conjunction.
    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    /// Creates a disjunction.
    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    /// Creates a negation.
    pub fn not(child: Predicate) -> Self {
        Predicate::Not(Box::new(child))
    }

    /// Resolves positional parameters against `params`, producing a fully
    /// bound predicate.
    ///
    /// Fails with `Error::InvalidPredicate` if a parameter index is out of
    /// range or a supplied parameter is never referenced.
    pub fn bind(&self, params: &[Value]) -> Result<Predicate> {
        let mut used = alloc::vec![false; params.len()];
        let bound = self.bind_inner(params, &mut used)?;
        if let Some(index) = used.iter().position(|u| !u) {
            return Err(Error::invalid_predicate(format!(
                "parameter {} supplied but never referenced",
                index
            )));
        }
        Ok(bound)
    }

    fn bind_inner(&self, params: &[Value], used: &mut [bool]) -> Result<Predicate> {
        let bind_operand = |operand: &Operand, used: &mut [bool]| -> Result<Operand> {
            match operand {
                Operand::Param(index) => {
                    let value = params.get(*index).ok_or_else(|| {
                        Error::invalid_predicate(format!(
                            "parameter {} referenced but only {} supplied",
                            index,
                            params.len()
                        ))
                    })?;
                    used[*index] = true;
                    Ok(Operand::Literal(value.clone()))
                }
                other => Ok(other.clone()),
            }
        };

        match self {
            Predicate::True => Ok(Predicate::True),
            Predicate::Compare { left, op, right } => Ok(Predicate::Compare {
                left: bind_operand(left, used)?,
                op: *op,
                right: bind_operand(right, used)?,
            }),
            Predicate::Like { attr, pattern } => Ok(Predicate::Like {
                attr: attr.clone(),
                pattern: pattern.clone(),
            }),
            Predicate::IsNull(attr) => Ok(Predicate::IsNull(attr.clone())),
            Predicate::IsNotNull(attr) => Ok(Predicate::IsNotNull(attr.clone())),
            Predicate::And(children) => Ok(Predicate::And(
                children
                    .iter()
                    .map(|c| c.bind_inner(params, used))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Predicate::Or(children) => Ok(Predicate::Or(
                children
                    .iter()
                    .map(|c| c.bind_inner(params, used))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Predicate::Not(child) => Ok(Predicate::not(child.bind_inner(params, used)?)),
        }
    }

    /// Returns every attribute reference in the predicate.
    pub fn attr_refs(&self) -> Vec<&AttrRef> {
        let mut refs = Vec::new();
        self.collect_attr_refs(&mut refs);
        refs
    }

    fn collect_attr_refs<'a>(&'a self, refs: &mut Vec<&'a AttrRef>) {
        match self {
            Predicate::True => {}
            Predicate::Compare { left, right, .. } => {
                for operand in [left, right] {
                    if let Operand::Attr(r) = operand {
                        refs.push(r);
                    }
                }
            }
            Predicate::Like { attr, .. }
            | Predicate::IsNull(attr)
            | Predicate::IsNotNull(attr) => refs.push(attr),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_attr_refs(refs);
                }
            }
            Predicate::Not(child) => child.collect_attr_refs(refs),
        }
    }
}
