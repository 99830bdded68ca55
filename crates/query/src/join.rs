//! Join specification for live views.

use alloc::string::String;

/// An equi-join declaration against another object table.
///
/// A base object joins a row of `table` when the joined row's
/// `joined_attr` equals the base object's `base_attr`. Only equi-joins are
/// supported; a join matching no row excludes the base object (inner-join
/// semantics).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinSpec {
    /// Joined table name (also the qualifier predicates reference it by).
    table: String,
    /// Attribute on the joined table. `id` names object identity.
    joined_attr: String,
    /// Attribute on the base table. `id` names object identity.
    base_attr: String,
}

impl JoinSpec {
    /// Creates a join spec: `table.joined_attr = base.base_attr`.
    pub fn new(
        table: impl Into<String>,
        joined_attr: impl Into<String>,
        base_attr: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            joined_attr: joined_attr.into(),
            base_attr: base_attr.into(),
        }
    }

    /// Returns the joined table name.
    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the attribute on the joined table.
    #[inline]
    pub fn joined_attr(&self) -> &str {
        &self.joined_attr
    }

    /// Returns the attribute on the base table.
    #[inline]
    pub fn base_attr(&self) -> &str {
        &self.base_attr
    }
}
