//! Predicate evaluation.
//!
//! Evaluation runs against an `EvalContext`, the seam through which
//! attribute references are resolved — for a plain view that is one base
//! object; for a joined view it is one combination of base object and
//! joined rows.
//!
//! Null handling: a comparison involving a null or absent attribute is
//! never true (use `IsNull`/`IsNotNull` to test for nulls). An unbound
//! parameter never matches.

use crate::ast::{CompareOp, Operand, Predicate};
use ripple_core::pattern_match::like;
use ripple_core::Value;

/// Resolution seam for predicate evaluation.
pub trait EvalContext {
    /// Resolves an attribute reference to its current value.
    ///
    /// `table` is None for the base table. The pseudo-attribute `id`
    /// resolves to the object's identity.
    fn resolve(&self, table: Option<&str>, attr: &str) -> Option<&Value>;
}

impl Predicate {
    /// Evaluates the predicate against a resolution context.
    pub fn matches(&self, ctx: &dyn EvalContext) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Compare { left, op, right } => {
                let left = match resolve_operand(left, ctx) {
                    Some(v) => v,
                    None => return false,
                };
                let right = match resolve_operand(right, ctx) {
                    Some(v) => v,
                    None => return false,
                };
                if left.is_null() || right.is_null() {
                    return false;
                }
                match op {
                    CompareOp::Eq => left == right,
                    CompareOp::Ne => left != right,
                    CompareOp::Lt => left < right,
                    CompareOp::Le => left <= right,
                    CompareOp::Gt => left > right,
                    CompareOp::Ge => left >= right,
                }
            }
            Predicate::Like { attr, pattern } => ctx
                .resolve(attr.table.as_deref(), &attr.attr)
                .and_then(|v| v.as_str())
                .map(|s| like(s, pattern))
                .unwrap_or(false),
            Predicate::IsNull(attr) => ctx
                .resolve(attr.table.as_deref(), &attr.attr)
                .map(|v| v.is_null())
                .unwrap_or(true),
            Predicate::IsNotNull(attr) => ctx
                .resolve(attr.table.as_deref(), &attr.attr)
                .map(|v| !v.is_null())
                .unwrap_or(false),
            Predicate::And(children) => children.iter().all(|c| c.matches(ctx)),
            Predicate::Or(children) => children.iter().any(|c| c.matches(ctx)),
            Predicate::Not(child) => !child.matches(ctx),
        }
    }
}

fn resolve_operand<'a>(operand: &'a Operand, ctx: &'a dyn EvalContext) -> Option<&'a Value> {
    match operand {
        Operand::Attr(r) => ctx.resolve(r.table.as_deref(), &r.attr),
        Operand::Literal(v) => Some(v),
        Operand::Param(_) => None,
    }
}
