//! Live views over object tables.
//!
//! A view binds a predicate (and optional join specs) to a base table at
//! construction time, validating everything eagerly. Evaluation is lazy: a
//! fresh full query runs on every `count()`/`iter()` call. Trackers reuse
//! the same `Matcher` to evaluate membership incrementally.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use ripple_core::schema::ObjectSchema;
use ripple_core::{DomainObject, Error, ObjectId, Result, Value};
use ripple_query::{validate_join, validate_predicate, EvalContext, JoinSpec, Predicate};
use ripple_store::{ObjectTable, StoreHandle, TableId};

use crate::tracker::ViewTracker;

/// A join spec resolved against the store arena.
#[derive(Clone)]
pub(crate) struct ResolvedJoin {
    pub(crate) spec: JoinSpec,
    pub(crate) table: TableId,
}

/// The evaluation core shared by `View` (lazy re-query) and `ViewTracker`
/// (incremental membership).
#[derive(Clone)]
pub(crate) struct Matcher {
    pub(crate) store: StoreHandle,
    pub(crate) base: TableId,
    pub(crate) base_name: String,
    pub(crate) predicate: Predicate,
    pub(crate) joins: Vec<ResolvedJoin>,
}

impl Matcher {
    /// Evaluates whether a base object is currently in the view.
    ///
    /// Inner-join semantics: every join must produce at least one candidate
    /// row, and some combination of candidates must satisfy the predicate.
    /// All joined-table state is snapshotted before evaluation so no table
    /// borrow is held while the predicate runs.
    pub(crate) fn matches(&self, obj: &DomainObject) -> Result<bool> {
        if self.joins.is_empty() {
            let ctx = ComboCtx::new(&self.base_name, obj, &[]);
            return Ok(self.predicate.matches(&ctx));
        }

        let mut candidate_sets: Vec<Vec<DomainObject>> = Vec::with_capacity(self.joins.len());
        for join in &self.joins {
            let base_value = match join_key(obj, join.spec.base_attr()) {
                Some(v) if !v.is_null() => v,
                _ => return Ok(false),
            };
            let candidates: Vec<DomainObject> = self.store.with_table(join.table, |t| {
                t.iter()
                    .filter(|row| {
                        join_key(row, join.spec.joined_attr())
                            .map(|v| !v.is_null() && v.cmp(&base_value) == Ordering::Equal)
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect()
            })?;
            if candidates.is_empty() {
                return Ok(false);
            }
            candidate_sets.push(candidates);
        }

        let mut indices = alloc::vec![0usize; candidate_sets.len()];
        loop {
            let combo: Vec<(&str, &DomainObject)> = self
                .joins
                .iter()
                .zip(&candidate_sets)
                .zip(&indices)
                .map(|((join, set), &i)| (join.spec.table(), &set[i]))
                .collect();
            let ctx = ComboCtx::new(&self.base_name, obj, &combo);
            if self.predicate.matches(&ctx) {
                return Ok(true);
            }
            // Advance to the next combination.
            let mut pos = 0;
            loop {
                if pos == indices.len() {
                    return Ok(false);
                }
                indices[pos] += 1;
                if indices[pos] < candidate_sets[pos].len() {
                    break;
                }
                indices[pos] = 0;
                pos += 1;
            }
        }
    }

    /// Returns all currently matching objects in ascending-id order.
    pub(crate) fn matching_objects(&self) -> Result<Vec<DomainObject>> {
        let snapshot: Vec<DomainObject> = self
            .store
            .with_table(self.base, |t| t.iter().cloned().collect())?;
        let mut matching = Vec::new();
        for obj in snapshot {
            if self.matches(&obj)? {
                matching.push(obj);
            }
        }
        Ok(matching)
    }

    /// Returns all currently matching ids in ascending order.
    pub(crate) fn matching_ids(&self) -> Result<Vec<ObjectId>> {
        Ok(self.matching_objects()?.iter().map(|o| o.id()).collect())
    }

    /// Fetches a base-table object snapshot by id.
    pub(crate) fn base_object(&self, id: ObjectId) -> Result<Option<DomainObject>> {
        self.store.with_table(self.base, |t| t.get(id).cloned())
    }
}

/// Resolves the value joining on `attr`, treating `id` as object identity.
fn join_key(obj: &DomainObject, attr: &str) -> Option<Value> {
    if attr == "id" {
        Some(Value::Int64(obj.id() as i64))
    } else {
        obj.get(attr).cloned()
    }
}

/// Evaluation context over one base object plus one row per joined table.
struct ComboCtx<'a> {
    base_name: &'a str,
    base: &'a DomainObject,
    base_id: Value,
    joined: Vec<(&'a str, &'a DomainObject, Value)>,
}

impl<'a> ComboCtx<'a> {
    fn new(base_name: &'a str, base: &'a DomainObject, combo: &[(&'a str, &'a DomainObject)]) -> Self {
        Self {
            base_name,
            base,
            base_id: Value::Int64(base.id() as i64),
            joined: combo
                .iter()
                .map(|(name, obj)| (*name, *obj, Value::Int64(obj.id() as i64)))
                .collect(),
        }
    }

    fn resolve_base(&self, attr: &str) -> Option<&Value> {
        if attr == "id" {
            Some(&self.base_id)
        } else {
            self.base.get(attr)
        }
    }
}

impl EvalContext for ComboCtx<'_> {
    fn resolve(&self, table: Option<&str>, attr: &str) -> Option<&Value> {
        match table {
            None => self.resolve_base(attr),
            Some(t) if t == self.base_name => self.resolve_base(attr),
            Some(t) => self
                .joined
                .iter()
                .find(|(name, _, _)| *name == t)
                .and_then(|(_, obj, id)| {
                    if attr == "id" {
                        Some(id)
                    } else {
                        obj.get(attr)
                    }
                }),
        }
    }
}

/// A live, predicate-bound projection over one object table.
///
/// A view owns no objects and caches nothing; membership is re-evaluated on
/// every query. Attach a `ViewTracker` for incremental updates.
pub struct View {
    pub(crate) matcher: Matcher,
}

impl View {
    /// Builds a view on `table`, binding `params` into the predicate and
    /// resolving `joins` against the store.
    ///
    /// Fails fast: parameter binding, join resolution, and predicate
    /// validation all happen here, never at iteration time.
    pub fn new(
        table: &ObjectTable,
        predicate: Predicate,
        params: &[Value],
        joins: &[JoinSpec],
    ) -> Result<View> {
        let store = table.store_handle().clone();
        let base_schema = store.schema(table.table_id())?;
        let bound = predicate.bind(params)?;

        let mut resolved: Vec<ResolvedJoin> = Vec::with_capacity(joins.len());
        let mut joined_schemas: Vec<(String, ObjectSchema)> = Vec::with_capacity(joins.len());
        for spec in joins {
            if spec.table() == base_schema.name() {
                return Err(Error::invalid_join("cannot join a table to itself"));
            }
            if resolved.iter().any(|rj| rj.spec.table() == spec.table()) {
                return Err(Error::invalid_join(alloc::format!(
                    "duplicate join table: {}",
                    spec.table()
                )));
            }
            let table_id = store.table_id(spec.table())?;
            let joined_schema = store.schema(table_id)?;
            validate_join(spec, &base_schema, &joined_schema)?;
            resolved.push(ResolvedJoin {
                spec: spec.clone(),
                table: table_id,
            });
            joined_schemas.push((spec.table().to_string(), joined_schema));
        }

        let join_refs: Vec<(&str, &ObjectSchema)> = joined_schemas
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
            .collect();
        validate_predicate(&bound, &base_schema, &join_refs)?;

        Ok(View {
            matcher: Matcher {
                store,
                base: table.table_id(),
                base_name: base_schema.name().to_string(),
                predicate: bound,
                joins: resolved,
            },
        })
    }

    /// Returns the base table name.
    pub fn table_name(&self) -> &str {
        &self.matcher.base_name
    }

    /// Number of currently matching ids. Re-evaluated on every call.
    pub fn count(&self) -> Result<usize> {
        Ok(self.matcher.matching_ids()?.len())
    }

    /// Currently matching ids in ascending order.
    pub fn ids(&self) -> Result<Vec<ObjectId>> {
        self.matcher.matching_ids()
    }

    /// A restartable iterator over snapshots of the currently matching
    /// objects, in ascending-id order.
    pub fn iter(&self) -> Result<impl Iterator<Item = DomainObject>> {
        Ok(self.matcher.matching_objects()?.into_iter())
    }

    /// Gets an object by id, failing if the id is not currently in the
    /// view's matching set.
    pub fn get_object_by_id(&self, id: ObjectId) -> Result<DomainObject> {
        let obj = self
            .matcher
            .base_object(id)?
            .ok_or_else(|| Error::object_not_found(&self.matcher.base_name, id))?;
        if self.matcher.matches(&obj)? {
            Ok(obj)
        } else {
            Err(Error::object_not_found(&self.matcher.base_name, id))
        }
    }

    /// Constructs and registers a tracker bound to this view.
    ///
    /// Fails with `Error::InvalidState` if the view's store has been
    /// dropped or reloaded.
    pub fn make_tracker(&self) -> Result<ViewTracker> {
        ViewTracker::attach(self)
    }
}

/// View construction on table handles.
pub trait TableViews {
    /// Constructs a view bound to this table. See `View::new`.
    fn make_view(
        &self,
        predicate: Predicate,
        params: &[Value],
        joins: &[JoinSpec],
    ) -> Result<View>;
}

impl TableViews for ObjectTable {
    fn make_view(
        &self,
        predicate: Predicate,
        params: &[Value],
        joins: &[JoinSpec],
    ) -> Result<View> {
        View::new(self, predicate, params, joins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use ripple_core::schema::SchemaBuilder;
    use ripple_core::DataType;
    use ripple_query::Operand;
    use ripple_store::Store;

    fn open_store() -> Store {
        Store::open(vec![
            SchemaBuilder::new("feed")
                .unwrap()
                .add_attribute("url", DataType::String)
                .unwrap()
                .add_attribute("user_title", DataType::String)
                .unwrap()
                .nullable(&["user_title"])
                .build(),
            SchemaBuilder::new("item")
                .unwrap()
                .add_attribute("title", DataType::String)
                .unwrap()
                .add_attribute("feed_id", DataType::Int64)
                .unwrap()
                .build(),
        ])
        .unwrap()
    }

    fn attrs(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_view_count_and_iter() {
        let store = open_store();
        let feeds = store.table("feed").unwrap();
        let items = store.table("item").unwrap();

        let feed_id = feeds
            .create(attrs(&[("url", Value::from("http://feed.org"))]))
            .unwrap();
        let i1 = items
            .create(attrs(&[
                ("title", Value::from("item1")),
                ("feed_id", Value::Int64(feed_id as i64)),
            ]))
            .unwrap();
        let i2 = items
            .create(attrs(&[
                ("title", Value::from("item2")),
                ("feed_id", Value::Int64(feed_id as i64)),
            ]))
            .unwrap();
        items
            .create(attrs(&[
                ("title", Value::from("item3")),
                ("feed_id", Value::Int64(9999)),
            ]))
            .unwrap();

        let view = items
            .make_view(
                Predicate::eq("feed_id", Operand::param(0)),
                &[Value::Int64(feed_id as i64)],
                &[],
            )
            .unwrap();

        assert_eq!(view.count().unwrap(), 2);
        assert_eq!(view.ids().unwrap(), vec![i1, i2]);
        let titles: Vec<_> = view
            .iter()
            .unwrap()
            .map(|o| o.get("title").cloned())
            .collect();
        assert_eq!(
            titles,
            vec![Some(Value::from("item1")), Some(Value::from("item2"))]
        );
    }

    #[test]
    fn test_view_tracks_current_state() {
        let store = open_store();
        let items = store.table("item").unwrap();
        let view = items
            .make_view(
                Predicate::eq("feed_id", Operand::literal(1i64)),
                &[],
                &[],
            )
            .unwrap();

        assert_eq!(view.count().unwrap(), 0);
        let id = items.create(attrs(&[("feed_id", Value::Int64(1))])).unwrap();
        assert_eq!(view.count().unwrap(), 1);

        items.set_attribute(id, "feed_id", Value::Int64(2)).unwrap();
        assert_eq!(view.count().unwrap(), 0);
    }

    #[test]
    fn test_view_get_object_by_id() {
        let store = open_store();
        let items = store.table("item").unwrap();
        let inside = items.create(attrs(&[("feed_id", Value::Int64(1))])).unwrap();
        let outside = items.create(attrs(&[("feed_id", Value::Int64(2))])).unwrap();

        let view = items
            .make_view(Predicate::eq("feed_id", Operand::literal(1i64)), &[], &[])
            .unwrap();

        assert_eq!(view.get_object_by_id(inside).unwrap().id(), inside);
        assert!(matches!(
            view.get_object_by_id(outside).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
        assert!(matches!(
            view.get_object_by_id(123456).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
    }

    #[test]
    fn test_join_view() {
        let store = open_store();
        let feeds = store.table("feed").unwrap();
        let items = store.table("item").unwrap();

        let f1 = feeds
            .create(attrs(&[("url", Value::from("http://feed.org"))]))
            .unwrap();
        feeds
            .set_attribute(f1, "user_title", Value::from("booya"))
            .unwrap();
        let f2 = feeds
            .create(attrs(&[("url", Value::from("http://feed.com"))]))
            .unwrap();

        let i1 = items
            .create(attrs(&[("feed_id", Value::Int64(f1 as i64))]))
            .unwrap();
        let i2 = items
            .create(attrs(&[("feed_id", Value::Int64(f1 as i64))]))
            .unwrap();
        items
            .create(attrs(&[("feed_id", Value::Int64(f2 as i64))]))
            .unwrap();

        let view = items
            .make_view(
                Predicate::eq("feed.user_title", Operand::literal("booya")),
                &[],
                &[JoinSpec::new("feed", "id", "feed_id")],
            )
            .unwrap();

        assert_eq!(view.count().unwrap(), 2);
        assert_eq!(view.ids().unwrap(), vec![i1, i2]);
    }

    #[test]
    fn test_join_dangling_fk_excluded() {
        let store = open_store();
        let items = store.table("item").unwrap();
        items
            .create(attrs(&[("feed_id", Value::Int64(424242))]))
            .unwrap();

        // Inner-join semantics: no joined row, no membership, even with an
        // always-true predicate.
        let view = items
            .make_view(
                Predicate::all(),
                &[],
                &[JoinSpec::new("feed", "id", "feed_id")],
            )
            .unwrap();
        assert_eq!(view.count().unwrap(), 0);
    }

    #[test]
    fn test_make_view_fail_fast() {
        let store = open_store();
        let items = store.table("item").unwrap();

        // Unknown attribute.
        assert!(items
            .make_view(Predicate::eq("missing", Operand::literal(1i64)), &[], &[])
            .is_err());
        // Unknown join table.
        assert!(items
            .make_view(
                Predicate::all(),
                &[],
                &[JoinSpec::new("nope", "id", "feed_id")]
            )
            .is_err());
        // Join attribute type mismatch.
        assert!(items
            .make_view(
                Predicate::all(),
                &[],
                &[JoinSpec::new("feed", "user_title", "feed_id")]
            )
            .is_err());
        // Parameter count mismatch.
        assert!(items
            .make_view(
                Predicate::eq("feed_id", Operand::param(0)),
                &[],
                &[]
            )
            .is_err());
        // Self-join.
        assert!(items
            .make_view(
                Predicate::all(),
                &[],
                &[JoinSpec::new("item", "id", "feed_id")]
            )
            .is_err());
    }

    #[test]
    fn test_view_on_dropped_store() {
        let view = {
            let store = open_store();
            let items = store.table("item").unwrap();
            items.make_view(Predicate::all(), &[], &[]).unwrap()
        };
        assert!(matches!(
            view.count().unwrap_err(),
            Error::InvalidState { .. }
        ));
        assert!(matches!(
            view.make_tracker().unwrap_err(),
            Error::InvalidState { .. }
        ));
    }

    #[test]
    fn test_like_view() {
        let store = open_store();
        let feeds = store.table("feed").unwrap();
        let f1 = feeds
            .create(attrs(&[("url", Value::from("http://feed.org"))]))
            .unwrap();
        feeds
            .set_attribute(f1, "user_title", Value::from("booya"))
            .unwrap();
        feeds
            .create(attrs(&[("url", Value::from("http://feed.com"))]))
            .unwrap();

        let view = feeds
            .make_view(Predicate::like("user_title", "booya%"), &[], &[])
            .unwrap();
        assert_eq!(view.ids().unwrap(), vec![f1]);
    }
}
