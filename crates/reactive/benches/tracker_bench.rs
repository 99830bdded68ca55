//! Benchmarks for ripple-reactive: tracker-maintained membership vs full
//! view re-query.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::schema::SchemaBuilder;
use ripple_core::{DataType, Value};
use ripple_query::{Operand, Predicate};
use ripple_reactive::TableViews;
use ripple_store::{ObjectTable, Store};

fn open_store() -> Store {
    Store::open(vec![SchemaBuilder::new("item")
        .unwrap()
        .add_attribute("title", DataType::String)
        .unwrap()
        .add_attribute("feed_id", DataType::Int64)
        .unwrap()
        .build()])
    .unwrap()
}

fn populate(items: &ObjectTable, size: i64) -> Vec<u64> {
    (0..size)
        .map(|i| {
            items
                .create(
                    [
                        ("title".to_string(), Value::from("item")),
                        ("feed_id".to_string(), Value::Int64(i % 4)),
                    ]
                    .into(),
                )
                .unwrap()
        })
        .collect()
}

fn bench_view_requery(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/requery");

    for size in [10i64, 100, 1000] {
        let store = open_store();
        let items = store.table("item").unwrap();
        populate(&items, size);
        let view = items
            .make_view(Predicate::eq("feed_id", Operand::literal(0i64)), &[], &[])
            .unwrap();

        group.bench_with_input(BenchmarkId::new("count", size), &view, |b, view| {
            b.iter(|| black_box(view.count().unwrap()))
        });
    }

    group.finish();
}

fn bench_tracker_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker/update");

    for size in [10i64, 100, 1000] {
        let store = open_store();
        let items = store.table("item").unwrap();
        let ids = populate(&items, size);
        let view = items
            .make_view(Predicate::eq("feed_id", Operand::literal(0i64)), &[], &[])
            .unwrap();
        let _tracker = view.make_tracker().unwrap();
        let target = ids[0];

        // One attribute set, predicate unaffected: the tracker evaluates
        // membership for a single object instead of re-running the query.
        group.bench_with_input(
            BenchmarkId::new("benign_set_attribute", size),
            &items,
            |b, items| {
                b.iter(|| {
                    items
                        .set_attribute(black_box(target), "title", Value::from("renamed"))
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_membership_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker/churn");

    let store = open_store();
    let items = store.table("item").unwrap();
    let ids = populate(&items, 1000);
    let view = items
        .make_view(Predicate::eq("feed_id", Operand::literal(0i64)), &[], &[])
        .unwrap();
    let _tracker = view.make_tracker().unwrap();
    let target = ids[0];

    group.bench_function("toggle_membership", |b| {
        let mut feed = 0i64;
        b.iter(|| {
            feed = 1 - feed;
            items
                .set_attribute(black_box(target), "feed_id", Value::Int64(feed))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_view_requery,
    bench_tracker_update,
    bench_membership_churn
);
criterion_main!(benches);
