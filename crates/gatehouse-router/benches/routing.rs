//! Routing benchmarks.
//!
//! Run with: `cargo bench -p gatehouse-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gatehouse_router::RouteTable;
use http::Method;

fn build_table(num_routes: usize) -> RouteTable<String> {
    let mut table = RouteTable::new();

    for i in 0..num_routes / 3 {
        table
            .insert(Method::GET, &format!("/api/v1/resource{i}"), format!("list{i}"))
            .unwrap();
    }

    for i in 0..num_routes / 3 {
        table
            .insert(Method::GET, &format!("/api/v1/resource{i}/:id"), format!("get{i}"))
            .unwrap();
    }

    for i in 0..num_routes / 3 {
        table
            .insert(
                Method::GET,
                &format!("/api/v1/org/:orgId/resource{i}/:id"),
                format!("orgGet{i}"),
            )
            .unwrap();
    }

    table
}

fn bench_literal_match(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("literal_match", |b| {
        b.iter(|| black_box(table.match_route(&Method::GET, "/api/v1/resource20")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(table.match_route(&Method::GET, "/api/v1/resource20/12345")));
    });
}

fn bench_miss(c: &mut Criterion) {
    let table = build_table(99);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(table.match_route(&Method::GET, "/not/registered/anywhere")));
    });
}

fn bench_table_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_size");

    for size in [12, 48, 96, 300] {
        let table = build_table(size);
        let last = size / 3 - 1;
        let path = format!("/api/v1/org/acme/resource{last}/1");

        group.bench_with_input(BenchmarkId::from_parameter(size), &path, |b, path| {
            b.iter(|| black_box(table.match_route(&Method::GET, path)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_literal_match,
    bench_param_match,
    bench_miss,
    bench_table_sizes
);
criterion_main!(benches);
