//! Query Performance Benchmarks
//!
//! Measures filter compilation, predicate evaluation and full query
//! execution over growing user populations.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use scim_provisioning::filter::{Conjunction, FilterTerm, compile, parse_filter};
use scim_provisioning::patch::{PatchOperation, PatchRequest, apply};
use scim_provisioning::query::{QueryParameters, execute};
use scim_provisioning::resource::{USER_SCHEMA, User};
use serde_json::json;

/// Create a population with a mix of active flags and external ids
fn create_users(count: usize) -> Vec<User> {
    (0..count)
        .map(|i| {
            User::new(format!("user{}@example.com", i))
                .with_display_name(format!("User {}", i))
                .with_external_id(format!("ext-{}", i % 50))
                .with_active(i % 3 != 0)
        })
        .collect()
}

fn sample_filters() -> Vec<Conjunction> {
    vec![
        Conjunction::new(FilterTerm::equals("active", "true"))
            .and(FilterTerm::equals("externalId", "ext-7")),
        Conjunction::new(FilterTerm::equals("userName", "USER42@example.com")),
    ]
}

/// Benchmark turning filter text and terms into predicates
fn bench_filter_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_compilation");
    let text = r#"active eq true and externalId eq "ext-7" or userName eq "USER42@example.com""#;
    let filters = sample_filters();

    group.bench_function("parse_text", |b| {
        b.iter(|| black_box(parse_filter(black_box(text))))
    });

    group.bench_function("compile_terms", |b| {
        b.iter(|| black_box(compile::<User>(black_box(&filters))))
    });

    group.finish();
}

/// Benchmark filtered queries with and without pagination
fn bench_query_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_execution");

    for size in [100, 1_000, 10_000].iter() {
        let users = create_users(*size);
        group.throughput(Throughput::Elements(*size as u64));

        let filtered = QueryParameters::new(USER_SCHEMA).with_filters(sample_filters());
        group.bench_with_input(BenchmarkId::new("filtered", size), size, |b, _| {
            b.iter(|| black_box(execute(users.clone(), black_box(&filtered))))
        });

        let paged = QueryParameters::new(USER_SCHEMA)
            .with_filter(Conjunction::new(FilterTerm::equals("active", "true")))
            .with_count(10);
        group.bench_with_input(BenchmarkId::new("paged", size), size, |b, _| {
            b.iter(|| black_box(execute(users.clone(), black_box(&paged))))
        });
    }

    group.finish();
}

/// Benchmark applying a multi-operation patch
fn bench_patch_application(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_application");
    let user = create_users(1).remove(0);
    let request = PatchRequest::new(vec![
        PatchOperation::replace("active", json!(false)),
        PatchOperation::replace("name.givenName", json!("Barbara")),
        PatchOperation::add("emails", json!([{"value": "b@example.com", "primary": true}])),
    ]);

    group.bench_function("three_operations", |b| {
        b.iter(|| black_box(apply(black_box(&user), black_box(&request))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_filter_compilation,
    bench_query_execution,
    bench_patch_application
);
criterion_main!(benches);
