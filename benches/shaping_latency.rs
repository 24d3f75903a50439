use std::convert::Infallible;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Response;
use http_shaping::{parse_byte_quantity, ShapingConfig};
use http_shaping_hub::bench_support::ShapingBenchFixture;
use tokio::runtime::Runtime;

const QUANTITIES: &[&str] = &["5B", "1KiB", "512MB", "10.5GiB", " 3tib ", "5XB"];

fn bench_byte_quantity(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_quantity");

    for input in QUANTITIES {
        group.bench_with_input(BenchmarkId::new("parse", input.trim()), input, |b, input| {
            b.iter(|| black_box(parse_byte_quantity(black_box(input))))
        });
    }

    group.finish();
}

fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission");
    group
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));

    let allow = ShapingBenchFixture::new(&ShapingConfig::new(60, "1EiB", "1EiB", true));
    group.bench_function(BenchmarkId::new("admit", "allow"), |b| {
        b.iter(|| black_box(allow.filter.admit(Some(512))))
    });

    let reject = ShapingBenchFixture::new(&ShapingConfig::new(60, "0B", "1EiB", true));
    group.bench_function(BenchmarkId::new("admit", "reject"), |b| {
        b.iter(|| black_box(reject.filter.admit(Some(512))))
    });

    let resetting = ShapingBenchFixture::new(&ShapingConfig::new(1, "1EiB", "1EiB", true));
    group.bench_function(BenchmarkId::new("admit", "reset_every_call"), |b| {
        b.iter(|| {
            resetting.clock.advance(1);
            black_box(resetting.filter.admit(Some(512)))
        })
    });

    group.finish();
}

fn bench_handle(c: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("handle");

    let fixture = ShapingBenchFixture::new(&ShapingConfig::new(60, "1EiB", "1EiB", true));
    group.bench_function(BenchmarkId::new("handle", "passthrough"), |b| {
        b.iter(|| {
            let response = runtime
                .block_on(fixture.filter.handle(ShapingBenchFixture::request(1024), |_req| async {
                    Ok::<_, Infallible>(Response::new(String::from("ok")))
                }))
                .expect("handled");
            black_box(response)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_byte_quantity, bench_admission, bench_handle);
criterion_main!(benches);
