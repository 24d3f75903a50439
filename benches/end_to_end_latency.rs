use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http_shaping::ShapingConfig;
use http_shaping_hub::bench_support::ProxyBenchFixture;
use reqwest::Client;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn bench_http_proxy_latency(c: &mut Criterion) {
    let runtime = Runtime::new().expect("runtime");
    let _guard = runtime.enter();
    let mut group = c.benchmark_group("e2e_latency");
    group
        .sample_size(200)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));

    let cases = [
        ("allow", ShapingConfig::new(3600, "1EiB", "1EiB", true)),
        ("reject", ShapingConfig::new(3600, "0B", "1EiB", true)),
    ];

    for (name, shaping) in cases {
        let fixture = runtime.block_on(async {
            let fixture = ProxyBenchFixture::start(shaping).await.expect("proxy");
            Mock::given(method("GET"))
                .and(path("/bench"))
                .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
                .mount(&fixture.upstream)
                .await;
            fixture
        });
        let client = Client::new();
        let url = format!("{}/bench", fixture.proxy_base_url);

        group.bench_function(BenchmarkId::new("http_proxy_e2e", name), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let response = client.get(&url).send().await.expect("request");
                    response.bytes().await.expect("body")
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_http_proxy_latency);
criterion_main!(benches);
