use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use http::header::CONTENT_LENGTH;
use http::Request;
use http_shaping::{ManualClock, ShapingConfig, ShapingFilter};
use http_shaping_proxy::{ProxyConfig, ProxyServer};
use tokio::task::JoinHandle;
use wiremock::MockServer;

// Re-export external crates needed by the benches
pub use http_shaping;
pub use wiremock;

/// A filter driven by a manual clock so benches control window resets.
pub struct ShapingBenchFixture {
    pub filter: Arc<ShapingFilter>,
    pub clock: ManualClock,
}

impl ShapingBenchFixture {
    pub fn new(config: &ShapingConfig) -> Self {
        let clock = ManualClock::new(0);
        let filter = ShapingFilter::with_clock(config, Arc::new(clock.clone()))
            .expect("bench shaping config");
        Self {
            filter: Arc::new(filter),
            clock,
        }
    }

    pub fn request(length: u64) -> Request<String> {
        Request::builder()
            .method("POST")
            .uri("http://bench.local/ingest")
            .header(CONTENT_LENGTH, length)
            .body(String::new())
            .expect("bench request")
    }
}

/// A running proxy in front of a mock upstream.
pub struct ProxyBenchFixture {
    pub upstream: MockServer,
    pub proxy_base_url: String,
    handle: JoinHandle<Result<()>>,
}

impl ProxyBenchFixture {
    pub async fn start(shaping: ShapingConfig) -> Result<Self> {
        let upstream = MockServer::start().await;
        let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();

        let config = ProxyConfig {
            host: "127.0.0.1".to_string(),
            port,
            upstream_url: upstream.uri(),
            request_timeout_secs: 5,
            max_body_size_bytes: 1024 * 1024,
            log_level: "warn".to_string(),
            shaping,
        };
        config.validate()?;

        let addr = config.listen_addr();
        let server = ProxyServer::new(config).context("proxy server")?;
        let handle = tokio::spawn(async move { server.run().await });

        for _ in 0..20 {
            if tokio::net::TcpStream::connect(&addr).await.is_ok() {
                return Ok(Self {
                    upstream,
                    proxy_base_url: format!("http://{}", addr),
                    handle,
                });
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        handle.abort();
        anyhow::bail!("proxy [{}] did not become ready in time", addr)
    }
}

impl Drop for ProxyBenchFixture {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
