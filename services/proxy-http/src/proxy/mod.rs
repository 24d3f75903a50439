mod error;
pub(crate) mod handler;
mod upstream;

pub use error::ProxyError;
pub use handler::ProxyHandler;
pub use upstream::UpstreamClient;

use crate::config::ProxyConfig;
use http_shaping::ShapingFilter;
use std::sync::Arc;

#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<ProxyConfig>,
    pub shaping_filter: Arc<ShapingFilter>,
    pub upstream_client: Arc<UpstreamClient>,
}

impl ProxyState {
    pub fn new(config: Arc<ProxyConfig>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let shaping_filter = Arc::new(
            ShapingFilter::new(&config.shaping)
                .context("Invalid traffic shaping configuration")?,
        );
        let upstream_client = Arc::new(UpstreamClient::new(
            config.upstream_url.clone(),
            config.request_timeout_secs,
            config.max_body_size_bytes,
        )?);

        Ok(Self {
            config,
            shaping_filter,
            upstream_client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_shaping::ShapingConfig;

    #[test]
    fn test_state_shares_server_config() {
        let config = Arc::new(ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            upstream_url: "http://localhost:9000".to_string(),
            request_timeout_secs: 30,
            max_body_size_bytes: 1024,
            log_level: "info".to_string(),
            shaping: ShapingConfig::new(5, "1KiB", "1KiB", true),
        });

        let state = ProxyState::new(Arc::clone(&config)).unwrap();

        assert!(Arc::ptr_eq(&state.config, &config));
        assert_eq!(Arc::strong_count(&config), 2);
    }
}
