use anyhow::{Context, Result};
use http_shaping::{ShapingConfig, ShapingLimits, DEFAULT_FILTER_NAME};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listen host address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Upstream backend URL
    pub upstream_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum body size in bytes
    pub max_body_size_bytes: usize,

    /// Log level
    pub log_level: String,

    /// Traffic shaping settings for the single filter in front of the upstream
    pub shaping: ShapingConfig,
}

impl ProxyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("PROXY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PROXY_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("Invalid PROXY_PORT")?;

        let upstream_url =
            std::env::var("UPSTREAM_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("Invalid REQUEST_TIMEOUT_SECS")?;

        let max_body_size_bytes = std::env::var("MAX_BODY_SIZE_BYTES")
            .unwrap_or_else(|_| "10485760".to_string()) // 10MB
            .parse()
            .context("Invalid MAX_BODY_SIZE_BYTES")?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let name =
            std::env::var("SHAPING_NAME").unwrap_or_else(|_| DEFAULT_FILTER_NAME.to_string());

        let loop_interval_seconds = std::env::var("SHAPING_LOOP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("Invalid SHAPING_LOOP_INTERVAL_SECS")?;

        let in_traffic_limit =
            std::env::var("SHAPING_IN_TRAFFIC_LIMIT").unwrap_or_else(|_| "1GiB".to_string());

        let out_traffic_limit =
            std::env::var("SHAPING_OUT_TRAFFIC_LIMIT").unwrap_or_else(|_| "1GiB".to_string());

        let enforce_limits = std::env::var("SHAPING_ENFORCE_LIMITS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("Invalid SHAPING_ENFORCE_LIMITS")?;

        Ok(Self {
            host,
            port,
            upstream_url,
            request_timeout_secs,
            max_body_size_bytes,
            log_level,
            shaping: ShapingConfig::new(
                loop_interval_seconds,
                in_traffic_limit,
                out_traffic_limit,
                enforce_limits,
            )
            .with_name(name),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate upstream URL
        if self.upstream_url.is_empty() {
            anyhow::bail!("UPSTREAM_URL cannot be empty");
        }
        url::Url::parse(&self.upstream_url)
            .with_context(|| format!("UPSTREAM_URL is not a valid URL: {}", self.upstream_url))?;

        // Validate timeout
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than 0");
        }

        // Validate max body size
        if self.max_body_size_bytes == 0 {
            anyhow::bail!("MAX_BODY_SIZE_BYTES must be greater than 0");
        }

        // Validate shaping limits
        self.shaping_limits()?;

        Ok(())
    }

    /// Parsed shaping limits
    pub fn shaping_limits(&self) -> Result<ShapingLimits> {
        self.shaping
            .validate()
            .context("Invalid traffic shaping configuration")
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
