use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::byte_quantity::{parse_byte_quantity, ByteQuantityError};

pub const DEFAULT_FILTER_NAME: &str = "http-shaping";

/// Raw shaping settings, as read from a config file or environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapingConfig {
    /// Instance name used in log fields
    #[serde(default = "default_name")]
    pub name: String,

    /// Window length in seconds
    pub loop_interval_seconds: i64,

    /// Inbound quota per window, e.g. "10GiB"
    pub in_traffic_limit: String,

    /// Outbound quota per window, e.g. "10GiB"
    pub out_traffic_limit: String,

    /// When false, traffic is counted but never rejected
    #[serde(default)]
    pub enforce_limits: bool,
}

fn default_name() -> String {
    DEFAULT_FILTER_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("loop interval must be positive, got {0}")]
    NonPositiveInterval(i64),

    #[error("invalid in_traffic_limit: {0}")]
    InvalidInTrafficLimit(#[source] ByteQuantityError),

    #[error("invalid out_traffic_limit: {0}")]
    InvalidOutTrafficLimit(#[source] ByteQuantityError),
}

/// Validated, immutable limits a filter instance runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapingLimits {
    pub name: String,
    pub interval_secs: NonZeroU64,
    pub in_limit_bytes: u64,
    pub out_limit_bytes: u64,
    pub enforce: bool,
}

impl ShapingConfig {
    pub fn new(
        loop_interval_seconds: i64,
        in_traffic_limit: impl Into<String>,
        out_traffic_limit: impl Into<String>,
        enforce_limits: bool,
    ) -> Self {
        Self {
            name: default_name(),
            loop_interval_seconds,
            in_traffic_limit: in_traffic_limit.into(),
            out_traffic_limit: out_traffic_limit.into(),
            enforce_limits,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Checks every field once and produces the limits used at request time.
    pub fn validate(&self) -> Result<ShapingLimits, ConfigError> {
        let interval_secs = u64::try_from(self.loop_interval_seconds)
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or(ConfigError::NonPositiveInterval(self.loop_interval_seconds))?;

        let in_limit_bytes = parse_byte_quantity(&self.in_traffic_limit)
            .map_err(ConfigError::InvalidInTrafficLimit)?;
        let out_limit_bytes = parse_byte_quantity(&self.out_traffic_limit)
            .map_err(ConfigError::InvalidOutTrafficLimit)?;

        Ok(ShapingLimits {
            name: self.name.clone(),
            interval_secs,
            in_limit_bytes,
            out_limit_bytes,
            enforce: self.enforce_limits,
        })
    }
}
