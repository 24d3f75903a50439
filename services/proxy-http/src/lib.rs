//! Standalone reverse proxy that applies window-based traffic shaping in
//! front of a single upstream service.

pub mod config;
pub mod proxy;
pub mod server;

pub use config::ProxyConfig;
pub use proxy::{ProxyError, ProxyHandler, UpstreamClient};
pub use server::{PeerInfo, ProxyServer};
