use crate::config::ProxyConfig;
use crate::proxy::handler::ProxyHandler;
use anyhow::{Context, Result};
use http_shaping::ShapingFilter;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

pub struct ProxyServer {
    config: Arc<ProxyConfig>,
    handler: Arc<ProxyHandler>,
}

impl ProxyServer {
    /// Create a new proxy server
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let config = Arc::new(config);
        let handler = Arc::new(ProxyHandler::new(config.clone())?);

        Ok(Self { config, handler })
    }

    /// The filter shared by every connection of this server
    pub fn shaping_filter(&self) -> Arc<ShapingFilter> {
        Arc::clone(self.handler.shaping_filter())
    }

    /// Serve until `shutdown` resolves. The listener is closed on return;
    /// connections already accepted finish on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                info!("Proxy server stopped accepting connections");
                Ok(())
            }
        }
    }

    /// Run the proxy server
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .listen_addr()
            .parse()
            .context("Invalid listen address")?;

        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind to {}", addr))?;

        let limits = self.handler.shaping_filter().limits();
        info!(
            "Proxy server listening on {} (upstream: {}, shaping: {} every {}s, enforce: {})",
            addr, self.config.upstream_url, limits.name, limits.interval_secs, limits.enforce
        );

        let server = Arc::new(self);

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let server = Arc::clone(&server);

            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                    error!("Connection error from {}: {}", peer_addr, e);
                }
            });
        }
    }

    /// Handle a single connection
    async fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        debug!("Accepted connection from {}", peer_addr);

        let io = TokioIo::new(stream);
        let handler: Arc<ProxyHandler> = Arc::clone(&self.handler);
        let peer_info = Arc::new(PeerInfo { addr: peer_addr });

        let service = service_fn(move |req| {
            let handler = Arc::clone(&handler);
            let peer_info = Arc::clone(&peer_info);
            async move { handler.handle_request(req, Some(peer_info)).await }
        });

        http1::Builder::new()
            .serve_connection(io, service)
            .await
            .context("Failed to serve connection")?;

        Ok(())
    }
}

/// Peer connection information
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub addr: SocketAddr,
}

impl PeerInfo {
    /// Get client IP address
    pub fn client_ip(&self) -> std::net::IpAddr {
        self.addr.ip()
    }
}
