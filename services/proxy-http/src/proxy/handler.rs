use super::{ProxyError, ProxyState};
use crate::config::ProxyConfig;
use crate::server::PeerInfo;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use http_shaping::{declared_length, ShapingFilter};
use hyper::body::Body;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct ProxyHandler {
    state: ProxyState,
}

impl ProxyHandler {
    pub fn new(config: Arc<ProxyConfig>) -> anyhow::Result<Self> {
        let state = ProxyState::new(config)?;
        Ok(Self { state })
    }

    pub fn shaping_filter(&self) -> &Arc<ShapingFilter> {
        &self.state.shaping_filter
    }

    /// Serves one request; failures become JSON error responses.
    #[instrument(skip(self, req, peer_info), fields(request_id))]
    pub async fn handle_request<B>(
        &self,
        req: Request<B>,
        peer_info: Option<Arc<PeerInfo>>,
    ) -> Result<Response<Full<Bytes>>, Infallible>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        // Wrap entire pipeline in timeout
        let timeout_duration = self.state.config.request_timeout();
        let result = match tokio::time::timeout(
            timeout_duration,
            self.handle_request_inner(req, peer_info, &request_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProxyError::Timeout),
        };

        Ok(result.unwrap_or_else(|e| {
            warn!(error = %e, request_id = %request_id, "Request failed");
            e.to_response(Some(&request_id))
        }))
    }

    async fn handle_request_inner<B>(
        &self,
        req: Request<B>,
        peer_info: Option<Arc<PeerInfo>>,
        request_id: &str,
    ) -> Result<Response<Full<Bytes>>, ProxyError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let start = std::time::Instant::now();
        let client_ip = peer_info.as_ref().map(|info| info.client_ip());
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let request_size = declared_length(req.headers());

        let upstream_client = &self.state.upstream_client;
        let response = self
            .state
            .shaping_filter
            .handle(req, |req| upstream_client.forward_request(req))
            .await?;

        info!(
            request_id = %request_id,
            client_ip = ?client_ip,
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            request_size_bytes = ?request_size,
            response_size_bytes = ?declared_length(response.headers()),
            total_latency_ms = start.elapsed().as_millis(),
            "Request completed"
        );

        Ok(response)
    }
}
