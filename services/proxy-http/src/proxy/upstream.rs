use super::ProxyError;
use bytes::Bytes;
use http::{HeaderMap, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

// Hop-by-hop headers are connection-scoped and never forwarded
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

pub struct UpstreamClient {
    http_client: Client,
    upstream_base_url: String,
    max_body_size_bytes: usize,
}

impl UpstreamClient {
    pub fn new(
        upstream_url: String,
        timeout_secs: u64,
        max_body_size_bytes: usize,
    ) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(20)
            .build()?;

        Ok(Self {
            http_client,
            upstream_base_url: upstream_url.trim_end_matches('/').to_string(),
            max_body_size_bytes,
        })
    }

    #[instrument(skip(self, req), fields(method = %req.method(), path = %req.uri().path()))]
    pub async fn forward_request<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>, ProxyError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        // Build upstream URL
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let upstream_url = format!("{}{}", self.upstream_base_url, path_and_query);

        debug!(upstream_url = %upstream_url, "Forwarding request to upstream");

        // Collect request body
        let body_bytes = body
            .collect()
            .await
            .map_err(|e| ProxyError::Upstream(format!("Failed to read request body: {}", e)))?
            .to_bytes();

        // Check body size limit
        if body_bytes.len() > self.max_body_size_bytes {
            return Err(ProxyError::BodyTooLarge {
                size: body_bytes.len(),
                limit: self.max_body_size_bytes,
            });
        }

        let headers = Self::sanitize_headers(&parts.headers);

        let forwarded_host = parts
            .headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.host())
            .unwrap_or("unknown")
            .to_string();

        let mut upstream_req = self
            .http_client
            .request(parts.method.clone(), &upstream_url)
            .headers(headers)
            .header("X-Forwarded-Proto", "http")
            .header("X-Forwarded-Host", forwarded_host);

        if !body_bytes.is_empty() {
            upstream_req = upstream_req.body(body_bytes);
        }

        let start = std::time::Instant::now();

        let upstream_response = upstream_req
            .send()
            .await
            .map_err(|e| Self::upstream_failure("Upstream request failed", e))?;

        let status = upstream_response.status();
        debug!(
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis(),
            "Upstream response received"
        );

        // Convert reqwest::Response to hyper::Response; Content-Length is kept
        // so the shaping filter can account for the response size.
        let mut response_builder = Response::builder().status(status);

        for (name, value) in upstream_response.headers().iter() {
            if !Self::is_hop_by_hop(name.as_str()) {
                response_builder = response_builder.header(name, value);
            }
        }

        let response_body = upstream_response
            .bytes()
            .await
            .map_err(|e| Self::upstream_failure("Failed to read upstream response", e))?;

        response_builder
            .body(Full::new(response_body))
            .map_err(|e| ProxyError::Upstream(format!("Failed to build response: {}", e)))
    }

    // A slow upstream is a gateway timeout whichever timer fires first
    fn upstream_failure(context: &str, e: reqwest::Error) -> ProxyError {
        if e.is_timeout() {
            ProxyError::Timeout
        } else {
            ProxyError::Upstream(format!("{}: {}", context, e))
        }
    }

    fn is_hop_by_hop(name: &str) -> bool {
        HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str())
    }

    fn sanitize_headers(headers: &HeaderMap) -> HeaderMap {
        let mut sanitized = HeaderMap::new();

        for (name, value) in headers.iter() {
            // reqwest sets Host and Content-Length for the rebuilt request
            if Self::is_hop_by_hop(name.as_str())
                || name == http::header::HOST
                || name == http::header::CONTENT_LENGTH
            {
                continue;
            }

            sanitized.append(name.clone(), value.clone());
        }

        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_sanitize_headers_drops_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("host", HeaderValue::from_static("proxy.local"));
        headers.insert("content-length", HeaderValue::from_static("12"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let sanitized = UpstreamClient::sanitize_headers(&headers);

        assert_eq!(sanitized.len(), 3);
        assert_eq!(sanitized.get("x-custom").unwrap(), "kept");
        assert_eq!(sanitized.get_all("accept").iter().count(), 2);
        assert!(sanitized.get("host").is_none());
    }
}
