use bytes::Bytes;
use http::{Response, StatusCode};
use http_body_util::Full;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Body too large: {size} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { size: usize, limit: usize },

    #[error("Request timeout")]
    Timeout,
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn to_response(&self, request_id: Option<&str>) -> Response<Full<Bytes>> {
        let (error_code, message) = match self {
            ProxyError::Upstream(e) => ("UPSTREAM_ERROR", e.to_string()),
            ProxyError::BodyTooLarge { size, limit } => (
                "BODY_TOO_LARGE",
                format!("Request body size {} exceeds limit {}", size, limit),
            ),
            ProxyError::Timeout => ("TIMEOUT", "Request timeout".to_string()),
        };

        let body_json = json!({
            "error": error_code,
            "message": message,
            "request_id": request_id,
        });

        let mut response = Response::new(Full::new(Bytes::from(body_json.to_string())));
        *response.status_mut() = self.status_code();
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_error_response_body() {
        let err = ProxyError::BodyTooLarge { size: 20, limit: 10 };
        let response = err.to_response(Some("req-1"));

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["error"], "BODY_TOO_LARGE");
        assert_eq!(payload["request_id"], "req-1");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ProxyError::Upstream("refused".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ProxyError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
