use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, ShapingConfig, ShapingLimits};
use crate::decision::{self, Decision};
use crate::window::{Window, WindowSnapshot};

pub const REJECTION_BODY: &str = "Bandwidth limit reached";

/// Inline traffic-shaping gate in front of a downstream handler.
///
/// One window is shared by every request passing through the instance.
#[derive(Debug)]
pub struct ShapingFilter {
    limits: ShapingLimits,
    window: Mutex<Window>,
    clock: Arc<dyn Clock>,
}

impl ShapingFilter {
    pub fn new(config: &ShapingConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: &ShapingConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let limits = config.validate()?;

        info!(
            name = %limits.name,
            interval_secs = limits.interval_secs.get(),
            in_limit_bytes = limits.in_limit_bytes,
            out_limit_bytes = limits.out_limit_bytes,
            enforce = limits.enforce,
            "Initialized traffic shaping filter"
        );

        let window = Window::new(clock.now(), limits.interval_secs);

        Ok(Self {
            limits,
            window: Mutex::new(window),
            clock,
        })
    }

    pub fn limits(&self) -> &ShapingLimits {
        &self.limits
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.lock_window().snapshot()
    }

    /// Runs one request through the gate.
    ///
    /// `next` is only invoked when the request is admitted. Its response is
    /// returned untouched; a downstream error is returned as-is and records no
    /// outbound bytes.
    pub async fn handle<B, RB, E, F, Fut>(&self, req: Request<B>, next: F) -> Result<Response<RB>, E>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Result<Response<RB>, E>>,
        RB: From<&'static str>,
    {
        let declared_in = declared_length(req.headers());

        if !self.admit(declared_in).is_allowed() {
            warn!(
                name = %self.limits.name,
                method = %req.method(),
                path = %req.uri().path(),
                "Bandwidth limit reached, rejecting request"
            );
            return Ok(rejection());
        }

        let response = next(req).await?;

        if let Some(bytes) = declared_length(response.headers()) {
            self.record_outbound(bytes);
        }

        Ok(response)
    }

    /// Reset, inbound accounting and the admission check as one transaction.
    pub fn admit(&self, declared_in: Option<u64>) -> Decision {
        let mut window = self.lock_window();
        window.maybe_reset(self.clock.now());

        if let Some(bytes) = declared_in {
            window.record_in(bytes);
        }

        debug!(
            name = %self.limits.name,
            sum_in = window.sum_in(),
            in_limit = self.limits.in_limit_bytes,
            sum_out = window.sum_out(),
            out_limit = self.limits.out_limit_bytes,
            "Current window usage"
        );

        decision::evaluate(
            self.limits.enforce,
            window.sum_in(),
            window.sum_out(),
            self.limits.in_limit_bytes,
            self.limits.out_limit_bytes,
        )
    }

    pub fn record_outbound(&self, bytes: u64) {
        self.lock_window().record_out(bytes);
    }

    // Counters are plain integers; a panic elsewhere cannot leave them torn.
    fn lock_window(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reads `Content-Length` as a best-effort size hint.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn rejection<RB: From<&'static str>>() -> Response<RB> {
    let mut response = Response::new(RB::from(REJECTION_BODY));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
