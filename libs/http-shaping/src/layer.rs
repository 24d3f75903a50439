//! Tower integration: wraps any HTTP service with a shared [`ShapingFilter`].

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::{Request, Response};
use tower::{Layer, Service};

use crate::config::{ConfigError, ShapingConfig};
use crate::filter::ShapingFilter;

/// Every service produced by one layer shares the same window.
#[derive(Debug, Clone)]
pub struct ShapingLayer {
    filter: Arc<ShapingFilter>,
}

impl ShapingLayer {
    pub fn new(config: &ShapingConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_filter(Arc::new(ShapingFilter::new(config)?)))
    }

    pub fn from_filter(filter: Arc<ShapingFilter>) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &Arc<ShapingFilter> {
        &self.filter
    }
}

impl<S> Layer<S> for ShapingLayer {
    type Service = Shaping<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Shaping {
            inner,
            filter: Arc::clone(&self.filter),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shaping<S> {
    inner: S,
    filter: Arc<ShapingFilter>,
}

impl<S, B, RB> Service<Request<B>> for Shaping<S>
where
    S: Service<Request<B>, Response = Response<RB>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    B: Send + 'static,
    RB: From<&'static str> + Send + 'static,
{
    type Response = Response<RB>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // Keep the service that was driven to readiness and leave a fresh
        // clone behind for the next call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let filter = Arc::clone(&self.filter);

        Box::pin(async move { filter.handle(req, move |req| inner.call(req)).await })
    }
}
