// ABOUTME: HTTP basic authentication middleware for the scamper server.
// ABOUTME: Checks the Authorization header on every route except /health.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

const REALM_CHALLENGE: &str = "Basic realm=\"scamper\"";

/// A tower Layer that applies basic authentication.
#[derive(Clone)]
pub struct BasicAuthLayer {
    expected: Arc<Vec<u8>>,
}

impl BasicAuthLayer {
    /// Create a new BasicAuthLayer accepting exactly this username and password.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            expected: Arc::new(format!("{}:{}", username, password).into_bytes()),
        }
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuthMiddleware {
            inner,
            expected: Arc::clone(&self.expected),
        }
    }
}

/// The middleware service that checks basic credentials.
#[derive(Clone)]
pub struct BasicAuthMiddleware<S> {
    inner: S,
    expected: Arc<Vec<u8>>,
}

impl<S> BasicAuthMiddleware<S> {
    fn authorized(&self, req: &Request<Body>) -> bool {
        let Some(encoded) = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Basic "))
        else {
            return false;
        };

        match STANDARD.decode(encoded.trim()) {
            Ok(decoded) => constant_time_eq(&decoded, &self.expected),
            Err(_) => false,
        }
    }
}

impl<S> Service<Request<Body>> for BasicAuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Health checks stay open for load balancers.
        if req.uri().path() == "/health" || self.authorized(&req) {
            let mut inner = self.inner.clone();
            return Box::pin(async move { inner.call(req).await });
        }

        tracing::debug!(path = %req.uri().path(), "rejected request without valid credentials");
        Box::pin(async move { Ok(unauthorized()) })
    }
}

fn unauthorized() -> Response<Body> {
    let mut resp = Response::new(Body::from(r#"{"error":"unauthorized"}"#));
    *resp.status_mut() = StatusCode::UNAUTHORIZED;
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static(REALM_CHALLENGE),
    );
    resp
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}
