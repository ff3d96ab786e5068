//! Request correlation for vote and results traffic.
//!
//! Each request runs inside a `request` span carrying a `trace_id`, so the
//! `vote recorded` and store failure events logged by the services can be
//! joined to the response the client saw. The same id is held in a
//! task-local for [`ErrorBody`](crate::inbound::http::error::ErrorBody) and
//! echoed in the `trace-id` response header.
//!
//! A client (or an upstream proxy) may supply its own `trace-id` header; a
//! well-formed UUID is adopted, anything else is replaced.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::task_local;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

/// Header used both to accept and to return the trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static TRACE_ID: TraceId;
}

/// Identifier correlating one request with its logs and error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Adopt a caller-supplied id, or mint a fresh one.
    fn from_request(req: &ServiceRequest) -> Self {
        req.headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// The id of the request being served, if any.
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` as the current id.
    ///
    /// Task-locals do not cross `tokio::spawn`; wrap spawned work in this.
    ///
    /// ```
    /// use election::middleware::trace::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let id: TraceId = "6f1c1f0e-8c1a-4c4e-9a39-3c1e2b8f4d10".parse().expect("uuid");
    /// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut: Future>(trace_id: Self, fut: Fut) -> Fut::Output {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Middleware opening the per-request span and trace id scope.
///
/// ```
/// use actix_web::App;
/// use election::Trace;
///
/// let _app = App::new().wrap(Trace);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = TraceId::from_request(&req);
        let span = info_span!(
            "request",
            trace_id = %trace_id,
            method = %req.method(),
            path = %req.path(),
        );
        let fut = self.service.call(req);

        Box::pin(
            TraceId::scope(trace_id, async move {
                let mut res = fut.await?;
                debug!(status = res.status().as_u16(), "request completed");
                // A hyphenated UUID is always a valid header value.
                if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Ok(res)
            })
            .instrument(span),
        )
    }
}
