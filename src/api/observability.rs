//! Request tracing. The outer `TraceLayer` opens one span per request; the
//! route and caller identity are filled in further down the stack, once
//! routing and token resolution have happened.

use axum::{
    extract::{MatchedPath, Request},
    http,
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{Span, field};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span fields: `request_id`, `method`, `path`, and the empty `route`,
/// `identity` and `user_id` slots recorded later.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");

        tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            route = field::Empty,
            identity = field::Empty,
            user_id = field::Empty,
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFinished;

impl<B> OnResponse<B> for RequestFinished {
    fn on_response(self, response: &http::Response<B>, latency: Duration, _span: &Span) {
        let status = response.status().as_u16();
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

        if response.status().is_server_error() {
            tracing::warn!(status, latency_ms, "Request failed");
        } else {
            tracing::info!(status, latency_ms, "Request finished");
        }
    }
}

/// Route layer on the versioned router, where `MatchedPath` is known.
pub async fn record_route(request: Request, next: Next) -> Response {
    if let Some(route) = request.extensions().get::<MatchedPath>() {
        Span::current().record("route", route.as_str());
    }
    next.run(request).await
}

/// Called by the authenticate middleware with the resolved caller.
pub fn record_identity(user_id: Option<uuid::Uuid>) {
    let span = Span::current();
    match user_id {
        Some(id) => {
            span.record("identity", "authenticated");
            span.record("user_id", field::display(id));
        }
        None => {
            span.record("identity", "anonymous");
        }
    }
}
