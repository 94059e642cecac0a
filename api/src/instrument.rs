//! Request instrumentation middleware.
//!
//! Every request is timed from the moment it enters the router until its
//! response is produced. On completion the instrumentor counts the request
//! under `{method, route, status}`, observes its latency under
//! `{method, route}`, emits an info record describing it, and
//! for handler faults additionally counts a `server_error` and logs the full
//! fault detail.

use crate::error::HandlerFault;
use crate::state::AppState;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use shared::fields;
use shared::telemetry::{ERRORS_TOTAL, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};
use std::net::SocketAddr;
use std::time::Instant;

/// One in-flight request.
#[derive(Debug, Clone)]
pub struct RequestSpan {
    /// HTTP method.
    pub method: String,
    /// Route template (e.g. `/api/users`), or the raw path for unmatched routes.
    pub route: String,
    /// Request URI as received, including the query string.
    pub url: String,
    /// `User-Agent` header, if any.
    pub user_agent: Option<String>,
    /// Peer address, or the first `X-Forwarded-For` hop.
    pub client_address: Option<String>,
    /// When the request entered the instrumentor.
    pub started: Instant,
}

impl RequestSpan {
    /// Captures the span for a request that is about to be handled.
    #[must_use]
    pub fn start(request: &Request) -> Self {
        let route = request.extensions().get::<MatchedPath>().map_or_else(
            || request.uri().path().to_string(),
            |matched| matched.as_str().to_string(),
        );
        let client_address = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .or_else(|| forwarded_for(request.headers()));

        Self {
            method: request.method().to_string(),
            route,
            url: request.uri().to_string(),
            user_agent: request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            client_address,
            started: Instant::now(),
        }
    }

    /// Records the finished request: counters first, then log records.
    pub fn complete(self, state: &AppState, status: StatusCode, fault: Option<&HandlerFault>) {
        let elapsed = self.started.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let status_code = status.as_u16();
        let registry = state.registry();
        let logger = state.logger();

        if let Some(fault) = fault {
            if let Err(e) = registry.increment(ERRORS_TOTAL, &["server_error"]) {
                tracing::error!(error = %e, "Failed to count server error");
            }
            logger.error(
                "Unhandled error",
                fields! {
                    "error" => &fault.message,
                    "stack" => &fault.stack,
                    "url" => &self.url,
                    "method" => &self.method,
                    "status" => status_code,
                },
            );
        }

        let status_label = status_code.to_string();
        if let Err(e) = registry.increment(
            HTTP_REQUESTS_TOTAL,
            &[self.method.as_str(), self.route.as_str(), status_label.as_str()],
        ) {
            tracing::error!(error = %e, "Failed to count request");
        }
        if let Err(e) = registry.observe(
            HTTP_REQUEST_DURATION_SECONDS,
            &[self.method.as_str(), self.route.as_str()],
            elapsed.as_secs_f64(),
        ) {
            tracing::error!(error = %e, "Failed to observe request latency");
        }

        logger.info(
            "HTTP Request",
            fields! {
                "method" => &self.method,
                "url" => &self.url,
                "status" => status_code,
                "duration" => duration_ms,
                "userAgent" => &self.user_agent,
                "clientAddress" => &self.client_address,
            },
        );
    }
}

/// Axum middleware wrapping every route.
///
/// The handler's response is passed through untouched apart from the
/// removal of any [`HandlerFault`] extension.
pub async fn instrument(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let span = RequestSpan::start(&request);
    let mut response = next.run(request).await;

    let fault = response.extensions_mut().remove::<HandlerFault>();
    span.complete(&state, response.status(), fault.as_ref());

    response
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use shared::models::LogLevel;

    #[test]
    fn test_span_falls_back_to_raw_path() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/unknown/42?x=1")
            .header(header::USER_AGENT, "curl/8.0")
            .header("x-forwarded-for", "10.0.0.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        let span = RequestSpan::start(&request);

        assert_eq!(span.method, "POST");
        assert_eq!(span.route, "/unknown/42");
        assert_eq!(span.url, "/unknown/42?x=1");
        assert_eq!(span.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(span.client_address.as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn test_span_prefers_connect_info() {
        let mut request = HttpRequest::builder()
            .uri("/")
            .header("x-forwarded-for", "10.0.0.7")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 2], 5000))));

        let span = RequestSpan::start(&request);

        assert_eq!(span.client_address.as_deref(), Some("192.168.1.2"));
    }

    #[test]
    fn test_complete_counts_and_logs() {
        let state = AppState::in_memory(10);
        let request = HttpRequest::builder()
            .uri("/api/users")
            .body(Body::empty())
            .unwrap();

        RequestSpan::start(&request).complete(&state, StatusCode::OK, None);

        assert_eq!(
            state
                .registry()
                .get(HTTP_REQUESTS_TOTAL, &["GET", "/api/users", "200"])
                .unwrap(),
            1
        );
        assert_eq!(
            state
                .registry()
                .observation_count(HTTP_REQUEST_DURATION_SECONDS, &["GET", "/api/users"])
                .unwrap(),
            1
        );
        let records = state.recent_logs().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "HTTP Request");
        assert_eq!(records[0].fields["status"], 200);
        assert_eq!(records[0].fields["method"], "GET");
        assert!(records[0].fields["duration"].is_u64());
        assert!(records[0].fields["userAgent"].is_null());
    }

    #[test]
    fn test_complete_with_fault_logs_error_first() {
        let state = AppState::in_memory(10);
        let request = HttpRequest::builder()
            .uri("/api/error")
            .body(Body::empty())
            .unwrap();
        let fault = HandlerFault {
            message: "boom".to_string(),
            stack: "frame 0".to_string(),
        };

        RequestSpan::start(&request).complete(
            &state,
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(&fault),
        );

        assert_eq!(
            state.registry().get(ERRORS_TOTAL, &["server_error"]).unwrap(),
            1
        );
        let records = state.recent_logs().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Error);
        assert_eq!(records[0].fields["error"], "boom");
        assert_eq!(records[0].fields["stack"], "frame 0");
        assert_eq!(records[0].fields["status"], 500);
        assert_eq!(records[1].level, LogLevel::Info);
        assert_eq!(records[1].fields["status"], 500);
    }
}
