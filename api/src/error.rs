//! Handler fault type.
//!
//! Route handlers return [`AppError`] for failures they cannot recover from.
//! The response the client sees is always a generic 500; the full detail
//! travels to the request instrumentor as a [`HandlerFault`] response
//! extension and is logged server-side only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::any::Any;
use std::backtrace::Backtrace;
use thiserror::Error;

/// Body returned to clients for every handler fault.
pub const GENERIC_ERROR_BODY: &str = "Internal server error";

/// Failure raised by a route handler.
#[derive(Debug, Error)]
pub enum AppError {
    /// A fault raised deliberately by a handler.
    #[error("{0}")]
    Fault(String),

    /// A handler panicked.
    #[error("Handler panicked: {0}")]
    Panic(String),

    /// Any other error propagated with `?`.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Creates a fault with the given message.
    #[must_use]
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }

    /// Creates a fault from a panic payload caught while unwinding.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panic(message)
    }
}

/// Server-side detail of a handler fault, attached to the 500 response.
#[derive(Debug, Clone)]
pub struct HandlerFault {
    /// Error message.
    pub message: String,
    /// Captured stack trace (empty unless `RUST_BACKTRACE` is enabled).
    pub stack: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let stack = match &self {
            Self::Internal(e) => format!("{e:?}"),
            Self::Fault(_) | Self::Panic(_) => Backtrace::capture().to_string(),
        };
        let fault = HandlerFault {
            message: self.to_string(),
            stack,
        };

        let mut response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": GENERIC_ERROR_BODY })),
        )
            .into_response();
        response.extensions_mut().insert(fault);
        response
    }
}

/// Converts a caught panic into the same generic 500 as any other fault.
///
/// Used as the `tower_http::catch_panic` handler.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    AppError::from_panic(payload.as_ref()).into_response()
}
