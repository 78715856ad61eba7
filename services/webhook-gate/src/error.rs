// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the webhook gate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures raised by host collaborators that must reach the caller unchanged.
///
/// These are never downgraded to a routing `Drop` or to an admission
/// rejection; the HTTP layer answers them with a bare 500.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Bot detection failed: {0}")]
    BotDetection(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        error!(error = %self, "Webhook processing failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Errors loading the event catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read event catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Event catalog is not a JSON array of options: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GateError>;
