// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Response returned to the caller once an event has been delivered.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

const DEFAULT_BODY: &str = r#"{"message":"Workflow was started"}"#;

/// Selected response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseCode {
    Code(u16),
    Custom(u16),
}

/// Response settings for successful deliveries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfig {
    #[serde(default)]
    pub response_code: Option<ResponseCode>,

    /// Literal body to answer with
    #[serde(default)]
    pub response_data: Option<String>,

    /// Answer with an empty body
    #[serde(default)]
    pub no_response_body: bool,
}

impl ResponseConfig {
    /// Custom code if set, else the selected code, else 200.
    ///
    /// Codes outside 100..=999 fall back to 200.
    pub fn resolve_code(&self) -> StatusCode {
        let code = match self.response_code {
            Some(ResponseCode::Custom(code)) | Some(ResponseCode::Code(code)) => code,
            None => 200,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::OK)
    }

    /// Explicit data if set, else nothing when the body is suppressed, else
    /// the default acknowledgement.
    pub fn resolve_body(&self) -> Option<&str> {
        match (&self.response_data, self.no_response_body) {
            (Some(data), _) if !data.is_empty() => Some(data.as_str()),
            (_, true) => None,
            _ => Some(DEFAULT_BODY),
        }
    }

    pub fn into_response_for_delivery(&self) -> Response {
        let status = self.resolve_code();
        match self.resolve_body() {
            Some(DEFAULT_BODY) => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                DEFAULT_BODY,
            )
                .into_response(),
            Some(body) => (status, body.to_string()).into_response(),
            None => status.into_response(),
        }
    }
}
