// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error responses for the REST router.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use wamcp_core::{ErrorKind, WaError};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A failed request, ready to be rendered.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    /// 400 with a fixed message. Used for presence checks.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: message.into(),
                details: None,
            },
        }
    }

    /// Map a service error to its status.
    ///
    /// Classified kinds answer `{error: <message>}`. Internal failures answer
    /// `{error: <operation>, details: <message>}` and are logged in full;
    /// `hide_details` drops the `details` field from the response.
    pub fn from_service(err: WaError, hide_details: bool) -> Self {
        let status = status_for(err.kind());
        if status != StatusCode::INTERNAL_SERVER_ERROR {
            return Self {
                status,
                body: ErrorResponse {
                    error: err.to_string(),
                    details: None,
                },
            };
        }

        tracing::error!(error = %err, source = ?std::error::Error::source(&err), "request failed");
        Self {
            status,
            body: ErrorResponse {
                error: err
                    .operation()
                    .unwrap_or("Internal server error")
                    .to_string(),
                details: (!hide_details).then(|| err.to_string()),
            },
        }
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotSupported => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
