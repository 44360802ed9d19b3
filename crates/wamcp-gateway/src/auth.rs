// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token middleware for the REST router.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ErrorResponse;

type HmacSha256 = Hmac<Sha256>;

const TAG_KEY: &[u8] = b"wamcp-api-key";

/// Expected bearer token, held as a MAC tag so presented tokens are
/// compared in constant time.
#[derive(Clone)]
pub struct AuthConfig {
    expected_tag: Vec<u8>,
}

impl AuthConfig {
    pub fn bearer(token: &str) -> Self {
        Self {
            expected_tag: tag(token.as_bytes()).unwrap_or_default(),
        }
    }

    /// Whether `presented` matches the configured token.
    pub fn verify(&self, presented: &str) -> bool {
        if self.expected_tag.is_empty() {
            return false;
        }
        match HmacSha256::new_from_slice(TAG_KEY) {
            Ok(mut mac) => {
                mac.update(presented.as_bytes());
                mac.verify_slice(&self.expected_tag).is_ok()
            }
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &"[redacted]")
            .finish()
    }
}

fn tag(data: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(TAG_KEY).ok()?;
    mac.update(data);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Reject any request that does not carry `Authorization: Bearer <key>`.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if auth.verify(token) => next.run(request).await,
        _ => {
            tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Unauthorized".to_string(),
                    details: None,
                }),
            )
                .into_response()
        }
    }
}
