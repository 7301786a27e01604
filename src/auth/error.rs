// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Verification failures are deliberately coarse: clients can tell a missing
//! header from a token of the wrong type, and everything else (bad signature,
//! wrong issuer, expired, unreachable key set) reads the same.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or one that does not start with `Bearer `
    MissingAuthHeader,
    /// Cryptographically valid token whose `token_use` is not `access`
    InvalidTokenType,
    /// Any other verification failure
    InvalidToken,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

impl AuthError {
    /// Get the error code for this error (log field only, never sent to clients).
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidTokenType => "invalid_token_type",
            AuthError::InvalidToken => "invalid_token",
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "Missing or invalid Authorization header",
            AuthError::InvalidTokenType => "Invalid token type",
            AuthError::InvalidToken => "Invalid or expired token",
        }
    }

    /// All authentication failures are 401.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: self.message(),
        });
        (self.status_code(), body).into_response()
    }
}
