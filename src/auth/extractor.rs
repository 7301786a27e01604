// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for verified access-token claims.
//!
//! Use the `Auth` extractor in handlers that need the caller's identity:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims is VerifiedClaims
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{middleware::bearer_token, AuthError, TokenVerifier, VerifiedClaims};

/// Extractor for the authenticated request context.
///
/// Behind [`require_access_token`](super::middleware::require_access_token)
/// it returns the claims the middleware attached. On a route without the
/// middleware it verifies the bearer token itself.
pub struct Auth(pub VerifiedClaims);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
    Arc<TokenVerifier>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // First check if middleware already verified the token
        if let Some(claims) = parts.extensions.get::<VerifiedClaims>().cloned() {
            return Ok(Auth(claims));
        }

        let token = bearer_token(&parts.headers)?;
        let verifier = Arc::<TokenVerifier>::from_ref(state);
        let claims = verifier.verify(token).await?;

        Ok(Auth(claims))
    }
}
