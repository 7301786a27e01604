// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied as a `route_layer` over the protected router:
//!
//! ```rust,ignore
//! let api = Router::new()
//!     .route("/me", get(users::me))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         verifier.clone(),
//!         require_access_token,
//!     ));
//! ```
//!
//! A request either reaches the inner handler with [`VerifiedClaims`] in its
//! extensions, or is answered with 401 here. Claims are never attached to a
//! request that is rejected.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, TokenVerifier};

/// Literal scheme prefix, case-sensitive with a single space.
const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer token from the `Authorization` header.
///
/// A value that is not visible ASCII counts as a missing header. An empty
/// token after the prefix is returned as is and fails verification.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingAuthHeader)
}

/// Authentication middleware function.
pub async fn require_access_token(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!(error_code = e.error_code(), "Request rejected");
            return e.into_response();
        }
    };

    match verifier.verify(token).await {
        Ok(claims) => {
            tracing::debug!(sub = %claims.sub, "Request authenticated");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error_code = e.error_code(), "Request rejected");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{
        access_claims, issuer, jwks_server, sign, sign_access_token, JWKS, KID, SIGNING_KEY,
    };
    use crate::auth::{KeySetCache, VerifiedClaims};
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderValue, Request, StatusCode},
        routing::get,
        Extension, Json, Router,
    };
    use jsonwebtoken::Algorithm;
    use tower::ServiceExt;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization.parse().unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert_eq!(bearer_token(&headers("Basic abc123")), Err(AuthError::MissingAuthHeader));
    }

    #[test]
    fn scheme_is_case_sensitive() {
        assert_eq!(bearer_token(&headers("bearer abc")), Err(AuthError::MissingAuthHeader));
        assert_eq!(bearer_token(&headers("Bearer")), Err(AuthError::MissingAuthHeader));
    }

    fn protected_app(issuer: &str) -> Router {
        let verifier = Arc::new(TokenVerifier::new(
            Arc::new(KeySetCache::new()),
            issuer,
            Algorithm::RS256,
        ));

        Router::new()
            .route(
                "/protected",
                get(|Extension(claims): Extension<VerifiedClaims>| async move {
                    Json(claims.sub)
                }),
            )
            .route_layer(axum::middleware::from_fn_with_state(
                verifier,
                require_access_token,
            ))
    }

    async fn call(app: Router, authorization: Option<String>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        send(app, request.body(Body::empty()).unwrap()).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_claims() {
        let server = jwks_server(JWKS).await;
        let issuer = issuer(&server);

        let (status, body) = call(
            protected_app(&issuer),
            Some(format!("Bearer {}", sign_access_token(&issuer))),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-123");
    }

    #[tokio::test]
    async fn missing_header_never_reaches_handler() {
        let (status, body) = call(protected_app("https://issuer.invalid/pool"), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing or invalid Authorization header");
    }

    #[tokio::test]
    async fn id_token_gets_type_error() {
        let server = jwks_server(JWKS).await;
        let issuer = issuer(&server);
        let mut claims = access_claims(&issuer);
        claims["token_use"] = "id".into();
        let token = sign(&claims, SIGNING_KEY, Some(KID));

        let (status, body) = call(protected_app(&issuer), Some(format!("Bearer {token}"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token type");
    }

    #[tokio::test]
    async fn invalid_token_gets_generic_error() {
        let server = jwks_server(JWKS).await;

        let (status, body) = call(
            protected_app(&issuer(&server)),
            Some("Bearer invalid-token".to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn empty_bearer_token_gets_generic_error() {
        let server = jwks_server(JWKS).await;

        let (status, body) =
            call(protected_app(&issuer(&server)), Some("Bearer ".to_string())).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn non_ascii_header_is_treated_as_missing() {
        let server = jwks_server(JWKS).await;
        let request = Request::builder()
            .uri("/protected")
            .header(
                AUTHORIZATION,
                HeaderValue::from_bytes(b"Bearer \xe2\x9c\x93token").unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(protected_app(&issuer(&server)), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing or invalid Authorization header");
    }
}
