// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in, MFA, refresh and sign-out relay endpoints.
//!
//! Access and ID tokens are returned in the JSON body. The refresh token is
//! only ever placed in an `HttpOnly` cookie scoped to `/auth`, and only once
//! the provider has fully authenticated the user.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    identity::{
        AuthChallenge, AuthOutcome, AuthTokens, ChallengeAnswer, IdentityProviderError,
    },
    state::AppState,
};

pub const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/auth";
const REFRESH_COOKIE_MAX_AGE: time::Duration = time::Duration::days(30);

/// Request body for `POST /auth/signin`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for `POST /auth/signin/mfa`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MfaRequest {
    #[serde(default)]
    pub challenge_name: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Tokens returned to the client. The refresh token is never included.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// Pending second factor.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub challenge_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    pub challenge_parameters: HashMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl From<AuthChallenge> for ChallengeResponse {
    fn from(challenge: AuthChallenge) -> Self {
        Self {
            challenge_name: challenge.name,
            session: challenge.session,
            challenge_parameters: challenge.parameters,
        }
    }
}

/// Non-empty value of an optional request field.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn refresh_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH)
        .max_age(REFRESH_COOKIE_MAX_AGE)
        .build()
}

fn cleared_refresh_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path(REFRESH_COOKIE_PATH)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Token body plus, when one was issued, the refresh cookie.
fn issue_tokens(jar: CookieJar, secure: bool, tokens: AuthTokens) -> Response {
    let jar = match tokens.refresh_token {
        Some(refresh_token) => jar.add(refresh_cookie(refresh_token, secure)),
        None => jar,
    };

    let body = TokenResponse {
        access_token: tokens.access_token,
        id_token: tokens.id_token,
    };

    (jar, Json(body)).into_response()
}

/// Relay a provider error with its own message.
fn provider_error(
    status: StatusCode,
    error: &IdentityProviderError,
    fallback: &str,
) -> ApiError {
    warn!(error = %error, status = %status, "Identity provider call failed");

    let message = error.to_string();
    if message.is_empty() {
        ApiError::new(status, fallback)
    } else {
        ApiError::new(status, message)
    }
}

/// Sign in with email and password.
///
/// Returns tokens, or the challenge to answer through `/auth/signin/mfa`.
#[utoipa::path(
    post,
    path = "/auth/signin",
    tag = "Auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in (refresh cookie set) or MFA challenge", body = TokenResponse),
        (status = 400, description = "Missing fields or provider rejection"),
        (status = 401, description = "Bad credentials"),
        (status = 500, description = "Unexpected provider response"),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let (Some(email), Some(password)) = (present(&request.email), present(&request.password))
    else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let outcome = state
        .identity
        .initiate_password_auth(email, password)
        .await
        .map_err(|e| {
            let status = if e.is_not_authorized() {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_REQUEST
            };
            provider_error(status, &e, "Authentication failed")
        })?;

    match outcome {
        AuthOutcome::Challenge(challenge) => {
            Ok(Json(ChallengeResponse::from(challenge)).into_response())
        }
        AuthOutcome::Authenticated(tokens) => {
            Ok(issue_tokens(jar, state.config.secure_cookies, tokens))
        }
        AuthOutcome::Unrecognized => Err(ApiError::internal(
            "Unexpected response from identity provider",
        )),
    }
}

/// Complete sign-in by answering an MFA challenge.
#[utoipa::path(
    post,
    path = "/auth/signin/mfa",
    tag = "Auth",
    request_body = MfaRequest,
    responses(
        (status = 200, description = "Signed in (refresh cookie set)", body = TokenResponse),
        (status = 400, description = "Missing fields or provider rejection"),
        (status = 500, description = "No tokens issued"),
    )
)]
pub async fn sign_in_mfa(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<MfaRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let (Some(challenge_name), Some(session), Some(code), Some(username)) = (
        present(&request.challenge_name),
        present(&request.session),
        present(&request.code),
        present(&request.username),
    ) else {
        return Err(ApiError::bad_request(
            "challengeName, session, code, and username are required",
        ));
    };

    let answer = ChallengeAnswer {
        challenge_name,
        session,
        code,
        username,
    };

    let outcome = state
        .identity
        .respond_to_challenge(answer)
        .await
        .map_err(|e| provider_error(StatusCode::BAD_REQUEST, &e, "MFA verification failed"))?;

    match outcome {
        AuthOutcome::Authenticated(tokens) => {
            Ok(issue_tokens(jar, state.config.secure_cookies, tokens))
        }
        _ => Err(ApiError::internal("MFA verification failed")),
    }
}

/// Exchange the refresh cookie for new access and ID tokens.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "New tokens", body = TokenResponse),
        (status = 401, description = "No refresh cookie or provider rejection"),
        (status = 500, description = "No tokens issued"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some(refresh_token) = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
    else {
        return Err(ApiError::unauthorized("No refresh token"));
    };

    let outcome = state
        .identity
        .refresh(&refresh_token)
        .await
        .map_err(|e| provider_error(StatusCode::UNAUTHORIZED, &e, "Token refresh failed"))?;

    match outcome {
        AuthOutcome::Authenticated(tokens) => {
            Ok(issue_tokens(jar, state.config.secure_cookies, tokens))
        }
        _ => Err(ApiError::internal("Token refresh failed")),
    }
}

/// Revoke the refresh token (best effort) and clear the cookie.
#[utoipa::path(
    post,
    path = "/auth/signout",
    tag = "Auth",
    responses(
        (status = 200, description = "Signed out, refresh cookie cleared", body = MessageResponse),
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    if let Some(refresh_token) = refresh_token {
        if let Err(e) = state.identity.revoke(&refresh_token).await {
            warn!(error = %e, "Failed to revoke refresh token");
        }
    }

    (
        jar.add(cleared_refresh_cookie(state.config.secure_cookies)),
        Json(MessageResponse {
            message: "Signed out".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_cookie_attributes() {
        let rendered = refresh_cookie("abc".to_string(), false).to_string();

        assert!(rendered.starts_with("refresh_token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/auth"));
        assert!(rendered.contains("Max-Age=2592000"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn refresh_cookie_is_secure_in_production() {
        let rendered = refresh_cookie("abc".to_string(), true).to_string();
        assert!(rendered.contains("Secure"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let rendered = cleared_refresh_cookie(false).to_string();

        assert!(rendered.starts_with("refresh_token=;"));
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("Path=/auth"));
    }

    #[test]
    fn empty_fields_are_not_present() {
        assert_eq!(present(&Some(String::new())), None);
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some("x".to_string())), Some("x"));
    }

    #[test]
    fn challenge_response_uses_camel_case() {
        let response = ChallengeResponse::from(AuthChallenge {
            name: "SMS_MFA".to_string(),
            session: Some("session-abc".to_string()),
            parameters: HashMap::new(),
        });

        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["challengeName"], "SMS_MFA");
        assert_eq!(json["session"], "session-abc");
        assert!(json["challengeParameters"].is_object());
    }
}
