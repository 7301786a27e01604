// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Amazon Cognito user pool client.
//!
//! Talks to the Cognito Identity Provider JSON API directly: each action is a
//! POST of an `application/x-amz-json-1.1` body with an `X-Amz-Target`
//! header. The actions used here are public-client operations and need no
//! request signing.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use super::{
    AuthChallenge, AuthOutcome, AuthTokens, ChallengeAnswer, IdentityProvider,
    IdentityProviderError,
};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const AMZ_TARGET: &str = "x-amz-target";
const AMZN_ERROR_TYPE: &str = "x-amzn-errortype";

#[derive(Debug, Clone)]
pub struct CognitoClient {
    endpoint: String,
    client_id: String,
    http: Client,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    challenge_parameters: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

impl CognitoClient {
    /// # Arguments
    /// - `endpoint`: API base URL, normally [`CognitoClient::regional_endpoint`]
    /// - `client_id`: user pool app client id
    pub fn new(
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Result<Self, IdentityProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                IdentityProviderError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            http,
        })
    }

    /// Public Cognito endpoint for `region`.
    pub fn regional_endpoint(region: &str) -> String {
        format!("https://cognito-idp.{region}.amazonaws.com/")
    }

    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        payload: &Value,
    ) -> Result<T, IdentityProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(AMZ_TARGET, format!("{TARGET_PREFIX}.{action}"))
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| IdentityProviderError::Transport(format!("{action} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let header_code = response
                .headers()
                .get(AMZN_ERROR_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            let error = parse_error(header_code.as_deref(), &body)
                .unwrap_or_else(|| {
                    IdentityProviderError::InvalidResponse(format!("{action} returned {status}"))
                });

            tracing::info!(action, status = %status, error = %error, "Cognito rejected request");
            return Err(error);
        }

        response.json::<T>().await.map_err(|e| {
            IdentityProviderError::InvalidResponse(format!("{action} response: {e}"))
        })
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn initiate_password_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, IdentityProviderError> {
        let payload = json!({
            "ClientId": self.client_id,
            "AuthFlow": "USER_PASSWORD_AUTH",
            "AuthParameters": {
                "USERNAME": username,
                "PASSWORD": password
            }
        });

        let response: AuthResponse = self.call("InitiateAuth", &payload).await?;
        Ok(response.into_outcome())
    }

    async fn respond_to_challenge(
        &self,
        answer: ChallengeAnswer<'_>,
    ) -> Result<AuthOutcome, IdentityProviderError> {
        let payload = json!({
            "ClientId": self.client_id,
            "ChallengeName": answer.challenge_name,
            "ChallengeResponses": answer.responses(),
            "Session": answer.session
        });

        let response: AuthResponse = self.call("RespondToAuthChallenge", &payload).await?;
        Ok(response.into_outcome())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthOutcome, IdentityProviderError> {
        let payload = json!({
            "ClientId": self.client_id,
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": {
                "REFRESH_TOKEN": refresh_token
            }
        });

        let response: AuthResponse = self.call("InitiateAuth", &payload).await?;
        Ok(response.into_outcome())
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), IdentityProviderError> {
        let payload = json!({
            "ClientId": self.client_id,
            "Token": refresh_token
        });

        self.call::<Value>("RevokeToken", &payload).await?;
        Ok(())
    }
}

impl AuthResponse {
    fn into_outcome(self) -> AuthOutcome {
        if let Some(name) = self.challenge_name {
            return AuthOutcome::Challenge(AuthChallenge {
                name,
                session: self.session,
                parameters: self.challenge_parameters,
            });
        }

        match self.authentication_result {
            Some(result) => AuthOutcome::Authenticated(AuthTokens {
                access_token: result.access_token,
                id_token: result.id_token,
                refresh_token: result.refresh_token,
            }),
            None => AuthOutcome::Unrecognized,
        }
    }
}

/// Build a `Rejected` error from the error type header and JSON body.
fn parse_error(header_code: Option<&str>, body: &str) -> Option<IdentityProviderError> {
    let parsed: Option<ErrorResponse> = serde_json::from_str(body).ok();
    let (body_code, message) = match parsed {
        Some(error) => (error.error_type, error.message),
        None => (None, None),
    };

    let code = header_code.or(body_code.as_deref()).map(normalize_error_code)?;

    Some(IdentityProviderError::Rejected {
        code,
        message: message.unwrap_or_default(),
    })
}

/// Strip the namespace (`...#Code`) and trailing metadata (`Code:...`).
fn normalize_error_code(raw: &str) -> String {
    let code = raw.rsplit('#').next().unwrap_or(raw);
    code.split(':').next().unwrap_or(code).to_string()
}
