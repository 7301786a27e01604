// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Managed identity provider integration.
//!
//! The proxy never handles passwords or tokens beyond relaying them: every
//! credential check happens at the provider behind [`IdentityProvider`].

use std::collections::HashMap;

use async_trait::async_trait;

pub mod cognito;

pub use cognito::CognitoClient;

/// Provider error code for rejected credentials or refresh tokens.
pub const NOT_AUTHORIZED: &str = "NotAuthorizedException";

pub const SMS_MFA: &str = "SMS_MFA";
pub const SOFTWARE_TOKEN_MFA: &str = "SOFTWARE_TOKEN_MFA";

/// Tokens issued after a completed authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Intermediate state requiring another factor before tokens are issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthChallenge {
    pub name: String,
    pub session: Option<String>,
    pub parameters: HashMap<String, String>,
}

/// Result of an authentication call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(AuthTokens),
    Challenge(AuthChallenge),
    /// Neither tokens nor a challenge
    Unrecognized,
}

/// Second-factor answer for a pending challenge.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeAnswer<'a> {
    pub challenge_name: &'a str,
    pub session: &'a str,
    pub code: &'a str,
    pub username: &'a str,
}

impl ChallengeAnswer<'_> {
    /// Challenge responses in the provider's key format.
    ///
    /// The code is only sent for the MFA challenges the provider defines a
    /// code key for; other challenges get the username alone.
    pub fn responses(&self) -> HashMap<String, String> {
        let mut responses = HashMap::from([("USERNAME".to_string(), self.username.to_string())]);

        let code_key = match self.challenge_name {
            SMS_MFA => Some("SMS_MFA_CODE"),
            SOFTWARE_TOKEN_MFA => Some("SOFTWARE_TOKEN_MFA_CODE"),
            _ => None,
        };
        if let Some(key) = code_key {
            responses.insert(key.to_string(), self.code.to_string());
        }

        responses
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityProviderError {
    /// The provider answered with an error. Displays as the provider's own
    /// message so it can be relayed to the client.
    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("identity provider request failed: {0}")]
    Transport(String),

    #[error("identity provider response was invalid: {0}")]
    InvalidResponse(String),
}

impl IdentityProviderError {
    /// Whether the provider rejected the presented credentials.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, IdentityProviderError::Rejected { code, .. } if code == NOT_AUTHORIZED)
    }
}

/// Credential relay operations the proxy routes depend on.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Username/password sign-in.
    async fn initiate_password_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, IdentityProviderError>;

    /// Answer a pending challenge (MFA code).
    async fn respond_to_challenge(
        &self,
        answer: ChallengeAnswer<'_>,
    ) -> Result<AuthOutcome, IdentityProviderError>;

    /// Exchange a refresh token for new access and ID tokens.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthOutcome, IdentityProviderError>;

    /// Revoke a refresh token and the tokens issued from it.
    async fn revoke(&self, refresh_token: &str) -> Result<(), IdentityProviderError>;
}
