// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified access-token claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `token_use` value carried by Cognito access tokens.
pub const ACCESS_TOKEN_USE: &str = "access";

/// Decoded payload of a token that passed signature, issuer, algorithm and
/// expiry checks.
///
/// The named fields are the ones handlers read; every other claim is kept
/// verbatim in `extra` so the claim set is passed through unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedClaims {
    /// Subject (Cognito user id)
    pub sub: String,

    /// Username (access tokens only; ID tokens use `cognito:username`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// `access` or `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,

    /// Space separated OAuth scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// App client the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Issuer URL
    pub iss: String,

    /// Expiration (Unix seconds)
    pub exp: u64,

    /// Remaining claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiedClaims {
    /// Whether the token declares itself an access token.
    pub fn is_access_token(&self) -> bool {
        self.token_use.as_deref() == Some(ACCESS_TOKEN_USE)
    }
}
