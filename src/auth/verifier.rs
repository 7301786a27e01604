// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the issuer's key set.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::{decode, decode_header, get_current_timestamp, Algorithm, DecodingKey, Validation};

use super::claims::VerifiedClaims;
use super::error::AuthError;
use super::jwks::KeySetCache;

/// Why a token was refused. Logged, never returned to clients.
#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error("token is empty")]
    Empty,
    #[error("token header is malformed")]
    Malformed,
    #[error("algorithm {0:?} is not allowed")]
    AlgorithmNotAllowed(Algorithm),
    #[error("issuer key set is unavailable")]
    KeySetUnavailable,
    #[error("no key in the issuer key set matches the token")]
    NoMatchingKey,
    #[error("signature does not verify")]
    Signature,
    #[error("claims rejected: {0}")]
    Claims(jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("token_use is {0:?}, expected access")]
    NotAccessToken(Option<String>),
}

impl From<Rejection> for AuthError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::NotAccessToken(_) => AuthError::InvalidTokenType,
            _ => AuthError::InvalidToken,
        }
    }
}

/// Verifies that a bearer token is an unexpired access token signed by the
/// trusted issuer with the allowed algorithm.
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    issuer: String,
    algorithm: Algorithm,
}

impl TokenVerifier {
    /// # Arguments
    /// - `keys`: key-set cache shared with the rest of the process
    /// - `issuer`: exact expected `iss` value (`https://<authority>/<pool-id>`)
    /// - `algorithm`: the single accepted signing algorithm
    pub fn new(keys: Arc<KeySetCache>, issuer: impl Into<String>, algorithm: Algorithm) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            algorithm,
        }
    }

    /// Expected `iss` claim.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Key-set cache used for signature checks.
    pub fn key_set_cache(&self) -> &KeySetCache {
        &self.keys
    }

    /// Verify `token` and return its claims unmodified.
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        self.check(token).await.map_err(|rejection| {
            tracing::debug!(reason = %rejection, "Bearer token rejected");
            AuthError::from(rejection)
        })
    }

    async fn check(&self, token: &str) -> Result<VerifiedClaims, Rejection> {
        if token.is_empty() {
            return Err(Rejection::Empty);
        }

        let header = decode_header(token).map_err(|_| Rejection::Malformed)?;
        if header.alg != self.algorithm {
            return Err(Rejection::AlgorithmNotAllowed(header.alg));
        }

        let kid = header.kid.as_deref();
        let mut keys = self
            .keys
            .get_or_fetch(&self.issuer)
            .await
            .map_err(|_| Rejection::KeySetUnavailable)?;

        if kid.is_some() && candidate_keys(&keys, kid).is_empty() {
            keys = self
                .keys
                .refetch_if_stale(&self.issuer)
                .await
                .map_err(|_| Rejection::KeySetUnavailable)?;
        }

        let validation = self.validation();
        let mut outcome = Rejection::NoMatchingKey;

        for jwk in candidate_keys(&keys, kid) {
            let Ok(key) = DecodingKey::from_jwk(jwk) else {
                continue;
            };

            match decode::<VerifiedClaims>(token, &key, &validation) {
                Ok(data) => return check_claims(data.claims),
                Err(e) if is_key_mismatch(e.kind()) => {
                    outcome = Rejection::Signature;
                }
                Err(e) => return Err(Rejection::Claims(e)),
            }
        }

        Err(outcome)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        // Access tokens carry `client_id`, not `aud`
        validation.validate_aud = false;
        validation.leeway = 0;
        validation
    }
}

/// Signing keys that may have produced a token with the given `kid`.
fn candidate_keys<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Vec<&'a Jwk> {
    keys.keys
        .iter()
        .filter(|jwk| !matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)))
        .filter(|jwk| match kid {
            Some(kid) => jwk.common.key_id.as_deref() == Some(kid),
            None => true,
        })
        .collect()
}

/// Errors that rule out one key but say nothing about the token's claims.
fn is_key_mismatch(kind: &ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidEddsaKey
    )
}

fn check_claims(claims: VerifiedClaims) -> Result<VerifiedClaims, Rejection> {
    if claims.exp <= get_current_timestamp() {
        return Err(Rejection::Expired);
    }
    if !claims.is_access_token() {
        return Err(Rejection::NotAccessToken(claims.token_use));
    }
    Ok(claims)
}
