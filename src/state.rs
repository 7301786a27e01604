// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    auth::{KeySetCache, TokenVerifier},
    config::Config,
    identity::{CognitoClient, IdentityProvider, IdentityProviderError},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: Arc<TokenVerifier>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Wire the Cognito client and token verifier described by `config`.
    pub fn from_config(config: Config) -> Result<Self, IdentityProviderError> {
        let identity = CognitoClient::new(&config.identity_endpoint, &config.client_id)?;
        let keys = KeySetCache::new().with_cache_ttl(config.jwks_cache_ttl);
        let verifier = TokenVerifier::new(Arc::new(keys), config.issuer(), config.algorithm);

        Ok(Self::new(config, verifier, Arc::new(identity)))
    }

    pub fn new(
        config: Config,
        verifier: TokenVerifier,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            identity,
        }
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}
