// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request},
    response::Response,
    Router,
};
use cognito_auth_proxy::{
    api::router,
    auth::{KeySetCache, TokenVerifier},
    config::Config,
    identity::{
        AuthChallenge, AuthOutcome, AuthTokens, ChallengeAnswer, IdentityProvider,
        IdentityProviderError,
    },
    state::AppState,
};
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const SIGNING_KEY: &[u8] = include_bytes!("../fixtures/signing_key.pem");
pub const JWKS: &str = include_str!("../fixtures/jwks.json");
pub const KID: &str = "test-key-1";
pub const POOL_PATH: &str = "/us-east-1_pool";

/// Identity provider double returning one fixed outcome and recording calls.
pub struct StubIdentity {
    outcome: AuthOutcome,
    rejection: Option<(String, String)>,
    calls: Mutex<Vec<String>>,
}

impl StubIdentity {
    pub fn returning(outcome: AuthOutcome) -> Self {
        Self {
            outcome,
            rejection: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(code: &str, message: &str) -> Self {
        Self {
            outcome: AuthOutcome::Unrecognized,
            rejection: Some((code.to_string(), message.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Full token set, as issued after a completed sign-in.
    pub fn signed_in() -> Self {
        Self::returning(AuthOutcome::Authenticated(AuthTokens {
            access_token: Some("access-token-123".to_string()),
            id_token: Some("id-token-123".to_string()),
            refresh_token: Some("refresh-token-123".to_string()),
        }))
    }

    pub fn sms_challenge() -> Self {
        Self::returning(AuthOutcome::Challenge(AuthChallenge {
            name: "SMS_MFA".to_string(),
            session: Some("session-abc".to_string()),
            parameters: [(
                "CODE_DELIVERY_DESTINATION".to_string(),
                "+*******1234".to_string(),
            )]
            .into_iter()
            .collect(),
        }))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<AuthOutcome, IdentityProviderError> {
        self.calls.lock().unwrap().push(call);
        match &self.rejection {
            Some((code, message)) => Err(IdentityProviderError::Rejected {
                code: code.clone(),
                message: message.clone(),
            }),
            None => Ok(self.outcome.clone()),
        }
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn initiate_password_auth(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, IdentityProviderError> {
        self.record(format!("initiate:{username}:{password}"))
    }

    async fn respond_to_challenge(
        &self,
        answer: ChallengeAnswer<'_>,
    ) -> Result<AuthOutcome, IdentityProviderError> {
        self.record(format!(
            "respond:{}:{}:{}:{}",
            answer.challenge_name, answer.session, answer.code, answer.username
        ))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthOutcome, IdentityProviderError> {
        self.record(format!("refresh:{refresh_token}"))
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), IdentityProviderError> {
        self.record(format!("revoke:{refresh_token}")).map(|_| ())
    }
}

fn config() -> Config {
    Config::from_lookup(|name| match name {
        "COGNITO_USER_POOL_ID" => Some("us-east-1_pool".to_string()),
        "COGNITO_CLIENT_ID" => Some("client-abc".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Router wired to `identity`, verifying tokens issued by `issuer`.
pub fn app(identity: Arc<StubIdentity>, issuer: &str) -> Router {
    let verifier = TokenVerifier::new(Arc::new(KeySetCache::new()), issuer, Algorithm::RS256);
    router(AppState::new(config(), verifier, identity)).unwrap()
}

/// Router whose token checks point at an unreachable issuer.
pub fn auth_app(identity: Arc<StubIdentity>) -> Router {
    app(identity, "http://127.0.0.1:9/us-east-1_pool")
}

/// Mock pool serving `JWKS`, expecting exactly `fetches` key-set requests.
pub async fn jwks_server(fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POOL_PATH}/.well-known/jwks.json")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
        .expect(fetches)
        .mount(&server)
        .await;
    server
}

pub fn issuer(server: &MockServer) -> String {
    format!("{}{POOL_PATH}", server.uri())
}

pub fn token(issuer: &str, token_use: &str, exp_offset: i64) -> String {
    let now = get_current_timestamp();
    let claims = json!({
        "sub": "user-123",
        "username": "test@example.com",
        "token_use": token_use,
        "scope": "openid profile",
        "client_id": "client-abc",
        "iss": issuer,
        "iat": now,
        "exp": now.saturating_add_signed(exp_offset),
    });

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY).unwrap();
    encode(&header, &claims, &key).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
