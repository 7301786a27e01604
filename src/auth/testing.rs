// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token and JWKS fixtures shared by the auth unit tests.

use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Private half of `test-key-1` in `jwks.json`.
pub const SIGNING_KEY: &[u8] = include_bytes!("../../tests/fixtures/signing_key.pem");
/// Private half of `test-key-2`, only published in `rotated_jwks.json`.
pub const FOREIGN_KEY: &[u8] = include_bytes!("../../tests/fixtures/foreign_key.pem");
pub const JWKS: &str = include_str!("../../tests/fixtures/jwks.json");
pub const ROTATED_JWKS: &str = include_str!("../../tests/fixtures/rotated_jwks.json");

pub const POOL_PATH: &str = "/us-east-1_pool";
pub const KID: &str = "test-key-1";

/// Serve `body` as the pool's JWKS.
pub async fn jwks_server(body: &'static str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{POOL_PATH}/.well-known/jwks.json")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;
    server
}

pub fn issuer(server: &MockServer) -> String {
    format!("{}{POOL_PATH}", server.uri())
}

/// Claims of a Cognito access token valid for the next hour.
pub fn access_claims(issuer: &str) -> Value {
    json!({
        "sub": "user-123",
        "username": "test@example.com",
        "token_use": "access",
        "scope": "openid profile",
        "client_id": "client-abc",
        "iss": issuer,
        "iat": get_current_timestamp(),
        "exp": get_current_timestamp() + 3600,
    })
}

pub fn sign(claims: &Value, key_pem: &[u8], kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(key_pem).unwrap();
    encode(&header, claims, &key).unwrap()
}

pub fn sign_access_token(issuer: &str) -> String {
    sign(&access_claims(issuer), SIGNING_KEY, Some(KID))
}
