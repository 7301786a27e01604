// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, VerifiedClaims};

/// Identity of the caller, taken from the verified access token.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl From<VerifiedClaims> for MeResponse {
    fn from(claims: VerifiedClaims) -> Self {
        Self {
            sub: claims.sub,
            username: claims.username,
            token_use: claims.token_use,
            scope: claims.scope,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing, invalid or non-access token"),
    ),
    security(("bearer" = []))
)]
pub async fn me(Auth(claims): Auth) -> Json<MeResponse> {
    Json(MeResponse::from(claims))
}
