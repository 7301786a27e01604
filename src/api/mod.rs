// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth::require_access_token, state::AppState};

pub mod auth;
pub mod health;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router.
///
/// Fails only when the configured frontend URL cannot be used as a CORS
/// origin header.
pub fn router(state: AppState) -> Result<Router, InvalidHeaderValue> {
    let origin = state
        .config
        .frontend_url
        .trim_end_matches('/')
        .parse::<HeaderValue>()?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let auth_routes = Router::new()
        .route("/signin", post(auth::sign_in))
        .route("/signin/mfa", post(auth::sign_in_mfa))
        .route("/refresh", post(auth::refresh))
        .route("/signout", post(auth::sign_out));

    // Every /api route sits behind the access-token check.
    let api_routes = Router::new()
        .route("/me", get(users::me))
        .route_layer(from_fn_with_state(
            state.verifier.clone(),
            require_access_token,
        ));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Ok(Router::new()
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(cors),
        ))
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_in,
        auth::sign_in_mfa,
        auth::refresh,
        auth::sign_out,
        users::me,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            auth::SignInRequest,
            auth::MfaRequest,
            auth::TokenResponse,
            auth::ChallengeResponse,
            auth::MessageResponse,
            users::MeResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Sign-in, MFA, refresh and sign-out relay"),
        (name = "Users", description = "Current user"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
