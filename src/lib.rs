// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cognito Auth Proxy - Token relay and JWT-protected API
//!
//! This crate relays sign-in, MFA, refresh and sign-out calls to an Amazon
//! Cognito user pool, keeping the refresh token in an `HttpOnly` cookie, and
//! guards `/api` routes with locally verified access tokens.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Key-set cache, token verifier, middleware and extractor
//! - `identity` - Identity provider client (Cognito JSON API)
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod state;
pub mod telemetry;
