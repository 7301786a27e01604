// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer access-token verification for the protected API.
//!
//! ## Auth Flow
//!
//! 1. The client signs in through `/auth/signin` and receives an access token
//! 2. The client sends `Authorization: Bearer <access token>`
//! 3. The server:
//!    - Resolves the issuer's JWKS through the [`KeySetCache`]
//!    - Verifies signature, issuer, algorithm and expiry
//!    - Requires `token_use == "access"`
//!    - Attaches [`VerifiedClaims`] to the request
//!
//! ## Security
//!
//! - Only the configured algorithm is accepted (no algorithm negotiation)
//! - The issuer must match exactly
//! - Clients only learn "missing header", "invalid token type" or
//!   "invalid or expired token"

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use claims::VerifiedClaims;
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::KeySetCache;
pub use middleware::require_access_token;
pub use verifier::TokenVerifier;
