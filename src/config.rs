// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! typed [`Config`] loaded from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `AWS_REGION` | Cognito region | `us-east-1` |
//! | `COGNITO_USER_POOL_ID` | User pool id (issuer path) | Required |
//! | `COGNITO_CLIENT_ID` | App client id | Required |
//! | `COGNITO_ISSUER_AUTHORITY` | Issuer host | `cognito-idp.<region>.amazonaws.com` |
//! | `COGNITO_ENDPOINT` | Cognito API base URL | `https://cognito-idp.<region>.amazonaws.com/` |
//! | `JWT_ALGORITHM` | Only accepted signing algorithm | `RS256` |
//! | `JWKS_CACHE_TTL_SECS` | Key-set cache TTL, `0` keeps keys until restart | `3600` |
//! | `FRONTEND_URL` | CORS origin allowed to send credentials | `http://localhost:5173` |
//! | `APP_ENV` | `production` marks the refresh cookie `Secure` | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Missing identifiers are an error rather than a placeholder: a proxy pointed
//! at the wrong pool would verify nothing useful.

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::identity::CognitoClient;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const REGION_ENV: &str = "AWS_REGION";
pub const USER_POOL_ID_ENV: &str = "COGNITO_USER_POOL_ID";
pub const CLIENT_ID_ENV: &str = "COGNITO_CLIENT_ID";
pub const ISSUER_AUTHORITY_ENV: &str = "COGNITO_ISSUER_AUTHORITY";
pub const ENDPOINT_ENV: &str = "COGNITO_ENDPOINT";
pub const ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const PRODUCTION: &str = "production";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; anything but `json` is pretty.
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Host part of the issuer URL
    pub issuer_authority: String,
    /// Base URL of the Cognito API
    pub identity_endpoint: String,
    pub algorithm: Algorithm,
    /// `None` keeps key sets for the process lifetime
    pub jwks_cache_ttl: Option<Duration>,
    pub frontend_url: String,
    /// Mark the refresh cookie `Secure`
    pub secure_cookies: bool,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let region = var(REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string());

        let port = match var(PORT_ENV) {
            Some(value) => value.parse::<u16>().map_err(|e| {
                ConfigError::Invalid {
                    name: PORT_ENV,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        let algorithm = match var(ALGORITHM_ENV) {
            Some(value) => parse_algorithm(&value)?,
            None => DEFAULT_ALGORITHM,
        };

        let jwks_cache_ttl = match var(JWKS_CACHE_TTL_ENV) {
            Some(value) => {
                let secs = value.parse::<u64>().map_err(|e| {
                    ConfigError::Invalid {
                        name: JWKS_CACHE_TTL_ENV,
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS)),
        };

        let identity_endpoint = var(ENDPOINT_ENV)
            .unwrap_or_else(|| CognitoClient::regional_endpoint(&region));
        validate_url(ENDPOINT_ENV, &identity_endpoint)?;

        let frontend_url = var(FRONTEND_URL_ENV).unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());
        validate_url(FRONTEND_URL_ENV, &frontend_url)?;

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            user_pool_id: required(USER_POOL_ID_ENV)?,
            client_id: required(CLIENT_ID_ENV)?,
            issuer_authority: var(ISSUER_AUTHORITY_ENV)
                .unwrap_or_else(|| format!("cognito-idp.{region}.amazonaws.com")),
            identity_endpoint,
            algorithm,
            jwks_cache_ttl,
            frontend_url,
            secure_cookies: var(APP_ENV_ENV).is_some_and(|env| env == PRODUCTION),
            region,
        })
    }

    /// Expected `iss` claim: `https://<authority>/<pool-id>`.
    pub fn issuer(&self) -> String {
        format!("https://{}/{}", self.issuer_authority, self.user_pool_id)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse an asymmetric JWS algorithm name.
fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name: ALGORITHM_ENV,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let algorithm = Algorithm::from_str(value).map_err(|_| invalid("unknown algorithm"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(invalid("symmetric algorithms cannot be verified with a public key set"))
        }
        _ => Ok(algorithm),
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map(|_| ()).map_err(|e| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
