//! Authentication stage of the request pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use restful_core::hashing::sha256_hex;

use crate::config::ServerConfig;
use crate::error::AppError;

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<(), AppError>;
}

/// Lets every request through.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authenticate(&self, _headers: &HeaderMap) -> Result<(), AppError> {
        Ok(())
    }
}

/// Accepts `Authorization: Bearer <token>` for a fixed set of tokens.
///
/// Only SHA-256 digests of the tokens are kept in memory.
#[derive(Debug, Clone)]
pub struct BearerTokenAuthenticator {
    token_hashes: HashSet<String>,
}

impl BearerTokenAuthenticator {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            token_hashes: tokens
                .into_iter()
                .map(|t| sha256_hex(t.as_ref().as_bytes()))
                .collect(),
        }
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let auth_header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
        })?;

        if self.token_hashes.contains(&sha256_hex(token.trim().as_bytes())) {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Invalid or expired token".into()))
        }
    }
}

/// Bearer authentication when tokens are configured, otherwise [`AllowAll`].
pub fn from_config(config: &ServerConfig) -> Arc<dyn Authenticator> {
    if config.api_tokens.is_empty() {
        Arc::new(AllowAll)
    } else {
        Arc::new(BearerTokenAuthenticator::new(&config.api_tokens))
    }
}
