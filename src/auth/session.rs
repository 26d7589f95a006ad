use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{validate_jwt, Credentials, JwtError};

const MAX_USER_ID_LEN: usize = 255;

/// Opaque, validated identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Returns None for blank, oversized or control-character ids.
    ///
    /// Accepted ids are kept byte for byte; the provider's identifier is opaque.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() || raw.len() > MAX_USER_ID_LEN {
            return None;
        }
        if raw.chars().any(char::is_control) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A caller identity as reported by the identity provider for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }

    /// The session's user id, if the provider handed back something usable
    pub fn usable_user_id(&self) -> Option<UserId> {
        UserId::parse(&self.user_id)
    }
}

/// Faults raised by an identity provider while resolving a session.
///
/// "No session" is not a fault; resolvers return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider returned a malformed response: {0}")]
    Malformed(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve the caller behind the given credentials.
    async fn resolve_session(&self, credentials: &Credentials) -> Result<Option<Session>, IdentityError>;
}

/// Resolves sessions from HS256 tokens signed with a shared secret
pub struct JwtSessionResolver {
    secret: String,
}

impl JwtSessionResolver {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve_session(&self, credentials: &Credentials) -> Result<Option<Session>, IdentityError> {
        let Some(token) = credentials.token() else {
            return Ok(None);
        };

        match validate_jwt(token, &self.secret) {
            Ok(claims) => Ok(Some(Session::new(claims.sub))),
            Err(JwtError::InvalidSecret) => Err(IdentityError::NotConfigured("JWT_SECRET")),
            Err(e) => {
                // Bad signature, expiry, garbage: the caller simply has no session
                tracing::debug!(credentials = credentials.kind(), "token rejected: {}", e);
                Ok(None)
            }
        }
    }
}
