//! Request → actor resolution.
//!
//! The policy only authorizes; this is where a bearer token becomes an
//! [`ActorContext`]. The account is re-read from the store on every request so
//! a role change (or deletion) takes effect without waiting for token expiry.

use chrono::{DateTime, Utc};
use thiserror::Error;

use rolegate_auth::{ActorContext, TokenValidationError};

use crate::store::{AccountStore, StoreError};
use crate::token::{Hs256TokenIssuer, TokenError};

#[derive(Debug, Error)]
pub enum SessionError {
    /// No bearer token, or one that fails to decode or verify its signature.
    #[error("invalid bearer token: {0}")]
    InvalidToken(String),

    /// A well-formed token whose validity window excludes `now`.
    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("token subject '{0}' no longer exists")]
    UnknownSubject(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Claims(claims) => SessionError::Claims(claims),
            other => SessionError::InvalidToken(other.to_string()),
        }
    }
}

pub struct SessionResolver<S> {
    store: S,
    tokens: Hs256TokenIssuer,
}

impl<S> SessionResolver<S>
where
    S: AccountStore,
{
    pub fn new(store: S, tokens: Hs256TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<ActorContext, SessionError> {
        let claims = self.tokens.verify(token, now)?;
        let account = self
            .store
            .find_by_username(&claims.sub)?
            .ok_or(SessionError::UnknownSubject(claims.sub))?;
        Ok(ActorContext::new(account))
    }

    /// Resolve from an `Authorization` header value (`Bearer <token>`).
    pub fn resolve_header(&self, header: &str, now: DateTime<Utc>) -> Result<ActorContext, SessionError> {
        let token = bearer_token(header)
            .ok_or_else(|| SessionError::InvalidToken("missing bearer token".to_string()))?;
        self.resolve(token, now)
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}
