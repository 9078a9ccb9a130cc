//! Access tokens issued by the auth module and checked by the gateway

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// User the token has been issued to
    pub username: String,
    /// Expiry as seconds since the unix epoch
    pub exp: i64,
}

/// Raised when a token can not be issued or is not acceptable
#[derive(Debug, Error)]
#[error("token rejected: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// Issues and verifies HS256 signed access tokens using a shared secret
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenAuthority {
    /// Creates a new instance issuing tokens which expire after `lifetime`
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            lifetime,
        }
    }

    /// Issues a token for the given user
    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        let lifetime = chrono::Duration::from_std(self.lifetime)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let claims = AccessClaims {
            username: username.to_owned(),
            exp: (Utc::now() + lifetime).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Checks signature and expiry of a token and returns its claims
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        Ok(decode::<AccessClaims>(token, &self.decoding, &self.validation)?.claims)
    }
}
