//! Signed bearer tokens (HS256).
//!
//! [`TokenIssuer`] mints tokens at the edge; [`TokenVerifier`] checks
//! signature and expiry. Both sides share one symmetric secret supplied by
//! runtime configuration.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use shared_types::{current_timestamp, Fault, UserClaims};
use thiserror::Error;

/// Scheme prefix expected on the raw credential string.
pub const BEARER_SCHEME: &str = "Bearer ";

/// Credential verification failures. All of them collapse to
/// [`Fault::Unauthorized`] at the envelope boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential on envelope")]
    MissingCredential,

    #[error("credential scheme is not Bearer")]
    InvalidScheme,

    #[error("credential failed verification")]
    InvalidToken,

    #[error("credential expired")]
    Expired,
}

impl From<AuthError> for Fault {
    fn from(err: AuthError) -> Self {
        Fault::Unauthorized(err.to_string())
    }
}

/// Claim set carried inside a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub role: String,
    /// Issued-at, seconds since epoch.
    pub iat: u64,
    /// Expiry, seconds since epoch.
    pub exp: u64,
}

impl From<Claims> for UserClaims {
    fn from(claims: Claims) -> Self {
        UserClaims {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Mints signed tokens. Lives at the edge that authenticates users.
pub struct TokenIssuer {
    key: EncodingKey,
    validity_secs: u64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], validity_secs: u64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            validity_secs,
        }
    }

    /// Issues a raw token (without the scheme prefix) for `user`.
    pub fn issue(&self, user: &UserClaims) -> Result<String, AuthError> {
        let now = current_timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role.clone(),
            iat: now,
            exp: now + self.validity_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Issues a full `Bearer <token>` credential string.
    pub fn issue_bearer(&self, user: &UserClaims) -> Result<String, AuthError> {
        Ok(format!("{BEARER_SCHEME}{}", self.issue(user)?))
    }
}

/// Verifies token signature and expiry.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; a code path relying on clock slack is a bug.
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verifies a raw token (scheme prefix already stripped).
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Strips the `Bearer ` prefix and verifies the remainder.
    pub fn verify_bearer(&self, credential: &str) -> Result<Claims, AuthError> {
        let token = credential
            .strip_prefix(BEARER_SCHEME)
            .ok_or(AuthError::InvalidScheme)?;
        self.verify(token)
    }
}
