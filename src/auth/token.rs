//! HS256 session tokens.
//!
//! Every token carries a unique `jti` so a single session can be revoked on
//! logout without invalidating the user's other sessions.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::domain::UserId;

/// Minimum length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Registered claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// Token id, used for revocation.
    pub jti: String,
    /// Issued at (seconds since the epoch).
    pub iat: i64,
    /// Expiry (seconds since the epoch).
    pub exp: i64,
}

impl Claims {
    /// Parses the subject as a user id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a UUID.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        Uuid::parse_str(&self.sub)
            .map(UserId::from_uuid)
            .map_err(|error| AuthError::InvalidToken(format!("bad subject: {error}")))
    }

    /// Time left until expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        let now = chrono::Utc::now().timestamp();
        u64::try_from(self.exp.saturating_sub(now)).map_or(Duration::ZERO, Duration::from_secs)
    }

    /// How long the token id must stay revoked after logout.
    ///
    /// Verification accepts a token up to and including its `exp` second, so
    /// this is one second longer than [`Claims::remaining`] and never zero for
    /// a token that still verifies.
    #[must_use]
    pub fn revocation_ttl(&self) -> Duration {
        self.remaining() + Duration::from_secs(1)
    }
}

/// A freshly signed token and the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The compact JWT.
    pub token: SecretString,
    pub claims: Claims,
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Debug, Clone)]
pub struct TokenService {
    secret: SecretString,
    ttl: Duration,
}

impl TokenService {
    /// Creates a token service.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SecretTooShort` if the secret is shorter than
    /// [`MIN_SECRET_LENGTH`] bytes.
    pub fn new(secret: SecretString, ttl: Duration) -> Result<Self, AuthError> {
        let actual = secret.expose_secret().len();
        if actual < MIN_SECRET_LENGTH {
            return Err(AuthError::SecretTooShort {
                minimum: MIN_SECRET_LENGTH,
                actual,
            });
        }
        Ok(Self { secret, ttl })
    }

    /// Returns the lifetime of issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id` with a fresh `jti`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue(&self, user_id: &UserId) -> Result<IssuedToken, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let lifetime = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(lifetime),
        };
        let token = self.encode(&claims)?;
        Ok(IssuedToken {
            token: SecretString::from(token),
            claims,
        })
    }

    /// Verifies a token's signature and expiry and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for expired tokens and
    /// `AuthError::InvalidToken` for anything else that fails validation.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        jsonwebtoken::decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(error.to_string()),
            })
    }

    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(|error| AuthError::Internal(error.to_string()))
    }
}
