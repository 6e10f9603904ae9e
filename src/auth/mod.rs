//! Authentication primitives: password hashing and session tokens.

pub mod password;
pub mod token;

use thiserror::Error;

pub use password::{DUMMY_PASSWORD_HASH, hash_password, verify_password};
pub use token::{Claims, IssuedToken, MIN_SECRET_LENGTH, TokenService};

/// Errors raised while hashing passwords or issuing and checking tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token was presented.
    #[error("Authentication token is missing")]
    MissingToken,

    /// The token failed signature or claim validation.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token is past its expiry.
    #[error("Token has expired")]
    TokenExpired,

    /// The token was revoked by logging out.
    #[error("Token has been revoked")]
    TokenRevoked,

    /// The signing secret is too short.
    #[error("JWT secret must be at least {minimum} bytes, got {actual}")]
    SecretTooShort { minimum: usize, actual: usize },

    /// Hashing or token encoding failed.
    #[error("Credential processing failed: {0}")]
    Internal(String),
}
