//! Server and authentication settings read from the environment.
//!
//! # Environment Variables
//!
//! - `HOST`: bind address (default: `0.0.0.0`)
//! - `PORT`: bind port (default: `8000`)
//! - `CORS_ORIGIN`: exact browser origin allowed with credentials (default: any origin, no credentials)
//! - `COOKIE_SECURE`: mark the session cookie `Secure` (default: `false`)
//! - `BODY_LIMIT_BYTES`: maximum request body size (default: 100 MiB)
//! - `JWT_SECRET`: HMAC signing secret, at least 32 bytes (required)
//! - `JWT_TTL_SECONDS`: session lifetime (default: `86400`)

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::auth::MIN_SECRET_LENGTH;

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default maximum request body size.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 100 * 1024 * 1024;

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors raised while reading settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable holds a value that cannot be used.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed to send credentials; `None` allows any origin without credentials.
    pub cors_origin: Option<String>,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origin: None,
            cookie_secure: false,
            body_limit: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    /// Reads the server settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the server settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: non_empty(&lookup, "HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            cors_origin: non_empty(&lookup, "CORS_ORIGIN"),
            cookie_secure: parse_flag(&lookup, "COOKIE_SECURE", defaults.cookie_secure)?,
            body_limit: parse_or(&lookup, "BODY_LIMIT_BYTES", defaults.body_limit)?,
        })
    }

    /// Resolves the bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `host:port` is not a socket address.
    pub fn socket_address(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.host, self.port);
        address.parse().map_err(|error: std::net::AddrParseError| ConfigError::Invalid {
            name: "HOST",
            value: address.clone(),
            reason: error.to_string(),
        })
    }
}

/// Token signing settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub token_ttl: Duration,
}

impl AuthConfig {
    /// Reads the authentication settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `JWT_SECRET` is missing or shorter than
    /// 32 bytes, or `JWT_TTL_SECONDS` is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the authentication settings through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`AuthConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup("JWT_SECRET")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                value: "<redacted>".to_string(),
                reason: format!("must be at least {MIN_SECRET_LENGTH} bytes"),
            });
        }

        let seconds: u64 = parse_or(&lookup, "JWT_TTL_SECONDS", DEFAULT_TOKEN_TTL.as_secs())?;
        if seconds == 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL_SECONDS",
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            jwt_secret: SecretString::from(secret),
            token_ttl: Duration::from_secs(seconds),
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(lookup, name).map_or(Ok(default), |value| {
        value.parse().map_err(|error: T::Err| ConfigError::Invalid {
            name,
            reason: error.to_string(),
            value,
        })
    })
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = non_empty(lookup, name) else {
        return Ok(default);
    };
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[rstest]
    fn test_server_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8000);
        assert_eq!(config.socket_address().unwrap().port(), 8000);
    }

    #[rstest]
    fn test_server_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("CORS_ORIGIN", "http://localhost:3000"),
            ("COOKIE_SECURE", "yes"),
            ("BODY_LIMIT_BYTES", "1024"),
        ]))
        .unwrap();

        assert_eq!(config.socket_address().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:3000"));
        assert!(config.cookie_secure);
        assert_eq!(config.body_limit, 1024);
    }

    #[rstest]
    #[case("PORT", "http")]
    #[case("PORT", "70000")]
    #[case("COOKIE_SECURE", "maybe")]
    #[case("BODY_LIMIT_BYTES", "-1")]
    fn test_server_invalid_values(#[case] name: &str, #[case] value: &str) {
        let result = ServerConfig::from_lookup(lookup(&[(name, value)]));

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[rstest]
    fn test_auth_requires_secret() {
        assert_eq!(
            AuthConfig::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[rstest]
    fn test_auth_rejects_short_secret() {
        let result = AuthConfig::from_lookup(lookup(&[("JWT_SECRET", "short")]));

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                ..
            })
        ));
    }

    #[rstest]
    fn test_auth_defaults_and_overrides() {
        let config = AuthConfig::from_lookup(lookup(&[("JWT_SECRET", SECRET)])).unwrap();
        assert_eq!(config.jwt_secret.expose_secret(), SECRET);
        assert_eq!(config.token_ttl, DEFAULT_TOKEN_TTL);

        let config = AuthConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("JWT_TTL_SECONDS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.token_ttl, Duration::from_secs(60));
    }

    #[rstest]
    fn test_auth_rejects_zero_ttl() {
        let result = AuthConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("JWT_TTL_SECONDS", "0"),
        ]));

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "JWT_TTL_SECONDS",
                ..
            })
        ));
    }
}
