//! Redis-backed session store.
//!
//! Revoked token ids are stored as plain keys with an expiry, so Redis drops
//! them on its own once the token they revoke could no longer be presented.
//!
//! # Key Design
//!
//! - Revoked token: `revoked:{jti}` -> `1` (EX = remaining token lifetime)

use std::time::Duration;

use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

use crate::infrastructure::{RepositoryError, RepositoryFuture, SessionStore};

/// Prefix for revoked token keys.
const REVOKED_KEY_PREFIX: &str = "revoked:";

/// Generates a Redis key for a revoked token id.
fn revoked_key(token_id: &str) -> String {
    format!("{REVOKED_KEY_PREFIX}{token_id}")
}

/// Converts a TTL to whole seconds for `SET ... EX`, rounding any fraction
/// of a second up.
fn expiry_seconds(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        None
    } else {
        Some(ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0))
    }
}

#[allow(clippy::needless_pass_by_value)]
fn cache_error(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::CacheError(error.to_string())
}

/// Redis implementation of `SessionStore`.
///
/// # Example
///
/// ```ignore
/// let store = RedisSessionStore::from_url("redis://localhost:6379")?;
/// store.revoke("token-id", Duration::from_secs(60)).await?;
/// assert!(store.is_revoked("token-id").await?);
/// ```
#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    pool: Pool,
}

impl RedisSessionStore {
    /// Creates a new session store with the given connection pool.
    #[must_use]
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates a new session store from a Redis URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CacheError` if the pool cannot be created.
    pub fn from_url(redis_url: &str) -> Result<Self, RepositoryError> {
        let config = Config::from_url(redis_url);
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(cache_error)?;
        Ok(Self { pool })
    }
}

#[allow(clippy::significant_drop_tightening)]
impl SessionStore for RedisSessionStore {
    fn revoke(&self, token_id: &str, ttl: Duration) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let key = revoked_key(token_id);
        Box::pin(async move {
            // An already expired token cannot be presented again.
            let Some(seconds) = expiry_seconds(ttl) else {
                return Ok(());
            };
            let mut connection = pool.get().await.map_err(cache_error)?;
            connection
                .set_ex::<_, _, ()>(&key, 1_u8, seconds)
                .await
                .map_err(cache_error)?;
            Ok(())
        })
    }

    fn is_revoked(&self, token_id: &str) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let key = revoked_key(token_id);
        Box::pin(async move {
            let mut connection = pool.get().await.map_err(cache_error)?;
            let exists: bool = connection.exists(&key).await.map_err(cache_error)?;
            Ok(exists)
        })
    }
}
