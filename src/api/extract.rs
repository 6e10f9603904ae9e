//! Request extractors for authenticated routes.
//!
//! A session token is read from `Authorization: Bearer <jwt>` first and from
//! the `token` cookie otherwise. Request bodies and query strings go through
//! [`ApiJson`] and [`ApiQuery`] so that malformed input is answered with the
//! same JSON error body as every other failure.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::auth::{AuthError, Claims};
use crate::domain::UserId;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

// =============================================================================
// AuthenticatedUser
// =============================================================================

/// The caller of an authenticated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    /// Claims of the presented token; `jti` is needed to log out.
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let claims = state.tokens.verify(&token)?;

        if state.session_store.is_revoked(&claims.jti).await? {
            return Err(AuthError::TokenRevoked.into());
        }

        let user_id = claims.user_id()?;
        Ok(Self { user_id, claims })
    }
}

// =============================================================================
// Body and query extractors
// =============================================================================

/// `Json` whose rejection is an [`ApiErrorResponse`].
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErrorResponse))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejection is an [`ApiErrorResponse`].
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiErrorResponse))]
pub struct ApiQuery<T>(pub T);

// =============================================================================
// Header parsing
// =============================================================================

/// Finds the session token in the request headers.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Builds the `Set-Cookie` value that stores a session token.
#[must_use]
pub fn session_cookie(token: &str, max_age_seconds: u64, secure: bool) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_seconds}; {}",
        same_site(secure)
    )
}

/// Builds the `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn expired_session_cookie(secure: bool) -> String {
    format!(
        "{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; {}",
        same_site(secure)
    )
}

// Cross-site cookies are only accepted by browsers when marked Secure.
const fn same_site(secure: bool) -> &'static str {
    if secure {
        "SameSite=None; Secure"
    } else {
        "SameSite=Lax"
    }
}
