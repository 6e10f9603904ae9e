//! Account handlers: signup, login, session boot and logout.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::Json;
use secrecy::ExposeSecret;

use super::dto::{
    BootResponse, Envelope, LoginRequest, LoginResponse, MessageResponse, SignupRequest,
    UserProfile, validate_signup,
};
use super::error::{ApiErrorResponse, INTERNAL_ERROR_MESSAGE};
use super::extract::{ApiJson, AuthenticatedUser, expired_session_cookie, session_cookie};
use super::handlers::AppState;
use crate::auth::{DUMMY_PASSWORD_HASH, hash_password, verify_password};
use crate::domain::{Email, Timestamp, User, UserId};
use crate::infrastructure::RepositoryError;

const USER_EXISTS_MESSAGE: &str = "User Already Exists!";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid Credentials!";

type WithCookie<T> = ([(HeaderName, HeaderValue); 1], Json<T>);

fn cookie_header(value: &str) -> Result<HeaderValue, ApiErrorResponse> {
    HeaderValue::from_str(value).map_err(|error| {
        tracing::error!(%error, "Session cookie is not a valid header value");
        ApiErrorResponse::internal_error(INTERNAL_ERROR_MESSAGE)
    })
}

/// Registers a new account.
///
/// # Response
///
/// - **201 Created**: `{ message, data: { name, email } }`
/// - **400 Bad Request**: Validation error
/// - **409 Conflict**: E-mail already registered
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for the failures listed above and for
/// repository or hashing errors (500).
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<Envelope<UserProfile>>), ApiErrorResponse> {
    let validated = validate_signup(&request)?;

    if state
        .user_repository
        .find_by_email(&validated.email)
        .await?
        .is_some()
    {
        return Err(ApiErrorResponse::duplicate(USER_EXISTS_MESSAGE));
    }

    let password_hash = hash_password(&validated.password).await?;
    let user = User::new(
        UserId::generate(),
        validated.name,
        validated.email,
        password_hash,
        Timestamp::now(),
    );

    // A concurrent signup may still win the unique e-mail race.
    state
        .user_repository
        .insert(&user)
        .await
        .map_err(|error| match error {
            RepositoryError::Duplicate(_) => ApiErrorResponse::duplicate(USER_EXISTS_MESSAGE),
            other => ApiErrorResponse::from(other),
        })?;

    tracing::info!(user_id = %user.user_id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(
            "User Created Successfully",
            UserProfile::from(&user),
        )),
    ))
}

/// The hash a login attempt is verified against. Without an account this is
/// [`DUMMY_PASSWORD_HASH`], so every attempt runs one Argon2 verification.
fn credential_hash(user: Option<&User>) -> &str {
    user.map_or(DUMMY_PASSWORD_HASH, |user| user.password_hash.as_str())
}

/// Checks credentials and starts a session.
///
/// The token is returned in the body and set as an `HttpOnly` cookie.
///
/// # Errors
///
/// Returns 401 for an unknown e-mail or a wrong password, and 500 for
/// repository or hashing failures.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<WithCookie<Envelope<LoginResponse>>, ApiErrorResponse> {
    let user = match Email::parse(&request.email) {
        Some(email) => state.user_repository.find_by_email(&email).await?,
        None => None,
    };

    let verified = verify_password(&request.password, credential_hash(user.as_ref())).await?;

    let Some(user) = user.filter(|_| verified) else {
        tracing::debug!("Rejected login");
        return Err(ApiErrorResponse::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    };

    let issued = state.tokens.issue(&user.user_id)?;
    let token = issued.token.expose_secret().to_string();
    let cookie = cookie_header(&session_cookie(
        &token,
        state.tokens.ttl().as_secs(),
        state.config.cookie_secure,
    ))?;

    tracing::info!(user_id = %user.user_id, jti = %issued.claims.jti, "User logged in");
    Ok((
        [(SET_COOKIE, cookie)],
        Json(Envelope::new(
            "Login Successful!",
            LoginResponse {
                name: user.name,
                email: user.email.to_string(),
                token,
            },
        )),
    ))
}

/// Returns the caller's profile for restoring a client session.
///
/// # Errors
///
/// Returns 401 if the token is missing, invalid or revoked, or its account
/// no longer exists.
pub async fn boot(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<Json<Envelope<BootResponse>>, ApiErrorResponse> {
    let user = state
        .user_repository
        .find_by_id(&caller.user_id)
        .await?
        .ok_or_else(|| ApiErrorResponse::unauthorized("Unauthorized"))?;

    Ok(Json(Envelope::new(
        "Boot Successful!",
        BootResponse::from(&user),
    )))
}

/// Ends the caller's session.
///
/// The token id is revoked until the token would have expired anyway, and
/// the cookie is cleared.
///
/// # Errors
///
/// Returns 401 without a valid session and 500 if the session store fails.
pub async fn logout(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<WithCookie<MessageResponse>, ApiErrorResponse> {
    state
        .session_store
        .revoke(&caller.claims.jti, caller.claims.revocation_ttl())
        .await?;

    tracing::info!(user_id = %caller.user_id, jti = %caller.claims.jti, "User logged out");
    Ok((
        [(
            SET_COOKIE,
            cookie_header(&expired_session_cookie(state.config.cookie_secure))?,
        )],
        Json(MessageResponse {
            message: "Logged Out Successfully!",
        }),
    ))
}
