use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration as TimeDuration;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            is_valid_email, normalize_email, CheckEmailData, CheckEmailQuery, LoginData,
            LoginRequest, PasswordResetRequest, RefreshData, RegisterRequest, UserResponse,
        },
        gate::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    response::ApiEnvelope,
    state::AppState,
};

pub const REFRESH_COOKIE: &str = "refreshToken";

fn refresh_cookie(token: String, state: &AppState) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .path("/")
        .max_age(TimeDuration::days(state.config.jwt.refresh_ttl_days))
        .secure(state.config.cookie_secure)
        .build()
}

fn expired_refresh_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(TimeDuration::ZERO)
        .secure(state.config.cookie_secure)
        .build()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<UserResponse>>), ApiError> {
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    if User::exists_by_email(&state.db, &payload.email).await? {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::EmailTaken);
    }

    let phone = payload.normalized_phone();
    if let Some(phone) = phone.as_deref() {
        if User::exists_by_phone(&state.db, phone).await? {
            warn!(email = %payload.email, "phone already registered");
            return Err(ApiError::PhoneTaken);
        }
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        payload.name.trim(),
        &payload.email,
        &hash,
        phone.as_deref(),
        payload.agree_to_marketing,
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        ApiEnvelope::ok(UserResponse::from(user), "Registration successful"),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiEnvelope<LoginData>>), ApiError> {
    payload.email = normalize_email(&payload.email);

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login with unknown email");
            ApiError::UnknownEmail
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::BadCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, &user.email)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    let jar = jar.add(refresh_cookie(refresh_token, &state));
    Ok((
        jar,
        ApiEnvelope::ok(
            LoginData {
                token: access_token,
                user: UserResponse::from(user),
            },
            "Login successful",
        ),
    ))
}

/// Stateless logout: tokens stay valid until they expire, the only effect is
/// clearing the refresh cookie on the client.
#[instrument(skip(state, jar, user))]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiEnvelope<()>>) {
    info!(email = %user.0.email, "user logged out");
    let jar = jar.add(expired_refresh_cookie(&state));
    (jar, ApiEnvelope::ok((), "Logout successful"))
}

#[instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ApiEnvelope<RefreshData>>, ApiError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingRefreshToken)?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        ApiError::InvalidRefreshToken
    })?;

    let user = User::find_by_id(&state.db, claims.user_id)
        .await?
        .ok_or(ApiError::RefreshUserGone)?;

    // The refresh token itself is not rotated; only a new access token is minted.
    let access_token = keys.sign_access(user.id, &user.email)?;

    info!(user_id = %user.id, "access token refreshed");
    Ok(ApiEnvelope::ok(
        RefreshData {
            token: access_token,
        },
        "Token refreshed",
    ))
}

#[instrument(skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiEnvelope<UserResponse>>, ApiError> {
    let record = User::find_by_email(&state.db, &user.0.email)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(ApiEnvelope::ok(UserResponse::from(record), "User fetched"))
}

#[instrument(skip(state))]
pub async fn check_email(
    State(state): State<AppState>,
    Query(query): Query<CheckEmailQuery>,
) -> Result<Json<ApiEnvelope<CheckEmailData>>, ApiError> {
    let email = normalize_email(&query.email);
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email format".into()));
    }
    let exists = User::exists_by_email(&state.db, &email).await?;
    let message = if exists {
        "Email already in use"
    } else {
        "Email available"
    };
    Ok(ApiEnvelope::ok(CheckEmailData { exists }, message))
}

#[instrument(skip(state, payload))]
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<ApiEnvelope<()>>, ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".into()))?;

    if !User::exists_by_email(&state.db, &email).await? {
        return Err(ApiError::EmailNotFound);
    }

    // Fire and forget: delivery failure never fails the request.
    if let Err(e) = state.notifier.send_password_reset(&email).await {
        warn!(error = %e, email = %email, "password reset hand-off failed");
    }

    info!(email = %email, "password reset requested");
    Ok(ApiEnvelope::ok((), "Password reset email sent"))
}
