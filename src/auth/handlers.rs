use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RefreshRequest, RegisterRequest, ResetPasswordRequest, RevokeRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
        tokens,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/revoke-token", post(revoke_token))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Access JWT plus a freshly persisted refresh token for `user`.
async fn issue_pair(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id, &user.email)?;
    let refresh = tokens::issue(&state.db, user.id, state.config.refresh_ttl()).await?;
    Ok(AuthResponse {
        access_token,
        refresh_token: refresh.token,
        user: PublicUser::from(user),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    // Pre-check; the unique index on users.email is the backstop
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.email,
        &hash,
        payload.name.as_deref(),
        payload.age,
        payload.gender.as_deref(),
    )
    .await?;

    let response = issue_pair(&state, &user).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    // Unknown email and wrong password answer identically so callers cannot
    // probe which accounts exist.
    let mut user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    user.last_login_at = Some(User::touch_last_login(&state.db, user.id).await?);

    let response = issue_pair(&state, &user).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let old = tokens::find(&state.db, &payload.refresh_token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    if !old.is_active() {
        warn!(token_id = %old.id, user_id = %old.user_id, "refresh on inactive token");
        return Err(ApiError::unauthorized("Invalid token"));
    }

    // None means a concurrent refresh revoked it first; treat like any other
    // inactive token.
    let new = tokens::rotate(&state.db, &old.token, old.user_id, state.config.refresh_ttl())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let user = User::find_by_id(&state.db, old.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, &user.email)?;

    info!(user_id = %user.id, token_id = %new.id, "refresh token rotated");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token: new.token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn revoke_token(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<RevokeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = tokens::find(&state.db, &payload.refresh_token)
        .await?
        .ok_or_else(|| ApiError::not_found("Token not found"))?;

    if token.user_id != caller {
        warn!(token_id = %token.id, %caller, "revoke on another user's token");
        return Err(ApiError::Forbidden);
    }

    if !token.is_active() {
        return Err(ApiError::unauthorized("Token is not active"));
    }

    // A concurrent rotate or revoke may have beaten this call
    let revoked = tokens::revoke(&state.db, &token.token, tokens::REASON_REVOKED).await?;
    if !revoked {
        return Err(ApiError::unauthorized("Token is not active"));
    }

    info!(token_id = %token.id, user_id = %caller, "refresh token revoked");
    Ok(Json(MessageResponse::ok("Token revoked")))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let token = tokens::generate_token();
        let expires_at = OffsetDateTime::now_utc() + state.config.reset_ttl();
        User::set_reset_token(&state.db, user.id, &token, expires_at).await?;
        info!(user_id = %user.id, "password reset token generated");
    }

    // Identical body whether or not the account exists
    Ok(Json(MessageResponse::ok(
        "Please check your email for password reset instructions",
    )))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.validate()?;

    let user = User::find_by_reset_token(&state.db, &payload.token)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset token".into()))?;

    let hash = hash_password(&payload.password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse::ok(
        "Password reset successful, you can now login",
    )))
}
