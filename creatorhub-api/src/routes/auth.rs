/// Authentication endpoints
///
/// Registration and login both return an access/refresh token pair. Access
/// tokens go in `Authorization: Bearer <token>`; refresh tokens are only
/// accepted by `/api/auth/refresh`.

use axum::{extract::State, http::StatusCode};
use creatorhub_shared::auth::{
    jwt::{self, TokenPair},
    middleware::AuthContext,
    password,
};
use creatorhub_shared::models::{
    admin_user::AdminUser,
    profile::Profile,
    user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, Created, Data, ValidJson};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Register/login response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Caller's account summary
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub is_admin: bool,
    pub profile: Option<Profile>,
}

/// Creates an account
///
/// ```text
/// POST /api/auth/register
/// { "email": "user@example.com", "password": "SecureP@ss123" }
/// ```
///
/// # Errors
///
/// - `400`: invalid email or weak password
/// - `409`: email already registered
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<Created<SessionResponse>> {
    password::validate_password_strength(&req.password)
        .map_err(|msg| ApiError::invalid_field("password", msg))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let tokens = jwt::issue_token_pair(user.id, &state.config.jwt.secret)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Created(SessionResponse { user, tokens }))
}

/// Exchanges credentials for tokens
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Data<SessionResponse>> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let tokens = jwt::issue_token_pair(user.id, &state.config.jwt.secret)?;

    Ok(Data(SessionResponse { user, tokens }))
}

/// Issues a new access token from a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> ApiResult<Data<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, &state.config.jwt.secret)?;

    Ok(Data(RefreshResponse {
        access_token,
        token_type: "Bearer",
    }))
}

/// Returns the caller's account, admin flag and profile
pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Data<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let (is_admin, profile) = tokio::try_join!(
        AdminUser::is_admin(&state.db, auth.user_id),
        Profile::find_by_user(&state.db, auth.user_id),
    )?;

    Ok(Data(MeResponse {
        user,
        is_admin,
        profile,
    }))
}

/// Changes the caller's password after re-checking the current one
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    password::validate_password_strength(&req.new_password)
        .map_err(|msg| ApiError::invalid_field("new_password", msg))?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::invalid_field("current_password", "Current password is incorrect"));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::update_password(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
