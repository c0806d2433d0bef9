/// API route handlers, one module per resource
///
/// - `health`: liveness and database status
/// - `auth`: registration, login, token refresh
/// - `profile`: the caller's own profile
/// - `creators`: public creator directory
/// - `applications`: creator applications and admin decisions
/// - `workflows`: workflow catalogue, moderation, stars and downloads
/// - `comments`: workflow comments
/// - `news`, `events`, `featured`: admin-authored content
/// - `notifications`: the caller's notifications
/// - `uploads`: file uploads
/// - `admins`: admin allow-list management

pub mod admins;
pub mod applications;
pub mod auth;
pub mod comments;
pub mod creators;
pub mod events;
pub mod featured;
pub mod health;
pub mod news;
pub mod notifications;
pub mod profile;
pub mod uploads;
pub mod workflows;

use creatorhub_shared::auth::{authorization, middleware::AuthContext};
use validator::ValidateUrl;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// Treats blank optional strings as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Maps a nullable text field in a partial update: `Some("")` clears it
pub(crate) fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
}

/// Rejects a non-blank value that does not parse as a URL
///
/// Blank values pass: in partial updates they clear the field.
pub(crate) fn check_url(field: &str, value: Option<&str>, message: &str) -> ApiResult<()> {
    match value.map(str::trim) {
        Some(url) if !url.is_empty() && !url.validate_url() => Err(ApiError::invalid_field(field, message)),
        _ => Ok(()),
    }
}

/// Every entry must parse as a URL
pub(crate) fn check_urls(field: &str, values: &[String]) -> ApiResult<()> {
    if values.iter().any(|url| !url.trim().validate_url()) {
        return Err(ApiError::invalid_field(field, "Every entry must be a valid URL"));
    }

    Ok(())
}

/// Lets admins see non-public content; anonymous callers get 401, others 403
pub(crate) async fn require_admin_viewer(state: &AppState, auth: Option<&AuthContext>) -> ApiResult<()> {
    let auth = auth.ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;
    authorization::require_admin(&state.db, auth.user_id).await?;
    Ok(())
}

/// True when the caller is a signed-in admin
pub(crate) async fn viewer_is_admin(state: &AppState, auth: Option<&AuthContext>) -> ApiResult<bool> {
    match auth {
        Some(auth) => Ok(authorization::is_admin(&state.db, auth.user_id).await?),
        None => Ok(false),
    }
}
