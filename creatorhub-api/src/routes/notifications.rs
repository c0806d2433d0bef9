/// The caller's notifications
///
/// Mounted behind `require_auth`; every query is scoped to the caller, so
/// another user's notification id behaves as missing.

use axum::{extract::State, http::StatusCode};
use creatorhub_shared::auth::middleware::AuthContext;
use creatorhub_shared::models::{notification::Notification, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiQuery, ApiResult, Data};

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<Data<Vec<Notification>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_PAGE_SIZE);
    let notifications = Notification::list_for_user(&state.db, auth.user_id, query.unread_only, limit).await?;

    Ok(Data(notifications))
}

pub async fn unread_count(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Data<UnreadCount>> {
    let count = Notification::unread_count(&state.db, auth.user_id).await?;
    Ok(Data(UnreadCount { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<Notification>> {
    let notification = Notification::mark_read(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification"))?;

    Ok(Data(notification))
}

pub async fn mark_all_read(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Data<MarkedRead>> {
    let updated = Notification::mark_all_read(&state.db, auth.user_id).await?;
    tracing::debug!(user_id = %auth.user_id, updated, "Marked notifications read");

    Ok(Data(MarkedRead { updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !Notification::delete(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found("Notification"));
    }

    Ok(StatusCode::NO_CONTENT)
}
