/// Admin allow-list management
///
/// Admins can grant admin to any existing account (by id or email) and
/// revoke it from anyone but themselves. The last remaining admin cannot
/// be revoked, even by concurrent requests.

use axum::{extract::State, http::StatusCode};
use creatorhub_shared::auth::middleware::AdminContext;
use creatorhub_shared::models::{
    admin_user::{AdminListing, AdminUser, RevokeOutcome},
    user::User,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiResult, Data, ValidJson};

/// Grant target; exactly one of `user_id` or `email`
#[derive(Debug, Deserialize, Validate)]
pub struct GrantAdminRequest {
    pub user_id: Option<Uuid>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GrantAdminResponse {
    pub user_id: Uuid,

    /// `false` when the user already was an admin
    pub granted: bool,
}

pub async fn list_admins(State(state): State<AppState>, _admin: AdminContext) -> ApiResult<Data<Vec<AdminListing>>> {
    Ok(Data(AdminUser::list(&state.db).await?))
}

pub async fn grant_admin(
    State(state): State<AppState>,
    admin: AdminContext,
    ValidJson(req): ValidJson<GrantAdminRequest>,
) -> ApiResult<Data<GrantAdminResponse>> {
    let user = match (req.user_id, req.email) {
        (Some(id), None) => User::find_by_id(&state.db, id).await?,
        (None, Some(email)) => User::find_by_email(&state.db, &email).await?,
        _ => {
            return Err(ApiError::BadRequest(
                "Provide exactly one of user_id or email".to_string(),
            ))
        }
    }
    .ok_or_else(|| ApiError::not_found("User"))?;

    let granted = AdminUser::grant(&state.db, user.id, Some(admin.user_id)).await?;

    if granted {
        tracing::info!(user_id = %user.id, granted_by = %admin.user_id, "Admin granted");
    }

    Ok(Data(GrantAdminResponse {
        user_id: user.id,
        granted,
    }))
}

pub async fn revoke_admin(
    State(state): State<AppState>,
    admin: AdminContext,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if user_id == admin.user_id {
        return Err(ApiError::Conflict("Admins cannot revoke their own access".to_string()));
    }

    match AdminUser::revoke(&state.db, user_id).await? {
        RevokeOutcome::Revoked => {}
        RevokeOutcome::NotAdmin => return Err(ApiError::not_found("Admin")),
        RevokeOutcome::LastAdmin => {
            return Err(ApiError::Conflict("Cannot revoke the last admin".to_string()));
        }
    }

    tracing::info!(%user_id, revoked_by = %admin.user_id, "Admin revoked");

    Ok(StatusCode::NO_CONTENT)
}
