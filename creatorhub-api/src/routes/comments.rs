/// Workflow comments
///
/// Anyone who can see a workflow can read its comments; only approved
/// workflows accept new ones.

use axum::{extract::State, http::StatusCode};
use creatorhub_shared::auth::{authorization::require_owner_or_admin, middleware::AuthContext};
use creatorhub_shared::models::{
    workflow_comment::{CommentWithAuthor, WorkflowComment},
    Page,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiQuery, ApiResult, Created, Data, ValidJson};
use crate::routes::workflows::{find_public, find_visible};

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub body: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ApiPath(workflow_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<CommentQuery>,
) -> ApiResult<Data<Vec<CommentWithAuthor>>> {
    find_visible(&state, workflow_id, auth.as_ref()).await?;

    let comments =
        WorkflowComment::list_for_workflow(&state.db, workflow_id, Page::new(query.limit, query.offset)).await?;

    Ok(Data(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(workflow_id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> ApiResult<Created<WorkflowComment>> {
    if req.body.trim().is_empty() {
        return Err(ApiError::invalid_field("body", "Comment must not be blank"));
    }

    find_public(&state, workflow_id).await?;

    let comment = WorkflowComment::create(&state.db, workflow_id, auth.user_id, &req.body).await?;

    tracing::debug!(comment_id = %comment.id, %workflow_id, user_id = %auth.user_id, "Comment added");

    Ok(Created(comment))
}

/// Deletes a comment (author or admin)
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((workflow_id, comment_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let comment = WorkflowComment::find_by_id(&state.db, comment_id)
        .await?
        .filter(|c| c.workflow_id == workflow_id)
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    require_owner_or_admin(&state.db, auth.user_id, comment.user_id).await?;

    if !WorkflowComment::delete(&state.db, comment.id).await? {
        return Err(ApiError::not_found("Comment"));
    }

    tracing::info!(%comment_id, deleted_by = %auth.user_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_length_limits() {
        assert!(CreateCommentRequest { body: String::new() }.validate().is_err());
        assert!(CreateCommentRequest { body: "x".repeat(2001) }.validate().is_err());
        assert!(CreateCommentRequest { body: "Nice workflow".to_string() }.validate().is_ok());
    }
}
