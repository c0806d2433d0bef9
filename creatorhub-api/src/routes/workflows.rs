/// Workflow catalogue, owner management, moderation and interactions
///
/// # Visibility
///
/// Approved workflows are public. Drafts, pending and rejected workflows are
/// visible to their owner and to admins only; everyone else gets 404 so
/// hidden workflows cannot be discovered.
///
/// # Lifecycle
///
/// ```text
/// draft ──submit──▶ pending ──admin──▶ approved
///                     ▲    └──admin──▶ rejected
///                     └── owner edit / resubmit ──┘
/// ```
///
/// Editing an approved workflow sends it back to `pending`.

use axum::{extract::State, http::StatusCode};
use creatorhub_shared::auth::{
    authorization::{self, require_creator, require_owner_or_admin},
    middleware::{AdminContext, AuthContext},
};
use creatorhub_shared::models::{
    profile::Profile,
    workflow::{
        CreateWorkflow, UpdateWorkflow, Workflow, WorkflowFilter, WorkflowListing, WorkflowSort,
        WorkflowStatus,
    },
    workflow_interaction::{InteractionOutcome, WorkflowInteraction},
    Page,
};
use creatorhub_shared::notifications::{self, NotificationEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiQuery, ApiResult, Created, Data, ValidJson};
use crate::routes::{check_url, check_urls, clearable, non_blank};

#[derive(Debug, Default, Deserialize)]
pub struct WorkflowQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub creator: Option<Uuid>,
    #[serde(default)]
    pub sort: WorkflowSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminWorkflowQuery {
    /// Defaults to the review queue (`pending`)
    pub status: Option<WorkflowStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkflowRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 20000, message = "Description is required"))]
    pub description: String,

    #[validate(length(max = 50, message = "Category is too long"))]
    pub category: Option<String>,

    #[validate(length(max = 20, message = "At most 20 tags"))]
    #[serde(default)]
    pub tags: Vec<String>,

    #[validate(length(max = 10, message = "At most 10 media URLs"))]
    #[serde(default)]
    pub media_urls: Vec<String>,

    #[validate(url(message = "Invalid workflow URL"))]
    pub workflow_url: Option<String>,

    /// Save without submitting for review
    #[serde(default)]
    pub draft: bool,
}

/// Owner edit; blank `category`/`workflow_url` clear the field
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWorkflowRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 20000, message = "Description must not be empty"))]
    pub description: Option<String>,

    #[validate(length(max = 50, message = "Category is too long"))]
    pub category: Option<String>,

    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Option<Vec<String>>,

    #[validate(length(max = 10, message = "At most 10 media URLs"))]
    pub media_urls: Option<Vec<String>>,

    pub workflow_url: Option<String>,

    /// Submit a draft or rejected workflow for review
    #[serde(default)]
    pub submit: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetStatusRequest {
    pub status: WorkflowStatus,

    #[validate(length(max = 2000, message = "Rejection reason is too long"))]
    pub rejection_reason: Option<String>,
}

/// Workflow detail with the caller's star state
#[derive(Debug, Serialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub listing: WorkflowListing,

    /// `None` for anonymous callers
    pub starred: Option<bool>,
}

/// Loads a workflow the caller may see, or 404
pub(crate) async fn find_visible(state: &AppState, id: Uuid, auth: Option<&AuthContext>) -> ApiResult<WorkflowListing> {
    let listing = Workflow::find_listing(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workflow"))?;

    if listing.workflow.status.is_public() {
        return Ok(listing);
    }

    if let Some(auth) = auth {
        if auth.user_id == listing.owner_id || authorization::is_admin(&state.db, auth.user_id).await? {
            return Ok(listing);
        }
    }

    Err(ApiError::not_found("Workflow"))
}

/// Loads an approved workflow for star/download, or 404
pub(crate) async fn find_public(state: &AppState, id: Uuid) -> ApiResult<Workflow> {
    Workflow::find_by_id(&state.db, id)
        .await?
        .filter(|w| w.status.is_public())
        .ok_or_else(|| ApiError::not_found("Workflow"))
}

/// Status the workflow moves to after an owner edit, if any
fn status_after_edit(current: WorkflowStatus, content_changed: bool, submit: bool) -> Option<WorkflowStatus> {
    let next = match (content_changed, submit) {
        (_, true) if matches!(current, WorkflowStatus::Draft | WorkflowStatus::Rejected) => WorkflowStatus::Pending,
        (true, _) => current.after_owner_edit(),
        _ => current,
    };

    (next != current).then_some(next)
}

/// Public catalogue (approved workflows only)
pub async fn list_workflows(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WorkflowQuery>,
) -> ApiResult<Data<Vec<WorkflowListing>>> {
    let filter = WorkflowFilter {
        category: query.category,
        tag: query.tag,
        search: query.search,
        profile_id: query.creator,
        status: None,
        sort: query.sort,
        page: Page::new(query.limit, query.offset),
    };

    Ok(Data(Workflow::list(&state.db, &filter).await?))
}

/// Admin listing by status, newest first
pub async fn admin_list_workflows(
    State(state): State<AppState>,
    _admin: AdminContext,
    ApiQuery(query): ApiQuery<AdminWorkflowQuery>,
) -> ApiResult<Data<Vec<WorkflowListing>>> {
    let filter = WorkflowFilter {
        status: Some(query.status.unwrap_or(WorkflowStatus::Pending)),
        page: Page::new(query.limit, query.offset),
        ..Default::default()
    };

    Ok(Data(Workflow::list(&state.db, &filter).await?))
}

/// The caller's workflows in every status
pub async fn my_workflows(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Data<Vec<Workflow>>> {
    let workflows = match Profile::find_by_user(&state.db, auth.user_id).await? {
        Some(profile) => Workflow::list_by_profile(&state.db, profile.id).await?,
        None => Vec::new(),
    };

    Ok(Data(workflows))
}

pub async fn get_workflow(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<WorkflowDetail>> {
    let listing = find_visible(&state, id, auth.as_ref()).await?;

    let starred = match auth {
        Some(auth) => Some(WorkflowInteraction::has_starred(&state.db, id, auth.user_id).await?),
        None => None,
    };

    Ok(Data(WorkflowDetail { listing, starred }))
}

/// Creates a workflow for the caller's approved creator profile
///
/// Unless `draft` is set the workflow goes straight to review and admins
/// are notified.
pub async fn create_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<CreateWorkflowRequest>,
) -> ApiResult<Created<Workflow>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", "Title is required"));
    }
    if req.description.trim().is_empty() {
        return Err(ApiError::invalid_field("description", "Description is required"));
    }
    check_urls("media_urls", &req.media_urls)?;

    let profile = require_creator(&state.db, auth.user_id).await?;

    let workflow = Workflow::create(
        &state.db,
        CreateWorkflow {
            profile_id: profile.id,
            title: req.title,
            description: req.description,
            category: non_blank(req.category),
            tags: req.tags,
            media_urls: req.media_urls,
            workflow_url: non_blank(req.workflow_url),
            draft: req.draft,
        },
    )
    .await?;

    tracing::info!(
        workflow_id = %workflow.id,
        profile_id = %profile.id,
        status = workflow.status.as_str(),
        "Workflow created"
    );

    if workflow.status == WorkflowStatus::Pending {
        notifications::dispatch(
            &state.db,
            NotificationEvent::WorkflowSubmitted {
                workflow_id: workflow.id,
                title: workflow.title.clone(),
                creator_name: profile.display_name,
            },
        )
        .await;
    }

    Ok(Created(workflow))
}

/// Owner edit
///
/// Content changes on an approved or rejected workflow send it back to
/// review; `submit` moves a draft or rejected workflow to `pending`.
pub async fn update_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<UpdateWorkflowRequest>,
) -> ApiResult<Data<Workflow>> {
    let listing = find_visible(&state, id, Some(&auth)).await?;
    if listing.owner_id != auth.user_id {
        return Err(ApiError::Forbidden("Only the owner can edit this workflow".to_string()));
    }

    check_url("workflow_url", req.workflow_url.as_deref(), "Invalid workflow URL")?;
    if let Some(media_urls) = &req.media_urls {
        check_urls("media_urls", media_urls)?;
    }

    let mut changes = UpdateWorkflow {
        title: req.title,
        description: req.description,
        category: clearable(req.category),
        tags: req.tags,
        media_urls: req.media_urls,
        workflow_url: clearable(req.workflow_url),
        status: None,
    };

    let content_changed = !changes.is_empty();
    changes.status = status_after_edit(listing.workflow.status, content_changed, req.submit);

    if changes.is_empty() {
        return Err(ApiError::BadRequest("No changes supplied".to_string()));
    }

    let resubmitted = changes.status == Some(WorkflowStatus::Pending);

    let workflow = Workflow::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Workflow"))?;

    tracing::info!(workflow_id = %id, status = workflow.status.as_str(), "Workflow updated");

    if resubmitted {
        notifications::dispatch(
            &state.db,
            NotificationEvent::WorkflowSubmitted {
                workflow_id: workflow.id,
                title: workflow.title.clone(),
                creator_name: listing.creator_name,
            },
        )
        .await;
    }

    Ok(Data(workflow))
}

pub async fn delete_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let listing = find_visible(&state, id, Some(&auth)).await?;
    require_owner_or_admin(&state.db, auth.user_id, listing.owner_id).await?;

    if !Workflow::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Workflow"));
    }

    tracing::info!(workflow_id = %id, deleted_by = %auth.user_id, "Workflow deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Admin moderation
///
/// Setting the status a workflow already has is a no-op; other disallowed
/// transitions are 409. The owner is notified only when the status changed.
pub async fn set_workflow_status(
    State(state): State<AppState>,
    admin: AdminContext,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<SetStatusRequest>,
) -> ApiResult<Data<Workflow>> {
    let listing = Workflow::find_listing(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workflow"))?;

    let current = listing.workflow.status;
    if current == req.status {
        return Ok(Data(listing.workflow));
    }

    if !current.can_transition_to(req.status) {
        return Err(ApiError::Conflict(format!(
            "Cannot change workflow status from {} to {}",
            current.as_str(),
            req.status.as_str()
        )));
    }

    let reason = match req.status {
        WorkflowStatus::Rejected => non_blank(req.rejection_reason),
        _ => None,
    };

    let workflow = Workflow::transition(&state.db, id, current, req.status, reason.clone())
        .await?
        .ok_or_else(|| ApiError::Conflict("Workflow status changed concurrently".to_string()))?;

    tracing::info!(
        workflow_id = %id,
        admin_id = %admin.user_id,
        from = current.as_str(),
        to = workflow.status.as_str(),
        "Workflow status changed"
    );

    let event = match workflow.status {
        WorkflowStatus::Approved => Some(NotificationEvent::WorkflowApproved {
            owner_id: listing.owner_id,
            workflow_id: workflow.id,
            title: workflow.title.clone(),
        }),
        WorkflowStatus::Rejected => Some(NotificationEvent::WorkflowRejected {
            owner_id: listing.owner_id,
            workflow_id: workflow.id,
            title: workflow.title.clone(),
            reason,
        }),
        _ => None,
    };

    if let Some(event) = event {
        notifications::dispatch(&state.db, event).await;
    }

    Ok(Data(workflow))
}

/// Stars an approved workflow; starring twice counts once
pub async fn star_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<InteractionOutcome>> {
    find_public(&state, id).await?;
    Ok(Data(WorkflowInteraction::add_star(&state.db, id, auth.user_id).await?))
}

pub async fn unstar_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<InteractionOutcome>> {
    find_public(&state, id).await?;
    Ok(Data(WorkflowInteraction::remove_star(&state.db, id, auth.user_id).await?))
}

/// Records a download (once per user) and returns the workflow file URL
pub async fn download_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<DownloadResponse>> {
    let workflow = find_public(&state, id).await?;
    let outcome = WorkflowInteraction::record_download(&state.db, id, auth.user_id).await?;

    Ok(Data(DownloadResponse {
        workflow_url: workflow.workflow_url,
        outcome,
    }))
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub workflow_url: Option<String>,

    #[serde(flatten)]
    pub outcome: InteractionOutcome,
}
