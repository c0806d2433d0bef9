/// Creator applications
///
/// A user applies once at a time; admins approve or reject. Decisions are
/// conditional on the application still being pending, so a repeated or
/// concurrent approval changes nothing and notifies nobody.

use axum::extract::State;
use creatorhub_shared::auth::middleware::{AdminContext, AuthContext};
use creatorhub_shared::models::{
    creator_application::{
        ApplicationListing, ApplicationStatus, CreateApplication, CreatorApplication, Decision,
        DecisionOutcome,
    },
    profile::{Profile, ProfileStatus},
    user::User,
    Page,
};
use creatorhub_shared::notifications::{self, NotificationEvent};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiQuery, ApiResult, Created, Data, ValidJson};
use crate::routes::non_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitApplicationRequest {
    #[validate(length(min = 1, max = 5000, message = "Motivation is required (max 5000 characters)"))]
    pub motivation: String,

    #[validate(url(message = "Invalid portfolio URL"))]
    pub portfolio_url: Option<String>,

    #[validate(length(max = 5000, message = "Experience is too long"))]
    pub experience: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DecideApplicationRequest {
    pub status: Decision,

    #[validate(length(max = 2000, message = "Rejection reason is too long"))]
    pub rejection_reason: Option<String>,
}

/// Display name used when an applicant has no profile yet
fn fallback_name(user: &User) -> String {
    user.email.split('@').next().unwrap_or_default().to_string()
}

/// Submits an application and alerts admins
///
/// # Errors
///
/// - `409`: a pending application exists, or the caller already is a creator
pub async fn submit_application(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<SubmitApplicationRequest>,
) -> ApiResult<Created<CreatorApplication>> {
    if req.motivation.trim().is_empty() {
        return Err(ApiError::invalid_field("motivation", "Motivation is required"));
    }

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let existing = Profile::find_by_user(&state.db, auth.user_id).await?;
    if existing.as_ref().is_some_and(|p| p.status.is_creator()) {
        return Err(ApiError::Conflict("You are already an approved creator".to_string()));
    }

    let applicant_name = existing
        .map(|p| p.display_name)
        .unwrap_or_else(|| fallback_name(&user));

    let mut tx = state.db.begin().await?;

    let application = CreatorApplication::create(
        &mut *tx,
        CreateApplication {
            user_id: auth.user_id,
            motivation: req.motivation.trim().to_string(),
            portfolio_url: non_blank(req.portfolio_url),
            experience: non_blank(req.experience),
        },
    )
    .await?;

    Profile::set_status_for_user(&mut *tx, auth.user_id, ProfileStatus::Pending, &applicant_name).await?;

    tx.commit().await?;

    tracing::info!(
        application_id = %application.id,
        user_id = %auth.user_id,
        "Creator application submitted"
    );

    notifications::dispatch(
        &state.db,
        NotificationEvent::ApplicationSubmitted {
            application_id: application.id,
            applicant_id: auth.user_id,
            applicant_name,
        },
    )
    .await;

    Ok(Created(application))
}

/// The caller's latest application
pub async fn my_application(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Data<CreatorApplication>> {
    let application = CreatorApplication::find_latest_for_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    Ok(Data(application))
}

/// Admin review queue
pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminContext,
    ApiQuery(query): ApiQuery<ApplicationQuery>,
) -> ApiResult<Data<Vec<ApplicationListing>>> {
    let applications =
        CreatorApplication::list(&state.db, query.status, Page::new(query.limit, query.offset)).await?;

    Ok(Data(applications))
}

/// Approves or rejects a pending application
///
/// The application and the applicant's profile change in one transaction.
/// Deciding an already-decided application returns it unchanged.
pub async fn decide_application(
    State(state): State<AppState>,
    admin: AdminContext,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<DecideApplicationRequest>,
) -> ApiResult<Data<CreatorApplication>> {
    let current = CreatorApplication::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    if !current.status.can_transition_to(req.status.target_status()) {
        tracing::debug!(application_id = %id, status = current.status.as_str(), "Application already decided");
        return Ok(Data(current));
    }

    let applicant = User::find_by_id(&state.db, current.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Applicant"))?;

    let reason = match req.status {
        Decision::Rejected => non_blank(req.rejection_reason),
        Decision::Approved => None,
    };

    let mut tx = state.db.begin().await?;

    let outcome = CreatorApplication::decide(&mut tx, id, req.status, reason.clone(), admin.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    if let DecisionOutcome::Applied(application) = &outcome {
        let profile_status = match req.status {
            Decision::Approved => ProfileStatus::Approved,
            Decision::Rejected => ProfileStatus::Rejected,
        };

        Profile::set_status_for_user(&mut *tx, application.user_id, profile_status, &fallback_name(&applicant))
            .await?;
    }

    tx.commit().await?;

    if !outcome.was_applied() {
        tracing::debug!(
            application_id = %id,
            status = outcome.application().status.as_str(),
            "Application decided concurrently"
        );
        return Ok(Data(outcome.into_application()));
    }

    let application = outcome.into_application();

    tracing::info!(
        application_id = %id,
        applicant_id = %application.user_id,
        admin_id = %admin.user_id,
        status = application.status.as_str(),
        "Creator application decided"
    );

    let event = match req.status {
        Decision::Approved => NotificationEvent::ApplicationApproved {
            applicant_id: application.user_id,
        },
        Decision::Rejected => NotificationEvent::ApplicationRejected {
            applicant_id: application.user_id,
            reason,
        },
    };
    notifications::dispatch(&state.db, event).await;

    Ok(Data(application))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_fallback_name_is_email_local_part() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        assert_eq!(fallback_name(&user), "ada");
    }

    #[test]
    fn test_decision_request_parses() {
        let req: DecideApplicationRequest =
            serde_json::from_str(r#"{"status":"rejected","rejection_reason":"Needs a portfolio"}"#).unwrap();
        assert_eq!(req.status, Decision::Rejected);

        assert!(serde_json::from_str::<DecideApplicationRequest>(r#"{"status":"pending"}"#).is_err());
    }
}
