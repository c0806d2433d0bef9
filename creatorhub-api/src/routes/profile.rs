/// The caller's own profile
///
/// `PUT` creates the profile on first use. Profile status is not writable
/// here; it follows the creator application flow.

use axum::extract::State;
use creatorhub_shared::auth::middleware::AuthContext;
use creatorhub_shared::models::profile::{Profile, UpsertProfile};
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, Data, ValidJson};
use crate::routes::non_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: String,

    #[validate(length(max = 5000, message = "Bio is too long"))]
    pub bio: Option<String>,

    #[validate(url(message = "Invalid avatar URL"))]
    pub avatar_url: Option<String>,

    #[validate(url(message = "Invalid website URL"))]
    pub website_url: Option<String>,

    #[validate(length(max = 30, message = "At most 30 skills"))]
    #[serde(default)]
    pub skills: Vec<String>,
}

pub async fn get_profile(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Data<Profile>> {
    let profile = Profile::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile"))?;

    Ok(Data(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Data<Profile>> {
    if req.display_name.trim().is_empty() {
        return Err(ApiError::invalid_field("display_name", "Display name is required"));
    }

    let profile = Profile::upsert_for_user(
        &state.db,
        auth.user_id,
        UpsertProfile {
            display_name: req.display_name,
            bio: non_blank(req.bio),
            avatar_url: non_blank(req.avatar_url),
            website_url: non_blank(req.website_url),
            skills: req.skills,
        },
    )
    .await?;

    tracing::debug!(user_id = %auth.user_id, profile_id = %profile.id, "Profile saved");

    Ok(Data(profile))
}
