/// Public creator directory

use axum::extract::State;
use creatorhub_shared::models::{
    Page,
    profile::{CreatorFilter, CreatorSummary, Profile},
    workflow::Workflow,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiQuery, ApiResult, Data};

#[derive(Debug, Default, Deserialize)]
pub struct CreatorQuery {
    pub search: Option<String>,
    pub skill: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Approved creator with their approved workflows
#[derive(Debug, Serialize)]
pub struct CreatorDetail {
    #[serde(flatten)]
    pub profile: Profile,
    pub workflows: Vec<Workflow>,
}

pub async fn list_creators(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CreatorQuery>,
) -> ApiResult<Data<Vec<CreatorSummary>>> {
    let filter = CreatorFilter {
        search: query.search,
        skill: query.skill,
        page: Page::new(query.limit, query.offset),
    };

    Ok(Data(Profile::list_creators(&state.db, &filter).await?))
}

/// Profiles that are not approved creators are reported as missing
pub async fn get_creator(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<CreatorDetail>> {
    let profile = Profile::find_by_id(&state.db, id)
        .await?
        .filter(|p| p.status.is_creator())
        .ok_or_else(|| ApiError::not_found("Creator"))?;

    let workflows = Workflow::list_by_profile(&state.db, profile.id)
        .await?
        .into_iter()
        .filter(|w| w.status.is_public())
        .collect();

    Ok(Data(CreatorDetail { profile, workflows }))
}
