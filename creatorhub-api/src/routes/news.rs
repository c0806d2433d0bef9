/// News articles
///
/// Published articles are public; drafts and archived articles are visible
/// to admins only. Reading a published article bumps its view counter in
/// the background.

use axum::{extract::State, http::StatusCode};
use creatorhub_shared::auth::middleware::{AdminContext, AuthContext};
use creatorhub_shared::models::{
    news::{CreateNews, News, NewsFilter, NewsStatus, UpdateNews},
    Page,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiQuery, ApiResult, Created, Data, ValidJson};
use crate::routes::{check_url, clearable, non_blank, require_admin_viewer, viewer_is_admin};

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    /// Non-published statuses require admin
    pub status: Option<NewsStatus>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNewsRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 500, message = "Summary is too long"))]
    pub summary: Option<String>,

    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    #[serde(default = "default_status")]
    pub status: NewsStatus,

    #[serde(default)]
    pub featured: bool,
}

fn default_status() -> NewsStatus {
    NewsStatus::Draft
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateNewsRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Summary is too long"))]
    pub summary: Option<String>,

    #[validate(length(min = 1, message = "Body must not be empty"))]
    pub body: Option<String>,

    /// Blank clears the image
    pub image_url: Option<String>,
    pub status: Option<NewsStatus>,
    pub featured: Option<bool>,
}

pub async fn list_news(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ApiQuery(query): ApiQuery<NewsQuery>,
) -> ApiResult<Data<Vec<News>>> {
    if query.status.is_some_and(|status| !status.is_public()) {
        require_admin_viewer(&state, auth.as_ref()).await?;
    }

    let filter = NewsFilter {
        status: query.status,
        featured: query.featured,
        page: Page::new(query.limit, query.offset),
    };

    Ok(Data(News::list(&state.db, &filter).await?))
}

/// Unpublished articles are 404 unless the caller is an admin
pub async fn get_news(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<News>> {
    let news = News::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("News article"))?;

    if !news.status.is_public() {
        if !viewer_is_admin(&state, auth.as_ref()).await? {
            return Err(ApiError::not_found("News article"));
        }
        return Ok(Data(news));
    }

    let pool = state.db.clone();
    tokio::spawn(async move {
        if let Err(e) = News::increment_views(&pool, id).await {
            tracing::warn!(news_id = %id, error = %e, "Failed to record news view");
        }
    });

    Ok(Data(news))
}

pub async fn create_news(
    State(state): State<AppState>,
    admin: AdminContext,
    ValidJson(req): ValidJson<CreateNewsRequest>,
) -> ApiResult<Created<News>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", "Title is required"));
    }

    let news = News::create(
        &state.db,
        CreateNews {
            author_id: admin.user_id,
            title: req.title,
            summary: non_blank(req.summary),
            body: req.body,
            image_url: non_blank(req.image_url),
            status: req.status,
            featured: req.featured,
        },
    )
    .await?;

    tracing::info!(news_id = %news.id, status = news.status.as_str(), "News article created");

    Ok(Created(news))
}

/// Partial update; status changes follow [`NewsStatus::can_transition_to`]
pub async fn update_news(
    State(state): State<AppState>,
    _admin: AdminContext,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<UpdateNewsRequest>,
) -> ApiResult<Data<News>> {
    check_url("image_url", req.image_url.as_deref(), "Invalid image URL")?;

    let current = News::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("News article"))?;

    let status = match req.status {
        Some(target) if target == current.status => None,
        Some(target) if !current.status.can_transition_to(target) => {
            return Err(ApiError::Conflict(format!(
                "Cannot change news status from {} to {}",
                current.status.as_str(),
                target.as_str()
            )));
        }
        other => other,
    };

    let changes = UpdateNews {
        title: req.title,
        summary: clearable(req.summary),
        body: req.body,
        image_url: clearable(req.image_url),
        status,
        featured: req.featured,
    };

    let news = News::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("News article"))?;

    tracing::info!(news_id = %id, status = news.status.as_str(), "News article updated");

    Ok(Data(news))
}

pub async fn delete_news(
    State(state): State<AppState>,
    _admin: AdminContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !News::delete(&state.db, id).await? {
        return Err(ApiError::not_found("News article"));
    }

    tracing::info!(news_id = %id, "News article deleted");

    Ok(StatusCode::NO_CONTENT)
}
