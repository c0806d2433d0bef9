/// Community events
///
/// Same visibility rules as news. `upcoming=true` lists events that have not
/// ended yet, soonest first.

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use creatorhub_shared::auth::middleware::{AdminContext, AuthContext};
use creatorhub_shared::models::{
    event::{valid_time_range, CreateEvent, Event, EventFilter, EventStatus, UpdateEvent},
    Page,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiPath, ApiQuery, ApiResult, Created, Data, ValidJson};
use crate::routes::{check_url, clearable, non_blank, require_admin_viewer, viewer_is_admin};

const INVALID_RANGE: &str = "Event cannot end before it starts";

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub status: Option<EventStatus>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub upcoming: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(length(max = 200, message = "Location is too long"))]
    pub location: Option<String>,

    #[validate(url(message = "Invalid event URL"))]
    pub event_url: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,

    #[serde(default = "default_status")]
    pub status: EventStatus,

    #[serde(default)]
    pub featured: bool,
}

fn default_status() -> EventStatus {
    EventStatus::Draft
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Location is too long"))]
    pub location: Option<String>,

    pub event_url: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,

    /// Absent leaves it unchanged, `null` clears it
    #[serde(default, deserialize_with = "nullable")]
    pub ends_at: Option<Option<DateTime<Utc>>>,

    pub status: Option<EventStatus>,
    pub featured: Option<bool>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub async fn list_events(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> ApiResult<Data<Vec<Event>>> {
    if query.status.is_some_and(|status| !status.is_public()) {
        require_admin_viewer(&state, auth.as_ref()).await?;
    }

    let filter = EventFilter {
        status: query.status,
        featured: query.featured,
        upcoming: query.upcoming,
        page: Page::new(query.limit, query.offset),
    };

    Ok(Data(Event::list(&state.db, &filter).await?))
}

pub async fn get_event(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Data<Event>> {
    let event = Event::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event"))?;

    if !event.status.is_public() {
        if !viewer_is_admin(&state, auth.as_ref()).await? {
            return Err(ApiError::not_found("Event"));
        }
        return Ok(Data(event));
    }

    let pool = state.db.clone();
    tokio::spawn(async move {
        if let Err(e) = Event::increment_views(&pool, id).await {
            tracing::warn!(event_id = %id, error = %e, "Failed to record event view");
        }
    });

    Ok(Data(event))
}

pub async fn create_event(
    State(state): State<AppState>,
    admin: AdminContext,
    ValidJson(req): ValidJson<CreateEventRequest>,
) -> ApiResult<Created<Event>> {
    if req.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", "Title is required"));
    }
    if !valid_time_range(req.starts_at, req.ends_at) {
        return Err(ApiError::invalid_field("ends_at", INVALID_RANGE));
    }

    let event = Event::create(
        &state.db,
        CreateEvent {
            author_id: admin.user_id,
            title: req.title,
            description: req.description,
            location: non_blank(req.location),
            event_url: non_blank(req.event_url),
            image_url: non_blank(req.image_url),
            starts_at: req.starts_at,
            ends_at: req.ends_at,
            status: req.status,
            featured: req.featured,
        },
    )
    .await?;

    tracing::info!(event_id = %event.id, starts_at = %event.starts_at, "Event created");

    Ok(Created(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    _admin: AdminContext,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(req): ValidJson<UpdateEventRequest>,
) -> ApiResult<Data<Event>> {
    check_url("event_url", req.event_url.as_deref(), "Invalid event URL")?;
    check_url("image_url", req.image_url.as_deref(), "Invalid image URL")?;

    let current = Event::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event"))?;

    let starts_at = req.starts_at.unwrap_or(current.starts_at);
    let ends_at = req.ends_at.unwrap_or(current.ends_at);
    if !valid_time_range(starts_at, ends_at) {
        return Err(ApiError::invalid_field("ends_at", INVALID_RANGE));
    }

    let status = match req.status {
        Some(target) if target == current.status => None,
        Some(target) if !current.status.can_transition_to(target) => {
            return Err(ApiError::Conflict(format!(
                "Cannot change event status from {} to {}",
                current.status.as_str(),
                target.as_str()
            )));
        }
        other => other,
    };

    let changes = UpdateEvent {
        title: req.title,
        description: req.description,
        location: clearable(req.location),
        event_url: clearable(req.event_url),
        image_url: clearable(req.image_url),
        starts_at: req.starts_at,
        ends_at: req.ends_at,
        status,
        featured: req.featured,
    };

    let event = Event::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Event"))?;

    tracing::info!(event_id = %id, status = event.status.as_str(), "Event updated");

    Ok(Data(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    _admin: AdminContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !Event::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Event"));
    }

    tracing::info!(event_id = %id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}
