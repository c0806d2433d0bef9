/// Community events
///
/// Same visibility rules as news: the public only sees `published` events.
/// Cancelled events stay readable to admins and can only be archived.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE event_status AS ENUM ('draft', 'published', 'archived', 'cancelled');
///
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     author_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL,
///     location VARCHAR(255),
///     event_url VARCHAR(1024),
///     image_url VARCHAR(1024),
///     starts_at TIMESTAMPTZ NOT NULL,
///     ends_at TIMESTAMPTZ,
///     status event_status NOT NULL DEFAULT 'draft',
///     featured BOOLEAN NOT NULL DEFAULT FALSE,
///     view_count BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT events_time_order CHECK (ends_at IS NULL OR ends_at >= starts_at)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::Page;

const EVENT_COLUMNS: &str = "id, author_id, title, description, location, event_url, image_url, \
     starts_at, ends_at, status, featured, view_count, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Archived,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Archived => "archived",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, EventStatus::Published)
    }

    pub fn can_transition_to(&self, target: EventStatus) -> bool {
        use EventStatus::*;

        matches!(
            (self, target),
            (Draft, Published)
                | (Draft, Cancelled)
                | (Draft, Archived)
                | (Published, Archived)
                | (Published, Cancelled)
                | (Archived, Published)
                | (Cancelled, Archived)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub event_url: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: EventStatus,
    pub featured: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub event_url: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: EventStatus,
    pub featured: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Option<String>>,
    pub event_url: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub status: Option<EventStatus>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// `None` means published only
    pub status: Option<EventStatus>,
    pub featured: Option<bool>,

    /// Only events that have not ended yet, soonest first
    pub upcoming: bool,

    pub page: Page,
}

/// Checks that an event does not end before it starts
pub fn valid_time_range(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> bool {
    ends_at.map_or(true, |end| end >= starts_at)
}

impl Event {
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events
                (author_id, title, description, location, event_url, image_url,
                 starts_at, ends_at, status, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(data.author_id)
        .bind(data.title.trim())
        .bind(data.description)
        .bind(data.location)
        .bind(data.event_url)
        .bind(data.image_url)
        .bind(data.starts_at)
        .bind(data.ends_at)
        .bind(data.status)
        .bind(data.featured)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filter: &EventFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE status = "));
        query.push_bind(filter.status.unwrap_or(EventStatus::Published));

        if let Some(featured) = filter.featured {
            query.push(" AND featured = ").push_bind(featured);
        }

        if filter.upcoming {
            query.push(" AND COALESCE(ends_at, starts_at) >= NOW() ORDER BY starts_at ASC");
        } else {
            query.push(" ORDER BY starts_at DESC");
        }

        query
            .push(" LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset);

        query.build_query_as::<Event>().fetch_all(pool).await
    }

    /// Featured, published events for the home page
    pub async fn list_featured(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE status = 'published' AND featured = TRUE
            ORDER BY starts_at DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateEvent) -> Result<Option<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE events SET updated_at = NOW()");

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(location) = data.location {
            query.push(", location = ").push_bind(location);
        }
        if let Some(event_url) = data.event_url {
            query.push(", event_url = ").push_bind(event_url);
        }
        if let Some(image_url) = data.image_url {
            query.push(", image_url = ").push_bind(image_url);
        }
        if let Some(starts_at) = data.starts_at {
            query.push(", starts_at = ").push_bind(starts_at);
        }
        if let Some(ends_at) = data.ends_at {
            query.push(", ends_at = ").push_bind(ends_at);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(featured) = data.featured {
            query.push(", featured = ").push_bind(featured);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(EVENT_COLUMNS);

        query.build_query_as::<Event>().fetch_optional(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomic view increment
    pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE events SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
