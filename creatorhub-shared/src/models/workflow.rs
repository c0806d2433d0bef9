/// Workflow listing model
///
/// A workflow is an automation template published by a creator profile.
/// Only `approved` workflows are visible to the public.
///
/// # State Machine
///
/// ```text
/// draft    → pending
/// pending  → approved | rejected
/// rejected → pending          (owner resubmits)
/// approved → pending          (owner edits content)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE workflow_status AS ENUM ('draft', 'pending', 'approved', 'rejected');
///
/// CREATE TABLE workflows (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     profile_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL,
///     category VARCHAR(100),
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     media_urls TEXT[] NOT NULL DEFAULT '{}',
///     workflow_url VARCHAR(1024),
///     status workflow_status NOT NULL DEFAULT 'pending',
///     rejection_reason TEXT,
///     star_count INTEGER NOT NULL DEFAULT 0,
///     download_count INTEGER NOT NULL DEFAULT 0,
///     approved_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, normalize_labels, Page};

const WORKFLOW_COLUMNS: &str = "id, profile_id, title, description, category, tags, media_urls, \
     workflow_url, status, rejection_reason, star_count, download_count, approved_at, \
     created_at, updated_at";

/// Listing columns prefixed for joins against `profiles p`
const LISTING_SELECT: &str = r#"
    SELECT w.id, w.profile_id, w.title, w.description, w.category, w.tags, w.media_urls,
           w.workflow_url, w.status, w.rejection_reason, w.star_count, w.download_count,
           w.approved_at, w.created_at, w.updated_at,
           p.user_id AS owner_id, p.display_name AS creator_name, p.avatar_url AS creator_avatar_url
    FROM workflows w
    JOIN profiles p ON p.id = w.profile_id
"#;

/// Workflow review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workflow_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Saved by the owner, not submitted
    Draft,

    /// Awaiting admin review
    Pending,

    /// Publicly listed
    Approved,

    /// Sent back by an admin
    Rejected,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::Rejected => "rejected",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, WorkflowStatus::Approved)
    }

    pub fn can_transition_to(&self, target: WorkflowStatus) -> bool {
        use WorkflowStatus::*;

        matches!(
            (self, target),
            (Draft, Pending)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Rejected, Pending)
                | (Approved, Pending)
        )
    }

    /// Status after the owner edits a workflow that was in `self`
    pub fn after_owner_edit(&self) -> WorkflowStatus {
        match self {
            WorkflowStatus::Draft => WorkflowStatus::Draft,
            _ => WorkflowStatus::Pending,
        }
    }
}

/// Workflow row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workflow {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub media_urls: Vec<String>,
    pub workflow_url: Option<String>,
    pub status: WorkflowStatus,
    pub rejection_reason: Option<String>,
    pub star_count: i32,
    pub download_count: i32,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Workflow joined with its creator's public details
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkflowListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub workflow: Workflow,

    /// User who owns the creator profile
    pub owner_id: Uuid,
    pub creator_name: String,
    pub creator_avatar_url: Option<String>,
}

/// Input for creating a workflow
#[derive(Debug, Clone)]
pub struct CreateWorkflow {
    pub profile_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub media_urls: Vec<String>,
    pub workflow_url: Option<String>,

    /// `true` stores a draft instead of submitting for review
    pub draft: bool,
}

/// Owner edits; only `Some` fields change
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkflow {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub media_urls: Option<Vec<String>>,
    pub workflow_url: Option<Option<String>>,
    pub status: Option<WorkflowStatus>,
}

impl UpdateWorkflow {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.media_urls.is_none()
            && self.workflow_url.is_none()
            && self.status.is_none()
    }
}

/// Public catalogue filters
#[derive(Debug, Clone, Default)]
pub struct WorkflowFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,

    /// Restrict to one creator profile
    pub profile_id: Option<Uuid>,

    /// `None` means approved only
    pub status: Option<WorkflowStatus>,

    pub sort: WorkflowSort,
    pub page: Page,
}

/// Catalogue ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowSort {
    #[default]
    Newest,
    Popular,
    Downloads,
}

impl WorkflowSort {
    fn order_by(&self) -> &'static str {
        match self {
            WorkflowSort::Newest => " ORDER BY w.created_at DESC",
            WorkflowSort::Popular => " ORDER BY w.star_count DESC, w.created_at DESC",
            WorkflowSort::Downloads => " ORDER BY w.download_count DESC, w.created_at DESC",
        }
    }
}

impl Workflow {
    pub async fn create(pool: &PgPool, data: CreateWorkflow) -> Result<Self, sqlx::Error> {
        let status = if data.draft {
            WorkflowStatus::Draft
        } else {
            WorkflowStatus::Pending
        };

        sqlx::query_as::<_, Workflow>(&format!(
            r#"
            INSERT INTO workflows
                (profile_id, title, description, category, tags, media_urls, workflow_url, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {WORKFLOW_COLUMNS}
            "#
        ))
        .bind(data.profile_id)
        .bind(data.title.trim())
        .bind(data.description)
        .bind(data.category)
        .bind(normalize_labels(data.tags))
        .bind(data.media_urls)
        .bind(data.workflow_url)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>(&format!(
            "SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Single workflow with its creator details, regardless of status
    pub async fn find_listing(pool: &PgPool, id: Uuid) -> Result<Option<WorkflowListing>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowListing>(&format!("{LISTING_SELECT} WHERE w.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Catalogue query
    pub async fn list(pool: &PgPool, filter: &WorkflowFilter) -> Result<Vec<WorkflowListing>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(LISTING_SELECT);

        query
            .push(" WHERE w.status = ")
            .push_bind(filter.status.unwrap_or(WorkflowStatus::Approved));

        if let Some(profile_id) = filter.profile_id {
            query.push(" AND w.profile_id = ").push_bind(profile_id);
        }

        if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
            query
                .push(" AND LOWER(w.category) = ")
                .push_bind(category.trim().to_lowercase());
        }

        if let Some(tag) = filter.tag.as_deref().filter(|t| !t.trim().is_empty()) {
            query
                .push(" AND ")
                .push_bind(tag.trim().to_lowercase())
                .push(" = ANY(w.tags)");
        }

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search);
            query
                .push(" AND (w.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR w.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset);

        query.build_query_as::<WorkflowListing>().fetch_all(pool).await
    }

    /// Every workflow of a profile, any status (owner dashboard)
    pub async fn list_by_profile(pool: &PgPool, profile_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>(&format!(
            "SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE profile_id = $1 ORDER BY created_at DESC"
        ))
        .bind(profile_id)
        .fetch_all(pool)
        .await
    }

    /// Applies owner edits
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateWorkflow,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE workflows SET updated_at = NOW()");

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(category) = data.category {
            query.push(", category = ").push_bind(category);
        }
        if let Some(tags) = data.tags {
            query.push(", tags = ").push_bind(normalize_labels(tags));
        }
        if let Some(media_urls) = data.media_urls {
            query.push(", media_urls = ").push_bind(media_urls);
        }
        if let Some(workflow_url) = data.workflow_url {
            query.push(", workflow_url = ").push_bind(workflow_url);
        }
        if let Some(status) = data.status {
            query
                .push(", status = ")
                .push_bind(status)
                .push(", rejection_reason = NULL");
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(WORKFLOW_COLUMNS);

        query.build_query_as::<Workflow>().fetch_optional(pool).await
    }

    /// Moves a workflow from `from` to `to`
    ///
    /// Conditional on the current status, so a stale admin view cannot overwrite
    /// a newer decision. Returns `None` when the workflow was not in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        from: WorkflowStatus,
        to: WorkflowStatus,
        rejection_reason: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Workflow>(&format!(
            r#"
            UPDATE workflows
            SET status = $3,
                rejection_reason = $4,
                approved_at = CASE WHEN $3 = 'approved'::workflow_status THEN NOW() ELSE approved_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {WORKFLOW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(rejection_reason)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
