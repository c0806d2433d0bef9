/// Creator profile model
///
/// Every user may have one profile. A profile becomes a *creator* once its
/// status is `approved`, which happens when an admin approves the user's
/// creator application; only creators can publish workflows.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE profile_status AS ENUM ('draft', 'pending', 'approved', 'rejected');
///
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     display_name VARCHAR(100) NOT NULL,
///     bio TEXT,
///     avatar_url VARCHAR(1024),
///     website_url VARCHAR(1024),
///     skills TEXT[] NOT NULL DEFAULT '{}',
///     status profile_status NOT NULL DEFAULT 'draft',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, normalize_labels, Page};

const PROFILE_COLUMNS: &str =
    "id, user_id, display_name, bio, avatar_url, website_url, skills, status, created_at, updated_at";

/// Profile approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    /// Created, no application yet
    Draft,

    /// Application submitted
    Pending,

    /// Approved creator
    Approved,

    /// Application rejected
    Rejected,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Draft => "draft",
            ProfileStatus::Pending => "pending",
            ProfileStatus::Approved => "approved",
            ProfileStatus::Rejected => "rejected",
        }
    }

    pub fn is_creator(&self) -> bool {
        matches!(self, ProfileStatus::Approved)
    }
}

/// Creator profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website_url: Option<String>,
    pub skills: Vec<String>,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a user may set on their own profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertProfile {
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website_url: Option<String>,
    pub skills: Vec<String>,
}

/// Creator directory filters
#[derive(Debug, Clone, Default)]
pub struct CreatorFilter {
    /// Matches display name or bio
    pub search: Option<String>,

    /// Exact (lowercase) skill
    pub skill: Option<String>,

    pub page: Page,
}

/// Directory entry: an approved profile plus its approved workflow count
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreatorSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub skills: Vec<String>,
    pub workflow_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Creates or updates the caller's profile
    ///
    /// Status is never touched here; it only moves through the application flow.
    pub async fn upsert_for_user(
        pool: &PgPool,
        user_id: Uuid,
        data: UpsertProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (user_id, display_name, bio, avatar_url, website_url, skills)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                bio = EXCLUDED.bio,
                avatar_url = EXCLUDED.avatar_url,
                website_url = EXCLUDED.website_url,
                skills = EXCLUDED.skills,
                updated_at = NOW()
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(data.display_name.trim())
        .bind(data.bio)
        .bind(data.avatar_url)
        .bind(data.website_url)
        .bind(normalize_labels(data.skills))
        .fetch_one(pool)
        .await
    }

    /// Sets the status of a user's profile, creating a placeholder profile if needed
    ///
    /// Used inside the application decision transaction; `fallback_name` becomes
    /// the display name of a freshly created profile.
    pub async fn set_status_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        status: ProfileStatus,
        fallback_name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (user_id, display_name, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(fallback_name)
        .bind(status)
        .fetch_one(executor)
        .await
    }

    /// Approved creators for the public directory, newest first
    pub async fn list_creators(
        pool: &PgPool,
        filter: &CreatorFilter,
    ) -> Result<Vec<CreatorSummary>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT p.id, p.user_id, p.display_name, p.bio, p.avatar_url, p.skills, p.created_at,
                   (SELECT COUNT(*) FROM workflows w
                     WHERE w.profile_id = p.id AND w.status = 'approved') AS workflow_count
            FROM profiles p
            WHERE p.status = 'approved'
            "#,
        );

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search);
            query
                .push(" AND (p.display_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.bio ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(skill) = filter.skill.as_deref().filter(|s| !s.trim().is_empty()) {
            query
                .push(" AND ")
                .push_bind(skill.trim().to_lowercase())
                .push(" = ANY(p.skills)");
        }

        query
            .push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(filter.page.limit)
            .push(" OFFSET ")
            .push_bind(filter.page.offset);

        query.build_query_as::<CreatorSummary>().fetch_all(pool).await
    }
}
