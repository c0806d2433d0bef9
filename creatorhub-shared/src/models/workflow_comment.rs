/// Workflow comments
///
/// ```sql
/// CREATE TABLE workflow_comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     workflow_id UUID NOT NULL REFERENCES workflows(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     body TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::Page;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkflowComment {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Comment with the author's profile name, if they have one
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,
}

impl WorkflowComment {
    pub async fn create(
        pool: &PgPool,
        workflow_id: Uuid,
        user_id: Uuid,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WorkflowComment>(
            r#"
            INSERT INTO workflow_comments (workflow_id, user_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, workflow_id, user_id, body, created_at
            "#,
        )
        .bind(workflow_id)
        .bind(user_id)
        .bind(body.trim())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkflowComment>(
            "SELECT id, workflow_id, user_id, body, created_at FROM workflow_comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Oldest first
    pub async fn list_for_workflow(
        pool: &PgPool,
        workflow_id: Uuid,
        page: Page,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.workflow_id, c.user_id, c.body, c.created_at,
                   p.display_name AS author_name, p.avatar_url AS author_avatar_url
            FROM workflow_comments c
            LEFT JOIN profiles p ON p.user_id = c.user_id
            WHERE c.workflow_id = $1
            ORDER BY c.created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(workflow_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workflow_comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
