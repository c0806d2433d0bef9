/// Stars and downloads
///
/// One row per (workflow, user, kind). The unique constraint
/// `workflow_interactions_unique` makes repeated or concurrent stars and
/// downloads collapse into a single row, and the denormalized counters on
/// `workflows` only move in the same transaction when a row actually changed.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE interaction_type AS ENUM ('star', 'download');
///
/// CREATE TABLE workflow_interactions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     workflow_id UUID NOT NULL REFERENCES workflows(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     interaction_type interaction_type NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT workflow_interactions_unique UNIQUE (workflow_id, user_id, interaction_type)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Interaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Star,
    Download,
}

impl InteractionType {
    /// Counter column on `workflows` kept in sync with this kind
    fn counter_column(&self) -> &'static str {
        match self {
            InteractionType::Star => "star_count",
            InteractionType::Download => "download_count",
        }
    }
}

/// Result of a star/unstar/download call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InteractionOutcome {
    /// `false` when the call was a duplicate (or unstar of a missing star)
    pub changed: bool,

    pub star_count: i32,
    pub download_count: i32,
}

/// Namespace for interaction operations
pub struct WorkflowInteraction;

impl WorkflowInteraction {
    /// Stars a workflow once per user
    pub async fn add_star(pool: &PgPool, workflow_id: Uuid, user_id: Uuid) -> Result<InteractionOutcome, sqlx::Error> {
        Self::record(pool, workflow_id, user_id, InteractionType::Star).await
    }

    /// Records a download once per user
    pub async fn record_download(
        pool: &PgPool,
        workflow_id: Uuid,
        user_id: Uuid,
    ) -> Result<InteractionOutcome, sqlx::Error> {
        Self::record(pool, workflow_id, user_id, InteractionType::Download).await
    }

    /// Removes a star; the counter only drops if a star existed
    pub async fn remove_star(
        pool: &PgPool,
        workflow_id: Uuid,
        user_id: Uuid,
    ) -> Result<InteractionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM workflow_interactions
            WHERE workflow_id = $1 AND user_id = $2 AND interaction_type = 'star'
            "#,
        )
        .bind(workflow_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let changed = deleted > 0;
        let outcome = Self::adjust_counter(&mut tx, workflow_id, InteractionType::Star, changed, -1).await?;

        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn has_starred(pool: &PgPool, workflow_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM workflow_interactions
                WHERE workflow_id = $1 AND user_id = $2 AND interaction_type = 'star'
            )
            "#,
        )
        .bind(workflow_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    async fn record(
        pool: &PgPool,
        workflow_id: Uuid,
        user_id: Uuid,
        kind: InteractionType,
    ) -> Result<InteractionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO workflow_interactions (workflow_id, user_id, interaction_type)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT workflow_interactions_unique DO NOTHING
            "#,
        )
        .bind(workflow_id)
        .bind(user_id)
        .bind(kind)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let changed = inserted > 0;
        let outcome = Self::adjust_counter(&mut tx, workflow_id, kind, changed, 1).await?;

        tx.commit().await?;
        Ok(outcome)
    }

    /// Moves the counter by `delta` when `changed`, and reads back both counters
    async fn adjust_counter(
        conn: &mut PgConnection,
        workflow_id: Uuid,
        kind: InteractionType,
        changed: bool,
        delta: i32,
    ) -> Result<InteractionOutcome, sqlx::Error> {
        let column = kind.counter_column();
        let applied = if changed { delta } else { 0 };

        sqlx::query_as::<_, InteractionOutcome>(&format!(
            r#"
            UPDATE workflows
            SET {column} = GREATEST({column} + $2, 0)
            WHERE id = $1
            RETURNING $3 AS changed, star_count, download_count
            "#
        ))
        .bind(workflow_id)
        .bind(applied)
        .bind(changed)
        .fetch_one(conn)
        .await
    }
}
