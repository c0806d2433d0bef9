/// Admin allow-list
///
/// A user is an admin exactly when a row with their id exists here.
///
/// ```sql
/// CREATE TABLE admin_users (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     granted_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     granted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, PgExecutor, PgPool, Postgres};
use uuid::Uuid;

/// Allow-list entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminUser {
    pub user_id: Uuid,
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

/// Allow-list entry joined with the account email
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminListing {
    pub user_id: Uuid,
    pub email: String,
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

/// Result of [`AdminUser::revoke`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,

    /// The user was not on the allow-list
    NotAdmin,

    /// The user is the only admin left
    LastAdmin,
}

fn revoke_outcome(admins: &[Uuid], user_id: Uuid) -> RevokeOutcome {
    if !admins.contains(&user_id) {
        RevokeOutcome::NotAdmin
    } else if admins.len() == 1 {
        RevokeOutcome::LastAdmin
    } else {
        RevokeOutcome::Revoked
    }
}

impl AdminUser {
    /// Checks allow-list membership
    pub async fn is_admin<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM admin_users WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }

    /// Adds a user to the allow-list
    ///
    /// Returns `false` when the user already was an admin.
    pub async fn grant(
        pool: &PgPool,
        user_id: Uuid,
        granted_by: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO admin_users (user_id, granted_by)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(granted_by)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a user from the allow-list unless they are the last admin
    ///
    /// Locks every allow-list row (in `user_id` order) before deciding, so
    /// concurrent revocations are serialized and cannot empty the list.
    /// Accepts a pool or an open transaction; in the latter case the work
    /// runs in a savepoint.
    pub async fn revoke<'a, A>(conn: A, user_id: Uuid) -> Result<RevokeOutcome, sqlx::Error>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let admins: Vec<Uuid> = sqlx::query_scalar("SELECT user_id FROM admin_users ORDER BY user_id FOR UPDATE")
            .fetch_all(&mut *tx)
            .await?;

        let outcome = revoke_outcome(&admins, user_id);
        if outcome != RevokeOutcome::Revoked {
            return Ok(outcome);
        }

        sqlx::query("DELETE FROM admin_users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(RevokeOutcome::Revoked)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(pool)
            .await
    }

    /// All admins, oldest grant first
    pub async fn list(pool: &PgPool) -> Result<Vec<AdminListing>, sqlx::Error> {
        sqlx::query_as::<_, AdminListing>(
            r#"
            SELECT a.user_id, u.email, a.granted_by, a.granted_at
            FROM admin_users a
            JOIN users u ON u.id = a.user_id
            ORDER BY a.granted_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
