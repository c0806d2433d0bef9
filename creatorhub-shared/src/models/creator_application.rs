/// Creator application model
///
/// Users apply to become creators; admins approve or reject.
///
/// # State Machine
///
/// ```text
/// pending → approved
/// pending → rejected
/// ```
///
/// Decisions are applied with a conditional `UPDATE … WHERE status = 'pending'`,
/// so of two concurrent approvals only one takes effect and the other observes
/// an already-decided application.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE application_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE creator_applications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     motivation TEXT NOT NULL,
///     portfolio_url VARCHAR(1024),
///     experience TEXT,
///     status application_status NOT NULL DEFAULT 'pending',
///     rejection_reason TEXT,
///     submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     decided_at TIMESTAMPTZ,
///     decided_by UUID REFERENCES users(id) ON DELETE SET NULL
/// );
///
/// CREATE UNIQUE INDEX idx_creator_applications_one_pending
///     ON creator_applications(user_id) WHERE status = 'pending';
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::Page;

const APPLICATION_COLUMNS: &str = "id, user_id, motivation, portfolio_url, experience, status, \
     rejection_reason, submitted_at, decided_at, decided_by";

/// Application lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, target: ApplicationStatus) -> bool {
        matches!(
            (self, target),
            (ApplicationStatus::Pending, ApplicationStatus::Approved)
                | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
        )
    }
}

/// Creator application
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreatorApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub motivation: String,
    pub portfolio_url: Option<String>,
    pub experience: Option<String>,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
}

/// Input for submitting an application
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub user_id: Uuid,
    pub motivation: String,
    pub portfolio_url: Option<String>,
    pub experience: Option<String>,
}

/// Admin decision on a pending application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            Decision::Approved => ApplicationStatus::Approved,
            Decision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

/// Outcome of [`CreatorApplication::decide`]
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    /// The application moved out of `pending` by this call
    Applied(CreatorApplication),

    /// The application had already been decided; nothing changed
    AlreadyDecided(CreatorApplication),
}

impl DecisionOutcome {
    pub fn application(&self) -> &CreatorApplication {
        match self {
            DecisionOutcome::Applied(app) | DecisionOutcome::AlreadyDecided(app) => app,
        }
    }

    pub fn into_application(self) -> CreatorApplication {
        match self {
            DecisionOutcome::Applied(app) | DecisionOutcome::AlreadyDecided(app) => app,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, DecisionOutcome::Applied(_))
    }
}

/// Application joined with the applicant's email and profile name, for admin review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationListing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub motivation: String,
    pub portfolio_url: Option<String>,
    pub experience: Option<String>,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl CreatorApplication {
    /// Submits a new application in `pending`
    ///
    /// # Errors
    ///
    /// A unique violation on `idx_creator_applications_one_pending` when the user
    /// already has a pending application.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateApplication,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CreatorApplication>(&format!(
            r#"
            INSERT INTO creator_applications (user_id, motivation, portfolio_url, experience)
            VALUES ($1, $2, $3, $4)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(data.motivation)
        .bind(data.portfolio_url)
        .bind(data.experience)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CreatorApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM creator_applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// The user's most recent application
    pub async fn find_latest_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CreatorApplication>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM creator_applications
            WHERE user_id = $1
            ORDER BY submitted_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Admin review queue, newest first; `status = None` lists everything
    pub async fn list(
        pool: &PgPool,
        status: Option<ApplicationStatus>,
        page: Page,
    ) -> Result<Vec<ApplicationListing>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationListing>(
            r#"
            SELECT a.id, a.user_id, u.email, p.display_name, a.motivation, a.portfolio_url,
                   a.experience, a.status, a.rejection_reason, a.submitted_at, a.decided_at
            FROM creator_applications a
            JOIN users u ON u.id = a.user_id
            LEFT JOIN profiles p ON p.user_id = a.user_id
            WHERE ($1::application_status IS NULL OR a.status = $1)
            ORDER BY a.submitted_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(pool)
        .await
    }

    /// Applies an admin decision if the application is still pending
    ///
    /// The `status = 'pending'` guard makes concurrent decisions apply once.
    /// Returns `None` when the application does not exist.
    pub async fn decide(
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        decision: Decision,
        reason: Option<String>,
        decided_by: Uuid,
    ) -> Result<Option<DecisionOutcome>, sqlx::Error> {
        let updated = sqlx::query_as::<_, CreatorApplication>(&format!(
            r#"
            UPDATE creator_applications
            SET status = $2,
                rejection_reason = $3,
                decided_at = NOW(),
                decided_by = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.target_status())
        .bind(reason)
        .bind(decided_by)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(app) = updated {
            return Ok(Some(DecisionOutcome::Applied(app)));
        }

        Ok(Self::find_by_id(&mut *conn, id)
            .await?
            .map(DecisionOutcome::AlreadyDecided))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use ApplicationStatus::*;

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Pending));
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(Decision::Approved.target_status(), ApplicationStatus::Approved);
        assert_eq!(Decision::Rejected.target_status(), ApplicationStatus::Rejected);
    }

    #[test]
    fn test_outcome_accessors() {
        let app = CreatorApplication {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            motivation: "I build Slack bots".to_string(),
            portfolio_url: None,
            experience: None,
            status: ApplicationStatus::Approved,
            rejection_reason: None,
            submitted_at: Utc::now(),
            decided_at: Some(Utc::now()),
            decided_by: None,
        };

        let again = DecisionOutcome::AlreadyDecided(app.clone());
        assert!(!again.was_applied());
        assert_eq!(again.application().id, app.id);

        let first = DecisionOutcome::Applied(app.clone());
        assert!(first.was_applied());
        assert_eq!(first.into_application().status, ApplicationStatus::Approved);
    }
}
