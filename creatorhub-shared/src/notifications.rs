/// Notification fan-out
///
/// Domain events become notification rows: "submitted" events go to every
/// admin, decisions go to the affected user. Delivery is best effort.
/// [`dispatch`] logs insert failures and never returns them, so a broken
/// notification can not fail or roll back the mutation that triggered it.
///
/// # Example
///
/// ```no_run
/// use creatorhub_shared::notifications::{dispatch, NotificationEvent};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, applicant: Uuid, application: Uuid) {
/// dispatch(&pool, NotificationEvent::ApplicationSubmitted {
///     application_id: application,
///     applicant_id: applicant,
///     applicant_name: "Ada".to_string(),
/// })
/// .await;
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification, NotificationPriority, NotificationType};

/// Events that produce notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A user applied to become a creator (to admins)
    ApplicationSubmitted {
        application_id: Uuid,
        applicant_id: Uuid,
        applicant_name: String,
    },

    /// An admin approved a creator application (to the applicant)
    ApplicationApproved { applicant_id: Uuid },

    /// An admin rejected a creator application (to the applicant)
    ApplicationRejected {
        applicant_id: Uuid,
        reason: Option<String>,
    },

    /// A creator submitted a workflow for review (to admins)
    WorkflowSubmitted {
        workflow_id: Uuid,
        title: String,
        creator_name: String,
    },

    /// An admin approved a workflow (to its owner)
    WorkflowApproved {
        owner_id: Uuid,
        workflow_id: Uuid,
        title: String,
    },

    /// An admin rejected a workflow (to its owner)
    WorkflowRejected {
        owner_id: Uuid,
        workflow_id: Uuid,
        title: String,
        reason: Option<String>,
    },
}

/// Who receives a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    User(Uuid),
    Admins,
}

impl NotificationEvent {
    pub fn recipient(&self) -> Recipient {
        match self {
            NotificationEvent::ApplicationSubmitted { .. } | NotificationEvent::WorkflowSubmitted { .. } => {
                Recipient::Admins
            }
            NotificationEvent::ApplicationApproved { applicant_id }
            | NotificationEvent::ApplicationRejected { applicant_id, .. } => Recipient::User(*applicant_id),
            NotificationEvent::WorkflowApproved { owner_id, .. }
            | NotificationEvent::WorkflowRejected { owner_id, .. } => Recipient::User(*owner_id),
        }
    }

    /// Renders the notification content
    pub fn to_notification(&self) -> NewNotification {
        match self {
            NotificationEvent::ApplicationSubmitted {
                application_id,
                applicant_name,
                ..
            } => NewNotification {
                notification_type: NotificationType::ApplicationSubmitted,
                priority: NotificationPriority::High,
                title: "New creator application".to_string(),
                message: format!("{applicant_name} applied to become a creator."),
                link: Some(format!("/admin/applications/{application_id}")),
            },
            NotificationEvent::ApplicationApproved { .. } => NewNotification {
                notification_type: NotificationType::ApplicationApproved,
                priority: NotificationPriority::High,
                title: "Application approved".to_string(),
                message: "Your creator application was approved. You can now publish workflows.".to_string(),
                link: Some("/dashboard".to_string()),
            },
            NotificationEvent::ApplicationRejected { reason, .. } => NewNotification {
                notification_type: NotificationType::ApplicationRejected,
                priority: NotificationPriority::Normal,
                title: "Application not approved".to_string(),
                message: with_reason("Your creator application was not approved.", reason.as_deref()),
                link: Some("/apply".to_string()),
            },
            NotificationEvent::WorkflowSubmitted {
                workflow_id,
                title,
                creator_name,
            } => NewNotification {
                notification_type: NotificationType::WorkflowSubmitted,
                priority: NotificationPriority::Normal,
                title: "Workflow awaiting review".to_string(),
                message: format!("{creator_name} submitted \"{title}\" for review."),
                link: Some(format!("/admin/workflows/{workflow_id}")),
            },
            NotificationEvent::WorkflowApproved { workflow_id, title, .. } => NewNotification {
                notification_type: NotificationType::WorkflowApproved,
                priority: NotificationPriority::Normal,
                title: "Workflow approved".to_string(),
                message: format!("\"{title}\" is now live."),
                link: Some(format!("/workflows/{workflow_id}")),
            },
            NotificationEvent::WorkflowRejected {
                workflow_id,
                title,
                reason,
                ..
            } => NewNotification {
                notification_type: NotificationType::WorkflowRejected,
                priority: NotificationPriority::Normal,
                title: "Workflow not approved".to_string(),
                message: with_reason(&format!("\"{title}\" was not approved."), reason.as_deref()),
                link: Some(format!("/workflows/{workflow_id}")),
            },
        }
    }
}

fn with_reason(message: &str, reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{message} Reason: {reason}"),
        None => message.to_string(),
    }
}

/// Sends one notification to a user
pub async fn notify_user(pool: &PgPool, user_id: Uuid, notification: &NewNotification) -> Result<(), sqlx::Error> {
    Notification::create(pool, user_id, notification).await?;
    Ok(())
}

/// Sends a copy of the notification to every admin
///
/// Returns the number of admins notified.
pub async fn notify_admins(pool: &PgPool, notification: &NewNotification) -> Result<u64, sqlx::Error> {
    Notification::create_for_admins(pool, notification).await
}

/// Delivers an event's notification, logging and swallowing failures
pub async fn dispatch(pool: &PgPool, event: NotificationEvent) {
    let notification = event.to_notification();

    let result = match event.recipient() {
        Recipient::User(user_id) => notify_user(pool, user_id, &notification).await.map(|_| 1),
        Recipient::Admins => notify_admins(pool, &notification).await,
    };

    match result {
        Ok(delivered) => tracing::debug!(
            kind = ?notification.notification_type,
            delivered,
            "Notification dispatched"
        ),
        Err(e) => tracing::warn!(
            kind = ?notification.notification_type,
            error = %e,
            "Failed to create notification"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_lazy_pool, DatabaseConfig};
    use std::time::Duration;

    fn unreachable_pool() -> PgPool {
        create_lazy_pool(&DatabaseConfig {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            min_connections: 0,
            acquire_timeout_seconds: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_swallows_database_errors() {
        let pool = unreachable_pool();

        let events = [
            NotificationEvent::ApplicationApproved {
                applicant_id: Uuid::new_v4(),
            },
            NotificationEvent::WorkflowSubmitted {
                workflow_id: Uuid::new_v4(),
                title: "Sync".to_string(),
                creator_name: "Ada".to_string(),
            },
        ];

        for event in events {
            let delivered = tokio::time::timeout(Duration::from_secs(10), dispatch(&pool, event)).await;
            assert!(delivered.is_ok(), "dispatch must return once the insert fails");
        }
    }

    #[test]
    fn test_submitted_events_go_to_admins() {
        let event = NotificationEvent::ApplicationSubmitted {
            application_id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            applicant_name: "Ada".to_string(),
        };
        assert_eq!(event.recipient(), Recipient::Admins);

        let event = NotificationEvent::WorkflowSubmitted {
            workflow_id: Uuid::new_v4(),
            title: "Sync".to_string(),
            creator_name: "Ada".to_string(),
        };
        assert_eq!(event.recipient(), Recipient::Admins);
    }

    #[test]
    fn test_decisions_go_to_the_affected_user() {
        let applicant = Uuid::new_v4();
        let event = NotificationEvent::ApplicationApproved { applicant_id: applicant };
        assert_eq!(event.recipient(), Recipient::User(applicant));

        let owner = Uuid::new_v4();
        let event = NotificationEvent::WorkflowRejected {
            owner_id: owner,
            workflow_id: Uuid::new_v4(),
            title: "Sync".to_string(),
            reason: None,
        };
        assert_eq!(event.recipient(), Recipient::User(owner));
    }

    #[test]
    fn test_rejection_includes_reason() {
        let n = NotificationEvent::ApplicationRejected {
            applicant_id: Uuid::new_v4(),
            reason: Some("  portfolio link is broken ".to_string()),
        }
        .to_notification();

        assert_eq!(n.notification_type, NotificationType::ApplicationRejected);
        assert!(n.message.ends_with("Reason: portfolio link is broken"));
    }

    #[test]
    fn test_blank_reason_is_omitted() {
        let n = NotificationEvent::WorkflowRejected {
            owner_id: Uuid::new_v4(),
            workflow_id: Uuid::new_v4(),
            title: "Sync".to_string(),
            reason: Some("   ".to_string()),
        }
        .to_notification();

        assert_eq!(n.message, "\"Sync\" was not approved.");
    }

    #[test]
    fn test_workflow_links() {
        let id = Uuid::new_v4();
        let n = NotificationEvent::WorkflowApproved {
            owner_id: Uuid::new_v4(),
            workflow_id: id,
            title: "Sync".to_string(),
        }
        .to_notification();

        assert_eq!(n.link, Some(format!("/workflows/{id}")));
        assert_eq!(n.priority, NotificationPriority::Normal);
    }
}
