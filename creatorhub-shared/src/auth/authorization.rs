/// Authorization checks
///
/// Two roles exist beyond "signed in":
///
/// 1. **Admin**: the user has a row in `admin_users`
/// 2. **Creator**: the user's profile is `approved`
///
/// Resource ownership (workflows, comments) is checked with
/// [`require_owner_or_admin`].
///
/// # Example
///
/// ```no_run
/// use creatorhub_shared::auth::authorization::{require_admin, require_owner_or_admin};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn check(pool: &PgPool, caller: Uuid, owner: Uuid) -> Result<(), Box<dyn std::error::Error>> {
///     require_owner_or_admin(pool, caller, owner).await?;
///     require_admin(pool, caller).await?;
///     Ok(())
/// }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::admin_user::AdminUser;
use crate::models::profile::Profile;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Admin access required")]
    NotAdmin,

    #[error("Not authorized to access this resource")]
    NotOwner,

    #[error("An approved creator profile is required")]
    NotCreator,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks the admin allow-list
pub async fn is_admin(pool: &PgPool, user_id: Uuid) -> Result<bool, AuthzError> {
    Ok(AdminUser::is_admin(pool, user_id).await?)
}

/// Fails with [`AuthzError::NotAdmin`] unless the user is an admin
pub async fn require_admin(pool: &PgPool, user_id: Uuid) -> Result<(), AuthzError> {
    if !is_admin(pool, user_id).await? {
        return Err(AuthzError::NotAdmin);
    }

    Ok(())
}

/// Passes for the resource owner without a database round trip, otherwise
/// requires admin
pub async fn require_owner_or_admin(pool: &PgPool, user_id: Uuid, owner_id: Uuid) -> Result<(), AuthzError> {
    if user_id == owner_id {
        return Ok(());
    }

    match require_admin(pool, user_id).await {
        Err(AuthzError::NotAdmin) => Err(AuthzError::NotOwner),
        other => other,
    }
}

/// Returns the caller's profile if it is an approved creator
pub async fn require_creator(pool: &PgPool, user_id: Uuid) -> Result<Profile, AuthzError> {
    match Profile::find_by_user(pool, user_id).await? {
        Some(profile) if profile.status.is_creator() => Ok(profile),
        _ => Err(AuthzError::NotCreator),
    }
}
