/// Database models for Creator Hub
///
/// Each model owns its SQL. Operations are associated functions taking a
/// `&PgPool` (or any `PgExecutor` when they must join a caller's transaction).
///
/// # Models
///
/// - `user`: accounts and credentials
/// - `admin_user`: the admin allow-list
/// - `profile`: creator profiles (1:1 with users)
/// - `creator_application`: requests to become a creator
/// - `workflow`: workflow listings
/// - `workflow_interaction`: stars and downloads
/// - `workflow_comment`: comments on workflows
/// - `news`, `event`: admin-authored content
/// - `notification`: in-app notifications
/// - `featured`: merged homepage content
///
/// # Example
///
/// ```no_run
/// use creatorhub_shared::models::user::{CreateUser, User};
/// use creatorhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "maker@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod admin_user;
pub mod creator_application;
pub mod event;
pub mod featured;
pub mod news;
pub mod notification;
pub mod profile;
pub mod user;
pub mod workflow;
pub mod workflow_comment;
pub mod workflow_interaction;

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page a client may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Limit/offset pair, clamped to sane bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Builds an `ILIKE` pattern matching `term` anywhere, with wildcards escaped
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trims every entry, drops empties and duplicates, keeps first-seen order
pub fn normalize_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim().to_lowercase();
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}
