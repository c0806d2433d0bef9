/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: HS256 access/refresh tokens
/// - [`middleware`]: Axum extractors and the `require_auth` layer
/// - [`authorization`]: admin, owner and creator checks
///
/// # Example
///
/// ```no_run
/// use creatorhub_shared::auth::jwt::{issue_token_pair, validate_access_token};
/// use creatorhub_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse 1")?;
/// assert!(verify_password("correct horse 1", &hash)?);
///
/// let secret = "a-secret-of-at-least-thirty-two-bytes";
/// let tokens = issue_token_pair(Uuid::new_v4(), secret)?;
/// let claims = validate_access_token(&tokens.access_token, secret)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
