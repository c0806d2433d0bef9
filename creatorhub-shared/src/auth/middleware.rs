/// Request authentication for Axum
///
/// Authentication happens in extractors, so each handler states the access
/// level it needs in its signature:
///
/// - [`AuthContext`]: a valid access token is required (401 otherwise)
/// - [`AdminContext`]: a valid token *and* an `admin_users` row (403 otherwise)
/// - `Option<AuthContext>`: public routes that personalise output for signed-in users
///
/// Route groups that are entirely authenticated can additionally be wrapped in
/// [`require_auth`], which rejects early and stores the context in request
/// extensions for the extractors to reuse.
///
/// The router state must implement [`AuthState`].
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use creatorhub_shared::auth::middleware::{AdminContext, AuthContext, AuthState};
/// use sqlx::PgPool;
///
/// #[derive(Clone)]
/// struct State {
///     db: PgPool,
///     secret: String,
/// }
///
/// impl AuthState for State {
///     fn jwt_secret(&self) -> &str {
///         &self.secret
///     }
///
///     fn db(&self) -> &PgPool {
///         &self.db
///     }
/// }
///
/// async fn me(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// async fn dashboard(admin: AdminContext) -> String {
///     format!("Hello, admin {}!", admin.user_id)
/// }
///
/// # fn build(state: State) -> Router {
/// Router::new()
///     .route("/me", get(me))
///     .route("/admin", get(dashboard))
///     .with_state(state)
/// # }
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::authorization::is_admin;
use super::jwt::{validate_access_token, JwtError};

/// State the auth extractors need from the application
pub trait AuthState: Send + Sync {
    /// HS256 signing secret
    fn jwt_secret(&self) -> &str;

    /// Pool used for the admin allow-list lookup
    fn db(&self) -> &PgPool;
}

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Access token expiry (Unix seconds)
    pub expires_at: i64,
}

/// Authenticated caller on the admin allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminContext {
    pub user_id: Uuid,
}

impl From<AdminContext> for AuthContext {
    fn from(admin: AdminContext) -> Self {
        AuthContext {
            user_id: admin.user_id,
            expires_at: 0,
        }
    }
}

/// Authentication failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("Admin access required")]
    Forbidden,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials | AuthError::InvalidFormat(_) | AuthError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials | AuthError::InvalidFormat(_) | AuthError::InvalidToken(_) => {
                "unauthenticated"
            }
            AuthError::Forbidden => "forbidden",
            AuthError::DatabaseError(_) => "internal_error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database error during authentication");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": message,
            "code": self.code(),
        });

        (self.status(), Json(body)).into_response()
    }
}

/// Validates the `Authorization: Bearer <token>` header
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::WrongTokenType { .. } => AuthError::InvalidToken("Access token required".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        expires_at: claims.exp,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: AuthState,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<AuthContext>() {
            return Ok(*auth);
        }

        authenticate(&parts.headers, state.jwt_secret())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminContext
where
    S: AuthState,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;

        let admin = is_admin(state.db(), auth.user_id)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if !admin {
            tracing::debug!(user_id = %auth.user_id, "Rejected non-admin caller");
            return Err(AuthError::Forbidden);
        }

        Ok(AdminContext { user_id: auth.user_id })
    }
}

/// Rejects unauthenticated requests for a whole route group
///
/// ```no_run
/// # use axum::{middleware, Router};
/// # use creatorhub_shared::auth::middleware::{require_auth, AuthState};
/// # fn wrap<S: AuthState + Clone + 'static>(routes: Router<S>, state: S) -> Router<S> {
/// routes.route_layer(middleware::from_fn_with_state(state, require_auth::<S>))
/// # }
/// ```
pub async fn require_auth<S>(State(state): State<S>, mut req: Request, next: Next) -> Result<Response, AuthError>
where
    S: AuthState + Clone,
{
    let auth = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
