/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use creatorhub_api::{app::{build_router, AppState}, config::Config};
/// use creatorhub_shared::storage::LocalObjectStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let store = LocalObjectStore::new(&config.storage.root, &config.storage.public_base_url).await?;
/// let app = build_router(AppState::new(pool, config, Arc::new(store)));
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use creatorhub_shared::auth::middleware::{require_auth, AuthState};
use creatorhub_shared::storage::ObjectStore;
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};

/// Multipart overhead allowed on top of the upload size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            store,
        }
    }
}

impl AuthState for AppState {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    fn db(&self) -> &PgPool {
        &self.db
    }
}

/// Builds the complete router
///
/// # Architecture
///
/// ```text
/// /health
/// /storage/*                         uploaded files
/// /api
/// ├── /auth                          register, login, refresh, me, password
/// ├── /profile                       caller's profile
/// ├── /creators                      public creator directory
/// ├── /creator-applications          apply, review
/// ├── /workflows                     catalogue, stars, downloads, comments
/// ├── /news, /events, /featured      admin-authored content
/// ├── /notifications                 caller's notifications (require_auth)
/// ├── /uploads/:bucket               multipart uploads
/// └── /admin                         workflow queue, admin allow-list
/// ```
///
/// Access levels are declared by each handler's extractors (`AuthContext`,
/// `AdminContext`, `Option<AuthContext>`).
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me))
        .route("/password", post(routes::auth::change_password));

    let creator_routes = Router::new()
        .route("/", get(routes::creators::list_creators))
        .route("/:id", get(routes::creators::get_creator));

    let application_routes = Router::new()
        .route(
            "/",
            post(routes::applications::submit_application).get(routes::applications::list_applications),
        )
        .route("/me", get(routes::applications::my_application))
        .route("/:id", patch(routes::applications::decide_application));

    let workflow_routes = Router::new()
        .route(
            "/",
            get(routes::workflows::list_workflows).post(routes::workflows::create_workflow),
        )
        .route("/mine", get(routes::workflows::my_workflows))
        .route(
            "/:id",
            get(routes::workflows::get_workflow)
                .patch(routes::workflows::update_workflow)
                .delete(routes::workflows::delete_workflow),
        )
        .route("/:id/status", patch(routes::workflows::set_workflow_status))
        .route(
            "/:id/star",
            post(routes::workflows::star_workflow).delete(routes::workflows::unstar_workflow),
        )
        .route("/:id/download", post(routes::workflows::download_workflow))
        .route(
            "/:id/comments",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route("/:id/comments/:comment_id", delete(routes::comments::delete_comment));

    let news_routes = Router::new()
        .route("/", get(routes::news::list_news).post(routes::news::create_news))
        .route(
            "/:id",
            get(routes::news::get_news)
                .patch(routes::news::update_news)
                .delete(routes::news::delete_news),
        );

    let event_routes = Router::new()
        .route("/", get(routes::events::list_events).post(routes::events::create_event))
        .route(
            "/:id",
            get(routes::events::get_event)
                .patch(routes::events::update_event)
                .delete(routes::events::delete_event),
        );

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route("/unread-count", get(routes::notifications::unread_count))
        .route("/read-all", post(routes::notifications::mark_all_read))
        .route("/:id/read", patch(routes::notifications::mark_read))
        .route("/:id", delete(routes::notifications::delete_notification))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<AppState>));

    let upload_routes = Router::new()
        .route("/:bucket", post(routes::uploads::upload))
        .layer(DefaultBodyLimit::max(
            state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ));

    let admin_routes = Router::new()
        .route("/workflows", get(routes::workflows::admin_list_workflows))
        .route(
            "/admins",
            get(routes::admins::list_admins).post(routes::admins::grant_admin),
        )
        .route("/admins/:user_id", delete(routes::admins::revoke_admin));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .nest("/creators", creator_routes)
        .nest("/creator-applications", application_routes)
        .nest("/workflows", workflow_routes)
        .nest("/news", news_routes)
        .nest("/events", event_routes)
        .route("/featured", get(routes::featured::get_featured))
        .nest("/notifications", notification_routes)
        .nest("/uploads", upload_routes)
        .nest("/admin", admin_routes);

    let storage = ServeDir::new(&state.config.storage.root);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .nest_service("/storage", storage)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive CORS for `*`, otherwise an explicit origin list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
