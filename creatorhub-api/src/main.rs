//! # Creator Hub API Server
//!
//! Community backend for automation-workflow creators: profiles, creator
//! applications, workflow listings, news, events and notifications.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment
//! 2. Outside production, create the database if it does not exist
//! 3. Connect to PostgreSQL and apply embedded migrations
//! 4. Grant admin to `BOOTSTRAP_ADMIN_EMAIL` if configured
//! 5. Serve until SIGINT/SIGTERM
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p creatorhub-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use creatorhub_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use creatorhub_shared::{
    db::{
        migrations::{ensure_database_exists, migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::{admin_user::AdminUser, user::User},
    storage::LocalObjectStore,
};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "creatorhub_api=debug,creatorhub_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Creator Hub API server starting"
    );

    if !config.api.production {
        if let Err(e) = ensure_database_exists(&config.database.url).await {
            tracing::warn!(error = %e, "Could not create development database");
        }
    }

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool).await.context("Failed to run migrations")?;

    let status = migration_status(&pool).await?;
    tracing::info!(
        applied = status.applied,
        latest_version = ?status.latest_version,
        up_to_date = status.is_up_to_date(),
        "Database schema ready"
    );

    if let Some(email) = config.bootstrap_admin_email.as_deref() {
        bootstrap_admin(&pool, email).await?;
    }

    if AdminUser::count(&pool).await? == 0 {
        tracing::warn!("No admins configured; set BOOTSTRAP_ADMIN_EMAIL to grant one");
    }

    let store = LocalObjectStore::new(&config.storage.root, &config.storage.public_base_url)
        .await
        .context("Failed to initialize upload storage")?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Grants admin to an existing account
async fn bootstrap_admin(pool: &PgPool, email: &str) -> anyhow::Result<()> {
    let Some(user) = User::find_by_email(pool, email).await? else {
        tracing::warn!(email, "Bootstrap admin account does not exist yet; skipping");
        return Ok(());
    };

    if AdminUser::grant(pool, user.id, None).await? {
        tracing::info!(email, user_id = %user.id, "Granted bootstrap admin");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
