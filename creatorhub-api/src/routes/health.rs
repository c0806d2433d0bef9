/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// ```
///
/// Always answers 200 so load balancers can tell "process up" from
/// "database down"; `status` is `degraded` when the database is unreachable.

use axum::{extract::State, Json};
use creatorhub_shared::db::pool::{health_check as db_health_check, pool_stats};
use serde::{Deserialize, Serialize};

use crate::app::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub db_connections: u32,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match db_health_check(&state.db).await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach database");
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: if database == "connected" { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        db_connections: pool_stats(&state.db).total_connections,
    })
}
