use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub migrations_applied: usize,
    pub migrations_total: usize,
}

/// Liveness plus a probe of the default database. 503 when it is down.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let mut database = DatabaseHealth {
        connected: false,
        migrations_applied: 0,
        migrations_total: 0,
    };

    if let Ok(db) = state.databases.resolve(state.databases.default_url()).await {
        database.connected = db.health_check().await;
        if let Ok((total, applied)) = db.migration_status().await {
            database.migrations_total = total;
            database.migrations_applied = applied;
        }
    }

    let (status, label) = if database.connected {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthReport {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}
