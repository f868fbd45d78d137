//! # UMKM API
//!
//! JSON HTTP server for a small-business ERP: catalogue, checkout, credit
//! ledger, expenses, reports, exports and an AI assistant relay.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           UMKM API Server                               │
//! │                                                                         │
//! │  client ──► TraceLayer ──► Router ──► handler(Session, ActiveDb, body)  │
//! │                                            │            │               │
//! │                                   role matrix    DbRegistry pool        │
//! │                                            │            │               │
//! │                                            ▼            ▼               │
//! │                                    ApiResponse    umkm-db repositories  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::ApiConfig`]):
//! - `HOST`, `PORT` - bind address (default `0.0.0.0:3000`)
//! - `DATABASE_URL` - default database (default `sqlite://data/umkm.db`)
//! - `DB_MAX_CONNECTIONS` - pool size per database (default 5)
//! - `DATA_DIR` - where selectable databases live (default: beside `DATABASE_URL`)
//! - `DB_MAX_POOLS` - database pools kept open (default 8)
//! - `JWT_SECRET`, `JWT_LIFETIME_SECS` - session tokens
//! - `COOKIE_SECURE` - add `Secure` to cookies
//! - `ENFORCE_PERMISSIONS` - require a session and check the role matrix
//! - `AI_TIMEOUT_SECS`, `AI_BASE_URL_<PROVIDER>` - outbound AI calls

pub mod ai_client;
pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the full application: every route, the envelope 404 fallback and
/// the HTTP layers.
pub fn build_router(state: AppState) -> Router {
    routes::api_router()
        .fallback(route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
