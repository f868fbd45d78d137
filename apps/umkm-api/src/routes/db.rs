//! Database setup: initialise, inspect and probe a database URL.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use umkm_core::{Action, Resource};

use crate::auth::{set_cookie, Session, DB_COOKIE, DB_COOKIE_MAX_AGE_SECS};
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/db/init", get(db_status).post(init_db))
        .route("/api/db/test", post(test_db))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBody {
    pub database_url: Option<String>,
    #[serde(default)]
    pub save_credentials: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestBody {
    pub database_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProbeResult {
    pub tables: i64,
}

/// `POST /api/db/init`: migrates and seeds, and with `saveCredentials`
/// remembers the URL in the `db_url` cookie.
async fn init_db(
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<InitBody>,
) -> ApiResult<Response> {
    session.require(Resource::Settings, Action::Edit)?;

    let url = match present(&body.database_url) {
        Some(url) => state.databases.admit(url)?,
        None => state.active_url(&headers)?,
    };

    let (_, report) = state.databases.initialize(&url).await?;
    let envelope = ApiResponse::ok(report).with_message(format!(
        "Database initialized: {} tables available",
        report.total_tables
    ));

    if !body.save_credentials {
        return Ok(envelope.into_response());
    }

    let cookie = set_cookie(
        DB_COOKIE,
        &url,
        DB_COOKIE_MAX_AGE_SECS,
        state.config.cookie_secure,
    )?;
    Ok(([(SET_COOKIE, cookie)], envelope).into_response())
}

/// `GET /api/db/init`: `{connected, stats}` for the active database. An
/// unreachable database is reported, not raised.
async fn db_status(
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<ApiResponse<()>> {
    session.require(Resource::Settings, Action::View)?;
    let url = state.active_url(&headers)?;

    let stats = match state.databases.resolve(&url).await {
        Ok(db) => db.stats().await,
        Err(e) => Err(e),
    };

    Ok(match stats {
        Ok(stats) => ApiResponse::done()
            .with_field("connected", true)
            .with_field("stats", stats),
        Err(e) => {
            warn!(error = %e, "Active database unavailable");
            ApiResponse::message(e.to_string()).with_field("connected", false)
        }
    })
}

/// `POST /api/db/test`: connects to `databaseUrl` without migrating and
/// counts its tables.
async fn test_db(
    session: Session,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TestBody>,
) -> ApiResult<ApiResponse<ProbeResult>> {
    session.require(Resource::Settings, Action::Edit)?;

    let url = present(&body.database_url)
        .ok_or_else(|| ApiError::Validation("databaseUrl is required".to_string()))?;
    let url = state.databases.admit(url)?;

    let tables = state.databases.probe(&url).await?;
    Ok(ApiResponse::ok(ProbeResult { tables })
        .with_message(format!("Connection successful: {} tables found", tables)))
}
