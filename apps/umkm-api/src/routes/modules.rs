//! Feature modules shown in the dashboard menu.

use axum::{routing::get, Router};
use serde::Deserialize;
use tracing::info;

use umkm_core::{Action, Module, Resource};

use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/modules", get(list_modules).put(toggle_module))
}

#[derive(Debug, Deserialize)]
pub struct ToggleBody {
    pub slug: Option<String>,
    pub enabled: Option<bool>,
}

async fn list_modules(session: Session, db: ActiveDb) -> ApiResult<ApiResponse<Vec<Module>>> {
    session.require(Resource::Settings, Action::View)?;

    Ok(ApiResponse::ok(db.modules().list().await?))
}

/// `PUT /api/modules`: `{slug, enabled}`.
async fn toggle_module(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<ToggleBody>,
) -> ApiResult<ApiResponse<Vec<Module>>> {
    session.require(Resource::Settings, Action::Edit)?;

    let slug = present(&body.slug)
        .ok_or_else(|| ApiError::Validation("slug is required".to_string()))?;
    let enabled = body
        .enabled
        .ok_or_else(|| ApiError::Validation("enabled is required".to_string()))?;

    db.modules().set_enabled(slug, enabled).await?;
    info!(slug = %slug, enabled, "Module toggled");

    Ok(ApiResponse::ok(db.modules().list().await?).with_message("Module updated"))
}
