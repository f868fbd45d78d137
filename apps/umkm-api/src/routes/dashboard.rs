use axum::{routing::get, Router};
use chrono::Utc;

use umkm_core::report::DashboardStats;
use umkm_core::{Action, Resource};

use crate::auth::Session;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard/stats", get(dashboard_stats))
}

/// Today's and this month's sales, stock alerts and the latest sales.
async fn dashboard_stats(
    session: Session,
    db: ActiveDb,
) -> ApiResult<ApiResponse<DashboardStats>> {
    session.require(Resource::Dashboard, Action::View)?;

    let stats = db.reports().dashboard(Utc::now()).await?;
    Ok(ApiResponse::ok(stats))
}
