//! Period reports.

use axum::{routing::get, Router};
use serde::Deserialize;
use tracing::debug;

use umkm_core::period::ReportPeriod;
use umkm_core::report::ReportKind;
use umkm_core::{Action, Resource};
use umkm_db::ReportData;

use super::today;
use crate::auth::Session;
use crate::error::ApiResult;
use crate::response::{present, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/reports", get(run_report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `GET /api/reports?type=`: defaults to `summary` over the current month.
async fn run_report(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<ApiResponse<ReportData>> {
    session.require(Resource::Reports, Action::View)?;

    let kind = match present(&query.kind) {
        Some(raw) => raw.parse::<ReportKind>()?,
        None => ReportKind::Summary,
    };
    let period = ReportPeriod::resolve(
        present(&query.start_date),
        present(&query.end_date),
        today(),
    )?;

    debug!(kind = kind.as_str(), start = %period.start, end = %period.end, "Running report");
    let data = db.reports().run(kind, period).await?;

    Ok(ApiResponse::ok(data))
}
