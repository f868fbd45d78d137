//! CSV and JSON data export.

use axum::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use umkm_core::export::{ExportFormat, ExportKind, CSV_CONTENT_TYPE};
use umkm_core::validation::parse_bound;
use umkm_core::{Action, Resource};
use umkm_db::ExportRange;

use super::today;
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/export", get(export))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub format: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `GET /api/export?type=&format=`
///
/// CSV is sent as an attachment named `<type>_<date>.csv`. JSON comes back
/// in the envelope as one object per row, plus `headers` and `filename`.
async fn export(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> ApiResult<Response> {
    session.require(Resource::Reports, Action::View)?;

    let kind = present(&query.kind)
        .ok_or_else(|| ApiError::Validation("type is required".to_string()))?
        .parse::<ExportKind>()?;
    let format = present(&query.format)
        .map(str::parse::<ExportFormat>)
        .transpose()?
        .unwrap_or_default();

    let range = ExportRange {
        start: present(&query.start_date)
            .map(|raw| parse_bound("startDate", raw, false))
            .transpose()?,
        end: present(&query.end_date)
            .map(|raw| parse_bound("endDate", raw, true))
            .transpose()?,
    };

    let table = db.exports().table(kind, range).await?;
    let filename = kind.file_stem(today());
    info!(kind = kind.as_str(), ?format, rows = table.rows.len(), "Export generated");

    let response = match format {
        ExportFormat::Csv => (
            [
                (CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.csv\"", filename),
                ),
            ],
            table.to_csv(),
        )
            .into_response(),
        ExportFormat::Json => ApiResponse::ok(table.to_records())
            .with_field("headers", table.headers())
            .with_field("filename", filename)
            .into_response(),
    };

    Ok(response)
}
