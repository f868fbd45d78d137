//! Business settings: a flat key to value map.

use axum::{routing::get, Router};
use serde::Deserialize;
use serde_json::{Map, Value};

use umkm_core::{Action, Resource};
use umkm_db::SettingsMap;

use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).post(save_settings))
}

#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsBody {
    pub settings: Option<Map<String, Value>>,
    pub category: Option<String>,
}

/// Settings are stored as text. Strings go in as-is, anything else as its
/// JSON rendering (`true`, `12`), and null as the empty string.
fn setting_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

async fn get_settings(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<SettingsQuery>,
) -> ApiResult<ApiResponse<SettingsMap>> {
    session.require(Resource::Settings, Action::View)?;

    let settings = db.settings().map(present(&query.category)).await?;
    Ok(ApiResponse::ok(settings))
}

/// `POST /api/settings`: upserts every entry of `settings`.
async fn save_settings(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<SettingsBody>,
) -> ApiResult<ApiResponse<()>> {
    session.require(Resource::Settings, Action::Edit)?;

    let settings = body
        .settings
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("settings is required".to_string()))?;

    let entries = settings
        .into_iter()
        .map(|(key, value)| (key, setting_text(value)));
    db.settings()
        .upsert_many(entries, present(&body.category))
        .await?;

    Ok(ApiResponse::message("Settings saved"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setting_text() {
        assert_eq!(setting_text(json!("Toko Maju")), "Toko Maju");
        assert_eq!(setting_text(json!(true)), "true");
        assert_eq!(setting_text(json!(12)), "12");
        assert_eq!(setting_text(Value::Null), "");
    }
}
