//! The JSON envelope and the extractors that reject into it.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// `{success, data?, message?, ...extra}`. Absent fields are omitted.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Top-level fields some endpoints add beside `data`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            extra: Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.extra.insert(key.to_string(), value);
        self
    }
}

impl ApiResponse<()> {
    /// A success envelope with no `data`.
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            extra: Map::new(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::done().with_message(message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `Json<T>` whose rejection is a 400 in the API envelope.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// `Query<T>` whose rejection is a 400 in the API envelope.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Treats blank query-string values as absent.
pub fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_omits_absent_fields() {
        let body = serde_json::to_value(ApiResponse::message("Saved")).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "Saved" }));

        let body = serde_json::to_value(
            ApiResponse::ok(vec![1, 2]).with_field("summary", json!({ "count": 2 })),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({ "success": true, "data": [1, 2], "summary": { "count": 2 } })
        );
    }

    #[test]
    fn test_present() {
        assert_eq!(present(&Some(" kopi ".to_string())), Some("kopi"));
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&None), None);
    }
}
