//! Error types for the UMKM API.
//!
//! Every failure leaves a handler as an [`ApiError`], which renders the
//! `{success: false, message}` envelope with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use umkm_core::{CoreError, ValidationError};
use umkm_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad credentials, or a missing or invalid session.
    #[error("{0}")]
    Auth(String),

    /// The session's role may not perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// A credit payment above the outstanding balance.
    #[error("{0}")]
    Overpayment(String),

    /// Duplicate unique key, or a lost compare-and-swap.
    #[error("{0}")]
    Conflict(String),

    /// Database or AI provider not usable as configured.
    #[error("{0}")]
    Config(String),

    /// An AI provider failed. The provider's message passes through.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Overpayment(_) | ApiError::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = json!({ "success": false, "message": message });

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) | CoreError::TransactionNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CoreError::Overpayment { .. } => ApiError::Overpayment(err.to_string()),
            CoreError::UnknownProvider(_) => ApiError::Config(err.to_string()),
            CoreError::TooManyItems { .. }
            | CoreError::UnknownKind { .. }
            | CoreError::Validation(_) => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::Conflict(_) => {
                ApiError::Conflict(err.to_string())
            }
            DbError::ForeignKeyViolation { .. } => {
                ApiError::Validation("Referenced record does not exist".to_string())
            }
            DbError::ConnectionFailed(_) => ApiError::Config(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        fn status_of(err: ApiError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(status_of(ApiError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ApiError::Overpayment("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ApiError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ApiError::Auth("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(ApiError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(ApiError::Upstream("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(ApiError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    async fn body_of(err: ApiError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_failures_carry_a_message() {
        let body = body_of(ApiError::NotFound("Product not found: p-1".into())).await;
        assert_eq!(
            body,
            json!({ "success": false, "message": "Product not found: p-1" })
        );

        let body = body_of(ApiError::Upstream("Invalid API Key".into())).await;
        assert_eq!(body["message"], "Invalid API Key");

        // Internal details stay in the log
        let body = body_of(ApiError::Internal("disk I/O error".into())).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_db_errors_map_by_cause() {
        let overpay: ApiError = DbError::Domain(CoreError::Overpayment {
            amount: 10,
            remaining: 5,
        })
        .into();
        assert!(matches!(overpay, ApiError::Overpayment(_)));

        let missing: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(missing.to_string(), "Product not found: p-1");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let dup: ApiError = DbError::duplicate("sku").into();
        assert_eq!(dup.status(), StatusCode::CONFLICT);

        let internal: ApiError = DbError::PoolExhausted.into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unknown_provider_is_a_config_error() {
        let err: ApiError = CoreError::UnknownProvider("llamacorp".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Provider llamacorp is not supported");
    }
}
