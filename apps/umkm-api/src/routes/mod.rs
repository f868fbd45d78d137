//! HTTP routes, one module per resource.
//!
//! Every module exposes a `router()`; [`api_router`] merges them. Handlers
//! take their extractors in a fixed order: [`Session`](crate::auth::Session)
//! first, then [`ActiveDb`](crate::state::ActiveDb), then the query or body.

pub mod ai;
pub mod auth;
pub mod credits;
pub mod customers;
pub mod dashboard;
pub mod db;
pub mod expenses;
pub mod export;
pub mod health;
pub mod modules;
pub mod products;
pub mod reports;
pub mod settings;
pub mod suppliers;
pub mod transactions;

use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::ApiError;
use crate::response::present;
use crate::state::AppState;

/// Build the complete API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(db::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(customers::router())
        .merge(suppliers::router())
        .merge(transactions::router())
        .merge(credits::router())
        .merge(expenses::router())
        .merge(settings::router())
        .merge(modules::router())
        .merge(reports::router())
        .merge(dashboard::router())
        .merge(export::router())
        .merge(ai::router())
}

/// `?id=` on DELETE requests.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Rejects a missing or blank id with a 400 naming the resource.
pub(crate) fn require_id<'a>(id: &'a Option<String>, resource: &str) -> Result<&'a str, ApiError> {
    present(id).ok_or_else(|| ApiError::Validation(format!("{} id is required", resource)))
}

/// Optional text field from a body: trimmed, and blank means absent.
pub(crate) fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Current UTC date, the reference for periods and overdue checks.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(&Some(" p-1 ".into()), "Product").unwrap(), "p-1");

        let err = require_id(&Some("".into()), "Product").unwrap_err();
        assert_eq!(err.to_string(), "Product id is required");
        assert!(require_id(&None, "Expense").is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  Jl. Merdeka 1 ".into())).as_deref(), Some("Jl. Merdeka 1"));
        assert_eq!(optional_text(Some("   ".into())), None);
        assert_eq!(optional_text(None), None);
    }
}
