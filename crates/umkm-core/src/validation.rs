//! # Validation Module
//!
//! Input rules applied by the HTTP handlers before anything touches the
//! database.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: axum extractor (ApiJson)                                      │
//! │  └── Malformed JSON, wrong field types                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Required fields, lengths, formats                                  │
//! │  └── Positive quantities and payment amounts                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── NOT NULL / UNIQUE constraints                                      │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use umkm_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("name", "Kopi Susu").unwrap();
//! validate_quantity(2).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const MAX_NAME_LENGTH: usize = 200;
const MAX_SKU_LENGTH: usize = 50;
const MAX_SEARCH_LENGTH: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name and returns it trimmed.
///
/// ```rust
/// use umkm_core::validation::validate_name;
///
/// assert_eq!(validate_name("name", "  Toko Maju ").unwrap(), "Toko Maju");
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Validates an optional SKU. Empty strings are treated as "no SKU".
///
/// Allowed characters are letters, digits, hyphens and underscores.
pub fn validate_sku(sku: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(sku) = sku.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if sku.len() > MAX_SKU_LENGTH {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LENGTH,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(Some(sku.to_string()))
}

/// Trims a search term. Empty means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.len() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

/// Validates an email address and returns it lowercased.
///
/// The check is structural only: one `@`, a non-empty local part and a
/// domain containing a dot that neither starts nor ends the domain.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(email.to_lowercase())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }

    Ok(())
}

/// Validates that an optional free-form JSON field holds a JSON object.
pub fn validate_custom_fields(raw: Option<&serde_json::Value>) -> ValidationResult<Option<String>> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value @ serde_json::Value::Object(_)) => Ok(Some(value.to_string())),
        Some(_) => Err(ValidationError::InvalidFormat {
            field: "custom_fields".to_string(),
            reason: "must be a JSON object".to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Line item quantity must be strictly positive.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Prices and costs may be zero (free items) but never negative.
pub fn validate_price(field: &str, amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Payments and expense amounts must be strictly positive.
pub fn validate_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a query-string or body date.
///
/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, in which case only the
/// date part is kept.
///
/// ```rust
/// use umkm_core::validation::parse_date;
///
/// let d = parse_date("dueDate", "2025-01-31").unwrap();
/// assert_eq!(d.to_string(), "2025-01-31");
/// assert!(parse_date("dueDate", "31/01/2025").is_err());
/// ```
pub fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        })
}

/// Parses a range bound into a UTC instant.
///
/// A date-only lower bound starts at midnight. A date-only upper bound
/// covers the whole day, so `endDate=2025-01-31` includes sales at 23:59.
pub fn parse_bound(field: &str, raw: &str, upper: bool) -> ValidationResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = parse_date(field, raw)?;
    let time = if upper {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };

    time.map(|t| date.and_time(t).and_utc())
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "date out of range".to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", "Kopi").unwrap(), "Kopi");
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_sku() {
        assert_eq!(validate_sku(Some("KOPI-01")).unwrap().as_deref(), Some("KOPI-01"));
        assert_eq!(validate_sku(Some("  ")).unwrap(), None);
        assert_eq!(validate_sku(None).unwrap(), None);
        assert!(validate_sku(Some("has space")).is_err());
        assert!(validate_sku(Some(&"A".repeat(60))).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("Owner@Toko.ID").unwrap(), "owner@toko.id");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@@b.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_numeric_rules() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());

        assert!(validate_price("price", 0).is_ok());
        assert!(validate_price("price", -1).is_err());

        assert!(validate_amount("amount", 1).is_ok());
        assert!(validate_amount("amount", 0).is_err());
    }

    #[test]
    fn test_custom_fields_must_be_object() {
        let obj = serde_json::json!({"color": "red"});
        assert_eq!(
            validate_custom_fields(Some(&obj)).unwrap().as_deref(),
            Some(r#"{"color":"red"}"#)
        );
        assert_eq!(validate_custom_fields(None).unwrap(), None);
        assert!(validate_custom_fields(Some(&serde_json::json!([1, 2]))).is_err());
    }

    #[test]
    fn test_search_query() {
        assert_eq!(validate_search_query("  kopi ").unwrap().as_deref(), Some("kopi"));
        assert_eq!(validate_search_query("").unwrap(), None);
    }

    #[test]
    fn test_upper_bound_covers_whole_day() {
        let start = parse_bound("startDate", "2025-01-31", false).unwrap();
        let end = parse_bound("endDate", "2025-01-31", true).unwrap();

        assert_eq!(start.hour(), 0);
        assert_eq!(end.hour(), 23);
        assert_eq!(end.minute(), 59);
        assert!(end > start);

        let exact = parse_bound("endDate", "2025-01-31T10:00:00Z", true).unwrap();
        assert_eq!(exact.hour(), 10);
    }
}
