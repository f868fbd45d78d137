//! # Domain Types
//!
//! Entities and enums shared by the database and HTTP layers.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐      ┌──────────────────┐      ┌──────────────────┐  │
//! │  │   Product    │◄─────│ TransactionItem  │─────►│   Transaction    │  │
//! │  │  stock       │ FK   │  product_name    │  FK  │  type            │  │
//! │  │  min_stock   │      │  quantity, price │      │  total           │  │
//! │  └──────────────┘      └──────────────────┘      │  paid_amount     │  │
//! │                                                   │  payment_status  │  │
//! │  ┌──────────────┐                                 │  version (CAS)   │  │
//! │  │  Customer    │◄────────────────────────────────┤                  │  │
//! │  └──────────────┘                                 └────────┬─────────┘  │
//! │  ┌──────────────┐                                          │            │
//! │  │  Supplier    │◄─────────────────────────────────────────┤            │
//! │  └──────────────┘                                 ┌────────▼─────────┐  │
//! │                                                   │  CreditPayment   │  │
//! │  Expense   Setting   Module   User                │  (append-only)   │  │
//! │                                                   └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities serialise with their column names (`min_stock`, `payment_status`),
//! which is the shape the dashboard client reads from list and detail calls.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::roles::Role;

// =============================================================================
// Transaction Type
// =============================================================================

/// What kind of business event a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TransactionType {
    /// Goods leave the shop.
    #[default]
    Sale,
    /// Goods arrive from a supplier.
    Purchase,
    /// A customer brings goods back.
    Return,
}

impl TransactionType {
    /// Signed stock change for a line of `quantity` units.
    ///
    /// ```text
    /// sale      →  −quantity
    /// return    →  +quantity
    /// purchase  →  +quantity
    /// ```
    pub const fn stock_delta(&self, quantity: i64) -> i64 {
        match self {
            TransactionType::Sale => -quantity,
            TransactionType::Return | TransactionType::Purchase => quantity,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Purchase => "purchase",
            TransactionType::Return => "return",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionType::Sale),
            "purchase" => Ok(TransactionType::Purchase),
            "return" => Ok(TransactionType::Return),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: vec!["sale".into(), "purchase".into(), "return".into()],
            }),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// How much of a transaction's total has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentStatus {
    #[default]
    Paid,
    Partial,
    Unpaid,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Unpaid => "unpaid",
        }
    }

    /// True when the transaction still carries an outstanding balance.
    pub const fn is_outstanding(&self) -> bool {
        !matches!(self, PaymentStatus::Paid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "partial" => Ok(PaymentStatus::Partial),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            _ => Err(ValidationError::NotAllowed {
                field: "paymentStatus".to_string(),
                allowed: vec!["paid".into(), "partial".into(), "unpaid".into()],
            }),
        }
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Record lifecycle of a transaction. Checkout always writes `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Cancelled,
}

// =============================================================================
// Product
// =============================================================================

/// A product with its live stock level.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    /// Stock keeping unit, unique when present.
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Money,
    /// Current stock. May go negative (backorders are allowed).
    pub stock: i64,
    /// Reorder threshold used by the low-stock views.
    pub min_stock: i64,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    /// Free-form JSON object stored as text.
    pub custom_fields: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether stock has fallen to or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// =============================================================================
// Contacts
// =============================================================================

/// A customer contact record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A supplier contact record with bank details for purchase payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A recorded sale, purchase or return.
///
/// `paid_amount` and `payment_status` are cached from the credit ledger and
/// rewritten on each payment. `version` guards that rewrite (compare-and-swap).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub transaction_type: TransactionType,
    pub customer_id: Option<String>,
    pub supplier_id: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
    pub paid_amount: Money,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: TransactionStatus,
    pub notes: Option<String>,
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Outstanding balance: `total − paid_amount`.
    pub fn remaining(&self) -> Money {
        self.total - self.paid_amount
    }
}

/// A transaction row joined with its customer's name (list views).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub transaction: Transaction,
    pub customer_name: Option<String>,
}

/// One line of a transaction. Product name and price are frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    /// Null once the referenced product has been deleted.
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
    pub subtotal: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A transaction together with its line items (detail view).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

// =============================================================================
// Credit
// =============================================================================

/// One payment applied to a transaction's outstanding balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditPayment {
    pub id: String,
    pub transaction_id: String,
    pub amount: Money,
    pub payment_method: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An outstanding transaction with the contact details a collector needs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditEntry {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub transaction: Transaction,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

/// Aggregate view of the receivables ledger.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditSummary {
    pub count: i64,
    pub total_unpaid: Money,
    pub overdue_count: i64,
}

// =============================================================================
// Expense
// =============================================================================

/// An operating expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: Money,
    pub category: String,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    pub payment_method: String,
    /// Receipt reference (file name or URL).
    pub receipt: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Settings & Modules
// =============================================================================

/// A business setting row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
    pub category: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A dashboard feature that can be toggled on or off.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub sort_order: i64,
}

// =============================================================================
// User
// =============================================================================

/// An account that can sign in to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string. Never serialised.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub avatar: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_delta_by_type() {
        assert_eq!(TransactionType::Sale.stock_delta(2), -2);
        assert_eq!(TransactionType::Purchase.stock_delta(2), 2);
        assert_eq!(TransactionType::Return.stock_delta(2), 2);
    }

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!("sale".parse::<TransactionType>().unwrap(), TransactionType::Sale);
        assert_eq!("return".parse::<TransactionType>().unwrap(), TransactionType::Return);
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_payment_status_serde() {
        let json = serde_json::to_string(&PaymentStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
        assert!(PaymentStatus::Unpaid.is_outstanding());
        assert!(!PaymentStatus::Paid.is_outstanding());
    }

    #[test]
    fn test_transaction_serialises_type_key() {
        let now = Utc::now();
        let tx = Transaction {
            id: "t-1".to_string(),
            transaction_type: TransactionType::Purchase,
            customer_id: None,
            supplier_id: Some("s-1".to_string()),
            subtotal: Money::from_amount(20_000),
            tax: Money::zero(),
            discount: Money::zero(),
            total: Money::from_amount(20_000),
            paid_amount: Money::from_amount(5_000),
            payment_method: "cash".to_string(),
            payment_status: PaymentStatus::Partial,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            status: TransactionStatus::Completed,
            notes: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "purchase");
        assert_eq!(value["payment_status"], "partial");
        assert_eq!(value["due_date"], "2025-01-31");
        assert_eq!(tx.remaining().amount(), 15_000);
    }

    #[test]
    fn test_user_hash_is_not_serialised() {
        let now = Utc::now();
        let user = User {
            id: "u-1".to_string(),
            email: "owner@toko.id".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "Owner".to_string(),
            role: Role::Owner,
            avatar: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "owner");
    }
}
