//! # umkm-core: Pure Business Logic for the UMKM ERP
//!
//! Everything in this crate is deterministic and free of I/O. The database
//! layer and the HTTP layer call into it; it never calls out.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          UMKM ERP Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard client (out of tree)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 umkm-api (axum handlers)                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ umkm-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐         │   │
//! │  │   │ checkout │ │  credit  │ │  roles   │ │    ai    │         │   │
//! │  │   │  totals  │ │ balances │ │  matrix  │ │ dispatch │         │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘         │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐         │   │
//! │  │   │  money   │ │  types   │ │validation│ │  export  │         │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  umkm-db (SQLite repositories)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, Transaction, CreditPayment, ...)
//! - [`money`] - Integer money type
//! - [`checkout`] - Transaction totals, payment status, stock deltas
//! - [`credit`] - Applying a payment to an outstanding balance
//! - [`roles`] - Role hierarchy and permission matrix
//! - [`ai`] - Provider dispatch: request builders and response parsers
//! - [`export`] - Export kinds and CSV rendering
//! - [`period`] - Report date ranges
//! - [`report`] - Report kinds and row shapes
//! - [`defaults`] - Seed settings and modules
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use umkm_core::checkout::{CheckoutInput, PricedLine};
//! use umkm_core::{Money, PaymentStatus, TransactionType};
//!
//! let input = CheckoutInput {
//!     transaction_type: TransactionType::Sale,
//!     lines: vec![PricedLine::new("p-1", "Kopi", 2, Money::from_amount(10_000))],
//!     tax: Money::zero(),
//!     discount: Money::zero(),
//!     payment_status: None,
//!     paid_amount: None,
//! };
//!
//! let plan = input.plan().unwrap();
//! assert_eq!(plan.total.amount(), 20_000);
//! assert_eq!(plan.payment_status, PaymentStatus::Paid);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod ai;
pub mod checkout;
pub mod credit;
pub mod defaults;
pub mod error;
pub mod export;
pub mod money;
pub mod period;
pub mod report;
pub mod roles;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use roles::{Action, Resource, Role};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default reorder threshold for new products.
pub const DEFAULT_MIN_STOCK: i64 = 5;

/// Default expense category when none is supplied.
pub const DEFAULT_EXPENSE_CATEGORY: &str = "operasional";

/// Default payment method for transactions and credit payments.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// Maximum rows returned by the transaction list endpoint.
pub const TRANSACTION_LIST_LIMIT: i64 = 100;

/// Maximum line items in a single checkout.
///
/// Keeps a runaway client from writing thousands of rows inside one
/// database transaction.
pub const MAX_CHECKOUT_ITEMS: usize = 500;

/// Creates a new random entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
