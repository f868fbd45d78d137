//! # Checkout
//!
//! Pure arithmetic behind `POST /api/transactions`: line subtotals, the
//! transaction total, payment status resolution and the stock delta for each
//! line. The database layer resolves missing prices first, then persists the
//! resulting [`CheckoutPlan`] inside one SQL transaction.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request items ──► price lookup (umkm-db) ──► PricedLine[]              │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                        CheckoutInput::plan()            │
//! │                                                  │                      │
//! │     subtotal = Σ price × qty                     │                      │
//! │     total    = subtotal + tax − discount         │                      │
//! │     status   = explicit or Paid                  │                      │
//! │     paid     = total when Paid, else paidAmount  ▼                      │
//! │                                            CheckoutPlan                 │
//! │                                                  │                      │
//! │                     INSERT transaction, items, stock += delta,          │
//! │                     initial CreditPayment when partial  (one tx)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentStatus, TransactionType};
use crate::validation::validate_quantity;
use crate::MAX_CHECKOUT_ITEMS;

/// Note written on the credit payment recorded at checkout time.
pub const INITIAL_PAYMENT_NOTE: &str = "initial payment";

// =============================================================================
// Input
// =============================================================================

/// A line item after its price and name have been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
}

impl PricedLine {
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            price,
        }
    }

    /// `price × quantity`, or `None` when it overflows.
    pub fn subtotal(&self) -> Option<Money> {
        self.price.multiply_quantity(self.quantity)
    }
}

/// Everything needed to compute a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub transaction_type: TransactionType,
    pub lines: Vec<PricedLine>,
    pub tax: Money,
    pub discount: Money,
    /// Explicit status from the client. `None` means fully paid.
    pub payment_status: Option<PaymentStatus>,
    /// Amount paid up front on a credit sale. Ignored when fully paid.
    pub paid_amount: Option<Money>,
}

// =============================================================================
// Plan
// =============================================================================

/// One line with its computed subtotal and stock delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub line: PricedLine,
    pub subtotal: Money,
    pub stock_delta: i64,
}

/// The fully computed checkout, ready to persist.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    pub transaction_type: TransactionType,
    pub lines: Vec<PlannedLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
    pub paid: Money,
    pub payment_status: PaymentStatus,
}

impl CheckoutPlan {
    pub fn remaining(&self) -> Money {
        self.total - self.paid
    }

    /// The up-front payment to record in the credit ledger, if any.
    pub fn initial_credit_payment(&self) -> Option<Money> {
        (self.payment_status.is_outstanding() && self.paid.is_positive()).then_some(self.paid)
    }
}

impl CheckoutInput {
    /// Computes totals, status and stock deltas.
    ///
    /// ## Errors
    /// - empty `lines` → `ValidationError::Required("items")`
    /// - a non-positive quantity → `ValidationError::MustBePositive`
    /// - more than [`MAX_CHECKOUT_ITEMS`] lines → `CoreError::TooManyItems`
    /// - a line subtotal or the total beyond the i64 range →
    ///   `ValidationError::OutOfRange`
    ///
    /// Negative totals (discount above subtotal) are accepted and stored.
    pub fn plan(self) -> CoreResult<CheckoutPlan> {
        if self.lines.is_empty() {
            return Err(ValidationError::required("items").into());
        }
        if self.lines.len() > MAX_CHECKOUT_ITEMS {
            return Err(CoreError::TooManyItems {
                max: MAX_CHECKOUT_ITEMS,
            });
        }
        for line in &self.lines {
            validate_quantity(line.quantity)?;
        }

        let transaction_type = self.transaction_type;
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut subtotal = Money::zero();
        for line in self.lines {
            let line_subtotal = line
                .subtotal()
                .ok_or_else(|| ValidationError::out_of_range("items"))?;
            subtotal = subtotal
                .checked_add(line_subtotal)
                .ok_or_else(|| ValidationError::out_of_range("subtotal"))?;
            lines.push(PlannedLine {
                subtotal: line_subtotal,
                stock_delta: transaction_type.stock_delta(line.quantity),
                line,
            });
        }

        let total = subtotal
            .checked_add(self.tax)
            .and_then(|sum| sum.checked_sub(self.discount))
            .ok_or_else(|| ValidationError::out_of_range("total"))?;

        let payment_status = self.payment_status.unwrap_or(PaymentStatus::Paid);
        let paid = match payment_status {
            PaymentStatus::Paid => total,
            PaymentStatus::Partial | PaymentStatus::Unpaid => {
                self.paid_amount.unwrap_or_default()
            }
        };

        Ok(CheckoutPlan {
            transaction_type,
            lines,
            subtotal,
            tax: self.tax,
            discount: self.discount,
            total,
            paid,
            payment_status,
        })
    }
}

// =============================================================================
// Result
// =============================================================================

/// Response body of a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutReceipt {
    pub id: String,
    pub total: Money,
    pub paid: Money,
    pub remaining: Money,
    pub payment_status: PaymentStatus,
}

impl CheckoutReceipt {
    pub fn from_plan(id: impl Into<String>, plan: &CheckoutPlan) -> Self {
        Self {
            id: id.into(),
            total: plan.total,
            paid: plan.paid,
            remaining: plan.remaining(),
            payment_status: plan.payment_status,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
