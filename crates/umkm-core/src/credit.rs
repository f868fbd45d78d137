//! # Credit Payments
//!
//! Applies a payment to a transaction's outstanding balance.
//!
//! ```text
//! remaining = total − paid_amount
//! amount > remaining  →  Overpayment (nothing written)
//! new_paid  = paid_amount + amount
//! status    = Paid if new_paid ≥ total else Partial
//! ```
//!
//! The repository writes the result back with
//! `UPDATE … WHERE id = ? AND version = ?`, using [`CreditApplication::expected_version`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentStatus, Transaction};
use crate::validation::validate_amount;

/// The outcome of applying one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditApplication {
    pub new_paid: Money,
    pub remaining: Money,
    pub status: PaymentStatus,
    /// Version the transaction row must still have for the write to land.
    pub expected_version: i64,
}

/// Computes the new balance for a payment of `amount` against `tx`.
pub fn apply_payment(tx: &Transaction, amount: Money) -> CoreResult<CreditApplication> {
    validate_amount("amount", amount.amount())?;

    let remaining = tx.remaining();
    if amount > remaining {
        return Err(CoreError::Overpayment {
            amount: amount.amount(),
            remaining: remaining.amount(),
        });
    }

    let new_paid = tx.paid_amount + amount;
    let status = if new_paid >= tx.total {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };

    Ok(CreditApplication {
        new_paid,
        remaining: tx.total - new_paid,
        status,
        expected_version: tx.version,
    })
}

/// Response body of `POST /api/credits`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub new_paid_amount: Money,
    pub remaining: Money,
    pub status: PaymentStatus,
}
