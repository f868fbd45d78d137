//! # Credit Repository
//!
//! Receivables: transactions with an outstanding balance, and the
//! append-only payment ledger behind them.
//!
//! ## Recording a Payment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN IMMEDIATE                                                        │
//! │    SELECT * FROM transactions WHERE id = ?      → version = 3          │
//! │    credit::apply_payment(tx, amount)            → overpayment? reject  │
//! │    INSERT INTO credit_payments ...                                      │
//! │    UPDATE transactions SET paid_amount, payment_status,                 │
//! │           version = version + 1                                         │
//! │     WHERE id = ? AND version = 3                                        │
//! │       │                                                                 │
//! │       ├── 1 row  → COMMIT                                               │
//! │       └── 0 rows → another payment got there first: ROLLBACK, 409       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use umkm_core::credit::{apply_payment, PaymentReceipt};
use umkm_core::{
    new_id, CreditEntry, CreditPayment, CreditSummary, Money, PaymentStatus, Transaction,
    DEFAULT_PAYMENT_METHOD,
};

/// Filters for [`CreditRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct CreditFilter {
    /// `None` lists every outstanding status.
    pub status: Option<PaymentStatus>,
    pub customer_id: Option<String>,
    /// Only entries whose due date is before today.
    pub overdue: bool,
}

#[derive(Debug, Clone)]
pub struct NewCreditPayment {
    pub transaction_id: String,
    pub amount: Money,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    /// Outstanding transactions, earliest due date first.
    pub async fn list(&self, filter: &CreditFilter, today: NaiveDate) -> DbResult<Vec<CreditEntry>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT t.*, c.name AS customer_name, c.phone AS customer_phone
            FROM transactions t
            LEFT JOIN customers c ON t.customer_id = c.id
            WHERE t.payment_status != 'paid'
            "#,
        );

        if let Some(status) = filter.status {
            query.push(" AND t.payment_status = ").push_bind(status);
        }
        if let Some(customer_id) = &filter.customer_id {
            query.push(" AND t.customer_id = ").push_bind(customer_id.clone());
        }
        if filter.overdue {
            query.push(" AND t.due_date < ").push_bind(today);
        }

        query.push(" ORDER BY t.due_date ASC, t.created_at DESC");

        let entries = query
            .build_query_as::<CreditEntry>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = entries.len(), "Credit list returned");
        Ok(entries)
    }

    /// Totals across every outstanding transaction, regardless of filters.
    pub async fn summary(&self, today: NaiveDate) -> DbResult<CreditSummary> {
        let (count, total_unpaid, overdue_count): (i64, Money, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(total - paid_amount), 0),
                COALESCE(SUM(CASE WHEN due_date < ? THEN 1 ELSE 0 END), 0)
            FROM transactions
            WHERE payment_status != 'paid'
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(CreditSummary {
            count,
            total_unpaid,
            overdue_count,
        })
    }

    /// Applies a payment to a transaction's balance.
    ///
    /// ## Errors
    /// - `DbError::NotFound` for an unknown transaction
    /// - `DbError::Domain` for a non-positive amount or an overpayment
    /// - `DbError::Conflict` when a concurrent payment changed the row
    pub async fn record_payment(&self, payment: NewCreditPayment) -> DbResult<PaymentReceipt> {
        let mut tx = begin_write(&self.pool).await?;

        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?")
                .bind(&payment.transaction_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Transaction", &payment.transaction_id))?;

        let applied = apply_payment(&transaction, payment.amount)?;

        let payment_id = new_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO credit_payments (id, transaction_id, amount, payment_method, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment_id)
        .bind(&transaction.id)
        .bind(payment.amount)
        .bind(
            payment
                .payment_method
                .as_deref()
                .unwrap_or(DEFAULT_PAYMENT_METHOD),
        )
        .bind(&payment.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET paid_amount = ?, payment_status = ?, version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(applied.new_paid)
        .bind(applied.status)
        .bind(now)
        .bind(&transaction.id)
        .bind(applied.expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            warn!(
                transaction_id = %transaction.id,
                expected_version = applied.expected_version,
                "Credit payment lost a concurrent update"
            );
            return Err(DbError::Conflict(
                "Transaction was updated by another payment, please retry".to_string(),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            transaction_id = %transaction.id,
            payment_id = %payment_id,
            amount = payment.amount.amount(),
            remaining = applied.remaining.amount(),
            status = %applied.status,
            "Credit payment recorded"
        );

        Ok(PaymentReceipt {
            payment_id,
            new_paid_amount: applied.new_paid,
            remaining: applied.remaining,
            status: applied.status,
        })
    }

    /// Payments against a transaction, newest first.
    pub async fn history(&self, transaction_id: &str) -> DbResult<Vec<CreditPayment>> {
        let payments = sqlx::query_as::<_, CreditPayment>(
            "SELECT * FROM credit_payments WHERE transaction_id = ? ORDER BY created_at DESC",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
