//! # Transaction Repository
//!
//! Checkout, transaction history and deletion.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One checkout = one sqlx transaction                  │
//! │                                                                         │
//! │  BEGIN IMMEDIATE (write lock up front, queued behind busy_timeout)      │
//! │    │                                                                    │
//! │    ├── resolve each line: product must exist; fill missing name/price  │
//! │    ├── CheckoutInput::plan() → totals, status, stock deltas            │
//! │    ├── INSERT transactions                                              │
//! │    ├── INSERT transaction_items (one per line)                          │
//! │    ├── UPDATE products SET stock = stock + delta (one per line)        │
//! │    └── INSERT credit_payments "initial payment" (credit with paid > 0) │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the transaction, which rolls back.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use umkm_core::checkout::{CheckoutInput, CheckoutReceipt, PricedLine, INITIAL_PAYMENT_NOTE};
use umkm_core::{
    new_id, Money, PaymentStatus, Transaction, TransactionDetail, TransactionItem,
    TransactionSummary, TransactionType, ValidationError, DEFAULT_PAYMENT_METHOD,
    TRANSACTION_LIST_LIMIT,
};

/// One requested line. Name and price fall back to the product's current
/// values when absent.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub price: Option<Money>,
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub transaction_type: TransactionType,
    pub customer_id: Option<String>,
    pub supplier_id: Option<String>,
    pub lines: Vec<CheckoutLine>,
    pub tax: Money,
    pub discount: Money,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    /// Stored only when the transaction is left with a balance.
    pub due_date: Option<NaiveDate>,
    pub paid_amount: Option<Money>,
    pub notes: Option<String>,
}

/// Filters for [`TransactionRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records a sale, purchase or return and adjusts stock atomically.
    ///
    /// ## Errors
    /// - `DbError::Domain` for an empty item list or a non-positive quantity
    /// - `DbError::NotFound` when a line names an unknown product
    ///
    /// Nothing is written unless every step succeeds.
    pub async fn checkout(&self, request: CheckoutRequest) -> DbResult<CheckoutReceipt> {
        if request.lines.is_empty() {
            return Err(DbError::Domain(ValidationError::required("items").into()));
        }

        let mut tx = begin_write(&self.pool).await?;

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in request.lines {
            let (name, price): (String, Money) =
                sqlx::query_as("SELECT name, price FROM products WHERE id = ?")
                    .bind(&line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;

            lines.push(PricedLine::new(
                line.product_id,
                line.product_name.unwrap_or(name),
                line.quantity,
                line.price.unwrap_or(price),
            ));
        }

        let plan = CheckoutInput {
            transaction_type: request.transaction_type,
            lines,
            tax: request.tax,
            discount: request.discount,
            payment_status: request.payment_status,
            paid_amount: request.paid_amount,
        }
        .plan()?;

        let id = new_id();
        let now = Utc::now();
        let payment_method = request
            .payment_method
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        let due_date = request
            .due_date
            .filter(|_| plan.payment_status.is_outstanding());

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, type, customer_id, supplier_id, subtotal, tax, discount, total,
                paid_amount, payment_method, payment_status, due_date, status, notes,
                version, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'completed', ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(plan.transaction_type)
        .bind(&request.customer_id)
        .bind(&request.supplier_id)
        .bind(plan.subtotal)
        .bind(plan.tax)
        .bind(plan.discount)
        .bind(plan.total)
        .bind(plan.paid)
        .bind(&payment_method)
        .bind(plan.payment_status)
        .bind(due_date)
        .bind(&request.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for planned in &plan.lines {
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    id, transaction_id, product_id, product_name, quantity, price, subtotal, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(new_id())
            .bind(&id)
            .bind(&planned.line.product_id)
            .bind(&planned.line.product_name)
            .bind(planned.line.quantity)
            .bind(planned.line.price)
            .bind(planned.subtotal)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            // Relative update: concurrent checkouts never overwrite each other.
            sqlx::query("UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ?")
                .bind(planned.stock_delta)
                .bind(now)
                .bind(&planned.line.product_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(amount) = plan.initial_credit_payment() {
            sqlx::query(
                r#"
                INSERT INTO credit_payments (id, transaction_id, amount, payment_method, notes, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(new_id())
            .bind(&id)
            .bind(amount)
            .bind(&payment_method)
            .bind(INITIAL_PAYMENT_NOTE)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            transaction_id = %id,
            kind = %plan.transaction_type,
            total = plan.total.amount(),
            status = %plan.payment_status,
            items = plan.lines.len(),
            "Transaction recorded"
        );

        Ok(CheckoutReceipt::from_plan(id, &plan))
    }

    /// Lists transactions newest first, capped at [`TRANSACTION_LIST_LIMIT`].
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<TransactionSummary>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT t.*, c.name AS customer_name
            FROM transactions t
            LEFT JOIN customers c ON t.customer_id = c.id
            WHERE 1=1
            "#,
        );

        if let Some(kind) = filter.transaction_type {
            query.push(" AND t.type = ").push_bind(kind);
        }
        if let Some(start) = filter.start {
            query.push(" AND t.created_at >= ").push_bind(start);
        }
        if let Some(end) = filter.end {
            query.push(" AND t.created_at <= ").push_bind(end);
        }

        query
            .push(" ORDER BY t.created_at DESC LIMIT ")
            .push_bind(TRANSACTION_LIST_LIMIT);

        let rows = query
            .build_query_as::<TransactionSummary>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Transaction list returned");
        Ok(rows)
    }

    /// Loads a transaction row without its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(transaction)
    }

    /// Loads a transaction with its line items.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<TransactionDetail>> {
        let Some(transaction) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = self.items(id).await?;
        Ok(Some(TransactionDetail { transaction, items }))
    }

    /// Line items in the order they were written.
    pub async fn items(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(
            "SELECT * FROM transaction_items WHERE transaction_id = ? ORDER BY created_at, rowid",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Deletes a transaction with its items and payments. Stock is not
    /// restored.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("DELETE FROM transaction_items WHERE transaction_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(transaction_id = %id, "Transaction deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use umkm_core::CoreError;

    async fn setup(stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                name: "Kopi".to_string(),
                price: Money::from_amount(10_000),
                stock,
                ..Default::default()
            })
            .await
            .unwrap();
        (db, product.id)
    }

    fn line(product_id: &str, quantity: i64, price: Option<i64>) -> CheckoutLine {
        CheckoutLine {
            product_id: product_id.to_string(),
            product_name: None,
            quantity,
            price: price.map(Money::from_amount),
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_sale_decrements_stock_and_snapshots_items() {
        let (db, product_id) = setup(10).await;

        let receipt = db
            .transactions()
            .checkout(CheckoutRequest {
                lines: vec![line(&product_id, 3, None)],
                tax: Money::from_amount(1_000),
                discount: Money::from_amount(500),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(receipt.total.amount(), 30_500);
        assert_eq!(receipt.paid, receipt.total);
        assert!(receipt.remaining.is_zero());
        assert_eq!(stock_of(&db, &product_id).await, 7);

        let detail = db
            .transactions()
            .get_detail(&receipt.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.transaction.subtotal.amount(), 30_000);
        assert_eq!(detail.transaction.version, 0);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].product_name, "Kopi");
        assert_eq!(detail.items[0].price.amount(), 10_000);
    }

    #[tokio::test]
    async fn test_purchase_and_return_increment_stock() {
        let (db, product_id) = setup(10).await;
        let repo = db.transactions();

        for kind in [TransactionType::Purchase, TransactionType::Return] {
            repo.checkout(CheckoutRequest {
                transaction_type: kind,
                lines: vec![line(&product_id, 4, Some(8_000))],
                ..Default::default()
            })
            .await
            .unwrap();
        }

        assert_eq!(stock_of(&db, &product_id).await, 18);
    }

    #[tokio::test]
    async fn test_partial_payment_records_initial_credit_payment() {
        let (db, product_id) = setup(5).await;

        let receipt = db
            .transactions()
            .checkout(CheckoutRequest {
                lines: vec![line(&product_id, 2, Some(10_000))],
                payment_status: Some(PaymentStatus::Partial),
                paid_amount: Some(Money::from_amount(5_000)),
                due_date: NaiveDate::from_ymd_opt(2030, 1, 31),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(receipt.remaining.amount(), 15_000);

        let history = db.credits().history(&receipt.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount.amount(), 5_000);
        assert_eq!(history[0].notes.as_deref(), Some(INITIAL_PAYMENT_NOTE));

        let stored = db.transactions().get_by_id(&receipt.id).await.unwrap().unwrap();
        assert_eq!(stored.due_date, NaiveDate::from_ymd_opt(2030, 1, 31));
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_everything() {
        let (db, product_id) = setup(10).await;

        let err = db
            .transactions()
            .checkout(CheckoutRequest {
                lines: vec![line(&product_id, 2, None), line("ghost", 1, Some(1_000))],
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(stock_of(&db, &product_id).await, 10);
        assert!(db
            .transactions()
            .list(&TransactionFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_requests_write_nothing() {
        let (db, product_id) = setup(10).await;
        let repo = db.transactions();

        let empty = repo.checkout(CheckoutRequest::default()).await.unwrap_err();
        assert!(matches!(empty, DbError::Domain(CoreError::Validation(_))));

        let zero = repo
            .checkout(CheckoutRequest {
                lines: vec![line(&product_id, 0, None)],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(zero, DbError::Domain(_)));

        assert_eq!(db.stats().await.unwrap().transactions, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_checkouts_all_commit() {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("toko.db").display().to_string();
        let db = Database::new(DbConfig::new(url).max_connections(5))
            .await
            .unwrap();
        let product = db
            .products()
            .create(NewProduct {
                name: "Kopi".to_string(),
                price: Money::from_amount(10_000),
                stock: 100,
                ..Default::default()
            })
            .await
            .unwrap();

        let tasks: Vec<_> = (0..24)
            .map(|_| {
                let repo = db.transactions();
                let product_id = product.id.clone();
                tokio::spawn(async move {
                    repo.checkout(CheckoutRequest {
                        lines: vec![line(&product_id, 1, None)],
                        ..Default::default()
                    })
                    .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(stock_of(&db, &product.id).await, 76);
        assert_eq!(db.stats().await.unwrap().transactions, 24);
    }

    #[tokio::test]
    async fn test_overflowing_amounts_write_nothing() {
        let (db, product_id) = setup(10).await;

        let err = db
            .transactions()
            .checkout(CheckoutRequest {
                lines: vec![line(&product_id, 3, Some(i64::MAX / 2))],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        assert_eq!(stock_of(&db, &product_id).await, 10);
        assert_eq!(db.stats().await.unwrap().transactions, 0);
    }

    #[tokio::test]
    async fn test_list_filters_and_delete() {
        let (db, product_id) = setup(100).await;
        let repo = db.transactions();

        let sale = repo
            .checkout(CheckoutRequest {
                lines: vec![line(&product_id, 1, None)],
                ..Default::default()
            })
            .await
            .unwrap();
        repo.checkout(CheckoutRequest {
            transaction_type: TransactionType::Purchase,
            lines: vec![line(&product_id, 1, None)],
            ..Default::default()
        })
        .await
        .unwrap();

        let sales = repo
            .list(&TransactionFilter {
                transaction_type: Some(TransactionType::Sale),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].transaction.id, sale.id);

        let future = repo
            .list(&TransactionFilter {
                start: Some(Utc::now() + chrono::Duration::days(1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(future.is_empty());

        repo.delete(&sale.id).await.unwrap();
        assert!(repo.get_detail(&sale.id).await.unwrap().is_none());
        assert!(repo.items(&sale.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(&sale.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
