//! # Export Repository
//!
//! Loads the rows behind each export type and lays them out in the column
//! order of [`ExportKind::headers`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::credit::{CreditFilter, CreditRepository};
use super::expense::{ExpenseFilter, ExpenseRepository};
use crate::error::DbResult;
use umkm_core::export::{ExportKind, ExportTable};
use umkm_core::{Customer, Product, TransactionSummary};

/// Optional bounds for the date-filtered export types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ExportRepository {
    pool: SqlitePool,
}

fn timestamp(at: DateTime<Utc>) -> Value {
    json!(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl ExportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExportRepository { pool }
    }

    /// Builds the full table for `kind`. `range` only narrows transactions
    /// and expenses.
    pub async fn table(&self, kind: ExportKind, range: ExportRange) -> DbResult<ExportTable> {
        let mut table = ExportTable::new(kind);

        match kind {
            ExportKind::Transactions => {
                for row in self.transactions(range).await? {
                    let t = row.transaction;
                    table.push(vec![
                        json!(t.id),
                        json!(t.transaction_type.as_str()),
                        json!(row.customer_name),
                        json!(t.subtotal.amount()),
                        json!(t.tax.amount()),
                        json!(t.discount.amount()),
                        json!(t.total.amount()),
                        json!(t.paid_amount.amount()),
                        json!(t.payment_status.as_str()),
                        json!(t.payment_method),
                        json!(t.due_date.map(|d| d.to_string())),
                        json!(t.status),
                        json!(t.notes),
                        timestamp(t.created_at),
                    ]);
                }
            }
            ExportKind::Products => {
                let products =
                    sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name ASC")
                        .fetch_all(&self.pool)
                        .await?;
                for p in products {
                    table.push(vec![
                        json!(p.id),
                        json!(p.sku),
                        json!(p.name),
                        json!(p.description),
                        json!(p.price.amount()),
                        json!(p.cost.amount()),
                        json!(p.stock),
                        json!(p.min_stock),
                        timestamp(p.created_at),
                    ]);
                }
            }
            ExportKind::Expenses => {
                let filter = ExpenseFilter {
                    category: None,
                    start: range.start.map(|s| s.date_naive()),
                    end: range.end.map(|e| e.date_naive()),
                };
                let list = ExpenseRepository::new(self.pool.clone()).list(&filter).await?;
                for e in list.expenses {
                    table.push(vec![
                        json!(e.id),
                        json!(e.description),
                        json!(e.amount.amount()),
                        json!(e.category),
                        json!(e.expense_date.to_string()),
                        json!(e.payment_method),
                        json!(e.notes),
                        timestamp(e.created_at),
                    ]);
                }
            }
            ExportKind::Customers => {
                let customers =
                    sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY name ASC")
                        .fetch_all(&self.pool)
                        .await?;
                for c in customers {
                    table.push(vec![
                        json!(c.id),
                        json!(c.name),
                        json!(c.email),
                        json!(c.phone),
                        json!(c.address),
                        json!(c.notes),
                        timestamp(c.created_at),
                    ]);
                }
            }
            ExportKind::Credits => {
                let entries = CreditRepository::new(self.pool.clone())
                    .list(&CreditFilter::default(), Utc::now().date_naive())
                    .await?;
                for entry in entries {
                    let t = &entry.transaction;
                    table.push(vec![
                        json!(t.id),
                        json!(entry.customer_name),
                        json!(entry.customer_phone),
                        json!(t.total.amount()),
                        json!(t.paid_amount.amount()),
                        json!(t.remaining().amount()),
                        json!(t.payment_status.as_str()),
                        json!(t.due_date.map(|d| d.to_string())),
                        timestamp(t.created_at),
                    ]);
                }
            }
        }

        debug!(export = kind.as_str(), rows = table.rows.len(), "Export table built");
        Ok(table)
    }

    /// Every transaction in range, newest first, without the list-view cap.
    async fn transactions(&self, range: ExportRange) -> DbResult<Vec<TransactionSummary>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT t.*, c.name AS customer_name
            FROM transactions t
            LEFT JOIN customers c ON t.customer_id = c.id
            WHERE 1=1
            "#,
        );

        if let Some(start) = range.start {
            query.push(" AND t.created_at >= ").push_bind(start);
        }
        if let Some(end) = range.end {
            query.push(" AND t.created_at <= ").push_bind(end);
        }
        query.push(" ORDER BY t.created_at DESC");

        let rows = query
            .build_query_as::<TransactionSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
