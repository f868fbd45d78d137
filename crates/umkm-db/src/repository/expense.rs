//! # Expense Repository
//!
//! The operating expense log. Dates are calendar days (`YYYY-MM-DD`), so
//! range filters compare whole days.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use umkm_core::{new_id, Expense, Money, DEFAULT_EXPENSE_CATEGORY, DEFAULT_PAYMENT_METHOD};

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Matching expenses and the sum of their amounts.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseList {
    pub expenses: Vec<Expense>,
    pub total: Money,
}

#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
    /// Defaults to today (UTC).
    pub expense_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub receipt: Option<String>,
    pub notes: Option<String>,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub expense_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub receipt: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Lists expenses, latest expense date first.
    pub async fn list(&self, filter: &ExpenseFilter) -> DbResult<ExpenseList> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM expenses WHERE 1=1");

        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(start) = filter.start {
            query.push(" AND expense_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end {
            query.push(" AND expense_date <= ").push_bind(end);
        }

        query.push(" ORDER BY expense_date DESC, created_at DESC");

        let expenses = query
            .build_query_as::<Expense>()
            .fetch_all(&self.pool)
            .await?;
        let total = expenses.iter().map(|e| e.amount).sum();

        debug!(count = expenses.len(), total = %total, "Expense list returned");
        Ok(ExpenseList { expenses, total })
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    pub async fn create(&self, expense: NewExpense) -> DbResult<Expense> {
        let id = new_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, description, amount, category, expense_date, payment_method,
                receipt, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(
            expense
                .category
                .as_deref()
                .unwrap_or(DEFAULT_EXPENSE_CATEGORY),
        )
        .bind(expense.expense_date.unwrap_or_else(|| now.date_naive()))
        .bind(
            expense
                .payment_method
                .as_deref()
                .unwrap_or(DEFAULT_PAYMENT_METHOD),
        )
        .bind(&expense.receipt)
        .bind(&expense.notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(id = %id, amount = expense.amount.amount(), "Expense recorded");
        self.fetch(&id).await
    }

    pub async fn update(&self, id: &str, patch: ExpensePatch) -> DbResult<Expense> {
        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                description = COALESCE(?, description),
                amount = COALESCE(?, amount),
                category = COALESCE(?, category),
                expense_date = COALESCE(?, expense_date),
                payment_method = COALESCE(?, payment_method),
                receipt = COALESCE(?, receipt),
                notes = COALESCE(?, notes),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.description)
        .bind(patch.amount)
        .bind(&patch.category)
        .bind(patch.expense_date)
        .bind(&patch.payment_method)
        .bind(&patch.receipt)
        .bind(&patch.notes)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        self.fetch(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }

    async fn fetch(&self, id: &str) -> DbResult<Expense> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 3, d)
    }

    fn expense(description: &str, amount: i64, category: Option<&str>, date: u32) -> NewExpense {
        NewExpense {
            description: description.to_string(),
            amount: Money::from_amount(amount),
            category: category.map(str::to_string),
            expense_date: day(date),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_defaults_and_filters() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().expenses();

        let rent = repo.create(expense("Sewa kios", 1_500_000, Some("sewa"), 1)).await.unwrap();
        let power = repo.create(expense("Listrik", 300_000, None, 10)).await.unwrap();
        repo.create(expense("Air", 100_000, None, 20)).await.unwrap();

        assert_eq!(power.category, DEFAULT_EXPENSE_CATEGORY);
        assert_eq!(power.payment_method, DEFAULT_PAYMENT_METHOD);
        assert_eq!(rent.expense_date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let all = repo.list(&ExpenseFilter::default()).await.unwrap();
        assert_eq!(all.expenses.len(), 3);
        assert_eq!(all.total.amount(), 1_900_000);
        assert_eq!(all.expenses[0].description, "Air");

        let ranged = repo
            .list(&ExpenseFilter {
                start: day(5),
                end: day(20),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ranged.expenses.len(), 2);
        assert_eq!(ranged.total.amount(), 400_000);

        let rent_only = repo
            .list(&ExpenseFilter {
                category: Some("sewa".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rent_only.total.amount(), 1_500_000);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().expenses();
        let created = repo
            .create(NewExpense {
                description: "Bensin".to_string(),
                amount: Money::from_amount(50_000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.expense_date, Utc::now().date_naive());

        let updated = repo
            .update(
                &created.id,
                ExpensePatch {
                    amount: Some(Money::from_amount(60_000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount.amount(), 60_000);
        assert_eq!(updated.description, "Bensin");

        repo.delete(&created.id).await.unwrap();
        assert!(matches!(
            repo.delete(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
