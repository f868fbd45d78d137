//! # Report Repository
//!
//! Read-only aggregates for the reports screen and the dashboard.
//!
//! Transaction bounds compare `created_at` timestamps. Expense bounds compare
//! `expense_date` calendar days. Only sales count towards revenue.

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use umkm_core::period::ReportPeriod;
use umkm_core::report::{
    CategoryExpenses, CountTotal, DailySales, DashboardStats, LowStockItem, ReportKind,
    SummaryReport, TopCustomer, TopProduct, DASHBOARD_WIDGET_ROWS, TOP_N,
};
use umkm_core::TransactionSummary;

/// The payload of one report, serialised without a wrapper.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    Summary(SummaryReport),
    SalesByDay(Vec<DailySales>),
    ExpensesByCategory(Vec<CategoryExpenses>),
    TopProducts(Vec<TopProduct>),
    TopCustomers(Vec<TopCustomer>),
    LowStock(Vec<LowStockItem>),
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Runs the report named by `kind` over `period`.
    pub async fn run(&self, kind: ReportKind, period: ReportPeriod) -> DbResult<ReportData> {
        debug!(report = kind.as_str(), start = %period.start, end = %period.end, "Running report");

        Ok(match kind {
            ReportKind::Summary => ReportData::Summary(self.summary(period).await?),
            ReportKind::SalesByDay => ReportData::SalesByDay(self.sales_by_day(period).await?),
            ReportKind::ExpensesByCategory => {
                ReportData::ExpensesByCategory(self.expenses_by_category(period).await?)
            }
            ReportKind::TopProducts => ReportData::TopProducts(self.top_products(period).await?),
            ReportKind::TopCustomers => {
                ReportData::TopCustomers(self.top_customers(period).await?)
            }
            ReportKind::LowStock => ReportData::LowStock(self.low_stock(None).await?),
        })
    }

    pub async fn summary(&self, period: ReportPeriod) -> DbResult<SummaryReport> {
        let sales = self.sales_between(period.start, period.end).await?;

        let (first, last) = period.date_range();
        let expenses = sqlx::query_as::<_, CountTotal>(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total
            FROM expenses
            WHERE expense_date >= ? AND expense_date <= ?
            "#,
        )
        .bind(first)
        .bind(last)
        .fetch_one(&self.pool)
        .await?;

        let (products, customers): (i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM products), (SELECT COUNT(*) FROM customers)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SummaryReport::new(sales, expenses, products, customers, period))
    }

    /// One row per day with at least one sale, oldest first.
    pub async fn sales_by_day(&self, period: ReportPeriod) -> DbResult<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT substr(created_at, 1, 10) AS date,
                   COUNT(*) AS count,
                   COALESCE(SUM(total), 0) AS total
            FROM transactions
            WHERE type = 'sale' AND created_at >= ? AND created_at <= ?
            GROUP BY substr(created_at, 1, 10)
            ORDER BY date ASC
            "#,
        )
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn expenses_by_category(&self, period: ReportPeriod) -> DbResult<Vec<CategoryExpenses>> {
        let (first, last) = period.date_range();

        let rows = sqlx::query_as::<_, CategoryExpenses>(
            r#"
            SELECT category, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total
            FROM expenses
            WHERE expense_date >= ? AND expense_date <= ?
            GROUP BY category
            ORDER BY total DESC
            "#,
        )
        .bind(first)
        .bind(last)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn top_products(&self, period: ReportPeriod) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.id, p.name,
                   COALESCE(SUM(ti.quantity), 0) AS qty_sold,
                   COALESCE(SUM(ti.subtotal), 0) AS revenue
            FROM transaction_items ti
            JOIN transactions t ON ti.transaction_id = t.id
            JOIN products p ON ti.product_id = p.id
            WHERE t.type = 'sale' AND t.created_at >= ? AND t.created_at <= ?
            GROUP BY p.id, p.name
            ORDER BY qty_sold DESC
            LIMIT ?
            "#,
        )
        .bind(period.start)
        .bind(period.end)
        .bind(TOP_N)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn top_customers(&self, period: ReportPeriod) -> DbResult<Vec<TopCustomer>> {
        let rows = sqlx::query_as::<_, TopCustomer>(
            r#"
            SELECT c.id, c.name,
                   COUNT(t.id) AS tx_count,
                   COALESCE(SUM(t.total), 0) AS total_spent
            FROM transactions t
            JOIN customers c ON t.customer_id = c.id
            WHERE t.type = 'sale' AND t.created_at >= ? AND t.created_at <= ?
            GROUP BY c.id, c.name
            ORDER BY total_spent DESC
            LIMIT ?
            "#,
        )
        .bind(period.start)
        .bind(period.end)
        .bind(TOP_N)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Products at or below their reorder threshold, emptiest first.
    pub async fn low_stock(&self, limit: Option<i64>) -> DbResult<Vec<LowStockItem>> {
        let rows = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT id, name, stock, min_stock
            FROM products
            WHERE stock <= min_stock
            ORDER BY stock ASC
            LIMIT ?
            "#,
        )
        // SQLite treats a negative LIMIT as "no limit"
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Headline numbers for the dashboard as of `now`.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> DbResult<DashboardStats> {
        let today = now.date_naive();
        let day_start = today.and_time(NaiveTime::MIN).and_utc();
        let month_start = today
            .with_day(1)
            .unwrap_or(today)
            .and_time(NaiveTime::MIN)
            .and_utc();

        let (total_products, total_customers): (i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM products), (SELECT COUNT(*) FROM customers)",
        )
        .fetch_one(&self.pool)
        .await?;

        let today_sales = self.sales_between(day_start, now).await?;
        let month_sales = self.sales_between(month_start, now).await?;
        let low_stock_products = self.low_stock(Some(DASHBOARD_WIDGET_ROWS)).await?;

        let recent_transactions = sqlx::query_as::<_, TransactionSummary>(
            r#"
            SELECT t.*, c.name AS customer_name
            FROM transactions t
            LEFT JOIN customers c ON t.customer_id = c.id
            WHERE t.type = 'sale'
            ORDER BY t.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(DASHBOARD_WIDGET_ROWS)
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_products,
            total_customers,
            today_sales: today_sales.total,
            today_transactions: today_sales.count,
            month_sales: month_sales.total,
            month_transactions: month_sales.count,
            low_stock_products,
            recent_transactions,
        })
    }

    async fn sales_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<CountTotal> {
        let totals = sqlx::query_as::<_, CountTotal>(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(total), 0) AS total
            FROM transactions
            WHERE type = 'sale' AND created_at >= ? AND created_at <= ?
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::NewCustomer;
    use crate::repository::expense::NewExpense;
    use crate::repository::product::NewProduct;
    use crate::repository::transaction::{CheckoutLine, CheckoutRequest};
    use umkm_core::{Money, TransactionType};

    struct Shop {
        db: Database,
        kopi: String,
        teh: String,
        customer: String,
    }

    async fn shop() -> Shop {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products();
        let kopi = products
            .create(NewProduct {
                name: "Kopi".to_string(),
                price: Money::from_amount(10_000),
                stock: 50,
                ..Default::default()
            })
            .await
            .unwrap()
            .id;
        let teh = products
            .create(NewProduct {
                name: "Teh".to_string(),
                price: Money::from_amount(5_000),
                stock: 6,
                ..Default::default()
            })
            .await
            .unwrap()
            .id;
        let customer = db
            .customers()
            .create(NewCustomer {
                name: "Pak Joko".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id;

        Shop {
            db,
            kopi,
            teh,
            customer,
        }
    }

    async fn sell(shop: &Shop, kind: TransactionType, product: &str, qty: i64, customer: bool) {
        shop.db
            .transactions()
            .checkout(CheckoutRequest {
                transaction_type: kind,
                customer_id: customer.then(|| shop.customer.clone()),
                lines: vec![CheckoutLine {
                    product_id: product.to_string(),
                    product_name: None,
                    quantity: qty,
                    price: None,
                }],
                ..Default::default()
            })
            .await
            .unwrap();
    }

    fn this_month() -> ReportPeriod {
        ReportPeriod::month_of(Utc::now().date_naive())
    }

    #[tokio::test]
    async fn test_summary_counts_sales_only() {
        let shop = shop().await;
        sell(&shop, TransactionType::Sale, &shop.kopi, 2, true).await;
        sell(&shop, TransactionType::Purchase, &shop.kopi, 10, false).await;
        shop.db
            .expenses()
            .create(NewExpense {
                description: "Listrik".to_string(),
                amount: Money::from_amount(7_000),
                ..Default::default()
            })
            .await
            .unwrap();

        let summary = shop.db.reports().summary(this_month()).await.unwrap();
        assert_eq!(summary.sales.count, 1);
        assert_eq!(summary.sales.total.amount(), 20_000);
        assert_eq!(summary.expenses.total.amount(), 7_000);
        assert_eq!(summary.profit.amount(), 13_000);
        assert_eq!(summary.products, 2);
        assert_eq!(summary.customers, 1);
    }

    #[tokio::test]
    async fn test_rankings() {
        let shop = shop().await;
        sell(&shop, TransactionType::Sale, &shop.kopi, 1, true).await;
        sell(&shop, TransactionType::Sale, &shop.teh, 3, true).await;
        sell(&shop, TransactionType::Sale, &shop.kopi, 1, false).await;

        let reports = shop.db.reports();
        let products = reports.top_products(this_month()).await.unwrap();
        assert_eq!(products[0].name, "Teh");
        assert_eq!(products[0].qty_sold, 3);
        assert_eq!(products[1].revenue.amount(), 20_000);

        let customers = reports.top_customers(this_month()).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].tx_count, 2);
        assert_eq!(customers[0].total_spent.amount(), 25_000);

        let days = reports.sales_by_day(this_month()).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].count, 3);
        assert_eq!(days[0].date, Utc::now().date_naive().format("%Y-%m-%d").to_string());

        // teh: 6 - 3 = 3, at or below the default threshold of 5
        let low = reports.low_stock(None).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].stock, 3);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let shop = shop().await;
        sell(&shop, TransactionType::Sale, &shop.kopi, 2, true).await;
        sell(&shop, TransactionType::Return, &shop.kopi, 1, false).await;

        let stats = shop.db.reports().dashboard(Utc::now()).await.unwrap();
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.today_transactions, 1);
        assert_eq!(stats.today_sales.amount(), 20_000);
        assert_eq!(stats.month_sales.amount(), 20_000);
        assert_eq!(stats.recent_transactions.len(), 1);
        assert_eq!(
            stats.recent_transactions[0].customer_name.as_deref(),
            Some("Pak Joko")
        );
        assert!(stats.low_stock_products.is_empty());
    }

    #[tokio::test]
    async fn test_run_dispatches_by_kind() {
        let shop = shop().await;
        let data = shop
            .db
            .reports()
            .run(ReportKind::LowStock, this_month())
            .await
            .unwrap();
        assert!(matches!(data, ReportData::LowStock(_)));
    }
}
