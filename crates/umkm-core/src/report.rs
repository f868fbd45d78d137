//! # Reports
//!
//! Report kinds and the row shapes each one returns. The aggregation itself
//! is SQL in `umkm-db`; this module only names the outputs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::period::ReportPeriod;
use crate::types::TransactionSummary;

/// Rows returned by the top-N reports.
pub const TOP_N: i64 = 10;

/// Rows shown in each dashboard widget.
pub const DASHBOARD_WIDGET_ROWS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ReportKind {
    #[default]
    Summary,
    SalesByDay,
    ExpensesByCategory,
    TopProducts,
    TopCustomers,
    LowStock,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Summary,
        ReportKind::SalesByDay,
        ReportKind::ExpensesByCategory,
        ReportKind::TopProducts,
        ReportKind::TopCustomers,
        ReportKind::LowStock,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Summary => "summary",
            ReportKind::SalesByDay => "sales-by-day",
            ReportKind::ExpensesByCategory => "expenses-by-category",
            ReportKind::TopProducts => "top-products",
            ReportKind::TopCustomers => "top-customers",
            ReportKind::LowStock => "low-stock",
        }
    }
}

impl FromStr for ReportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownKind {
                kind: "report",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Row Shapes
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CountTotal {
    pub count: i64,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SummaryReport {
    pub sales: CountTotal,
    pub expenses: CountTotal,
    /// Sales total minus expenses total.
    pub profit: Money,
    pub products: i64,
    pub customers: i64,
    pub period: ReportPeriod,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySales {
    /// `YYYY-MM-DD` in UTC.
    pub date: String,
    pub count: i64,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategoryExpenses {
    pub category: String,
    pub count: i64,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub id: String,
    pub name: String,
    pub qty_sold: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopCustomer {
    pub id: String,
    pub name: String,
    pub tx_count: i64,
    pub total_spent: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LowStockItem {
    pub id: String,
    pub name: String,
    pub stock: i64,
    pub min_stock: i64,
}

/// `GET /api/dashboard/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_customers: i64,
    pub today_sales: Money,
    pub today_transactions: i64,
    pub month_sales: Money,
    pub month_transactions: i64,
    pub low_stock_products: Vec<LowStockItem>,
    pub recent_transactions: Vec<TransactionSummary>,
}

impl SummaryReport {
    pub fn new(
        sales: CountTotal,
        expenses: CountTotal,
        products: i64,
        customers: i64,
        period: ReportPeriod,
    ) -> Self {
        Self {
            profit: sales.total - expenses.total,
            sales,
            expenses,
            products,
            customers,
            period,
        }
    }
}
