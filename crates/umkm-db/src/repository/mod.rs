//! # Repository Module
//!
//! One repository per resource. Each holds a cloned `SqlitePool` and is
//! handed out by [`Database`](crate::Database).
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  db.transactions().checkout(request)                            │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                  │
//! │  ├── checkout(&self, request)     ← one BEGIN IMMEDIATE transaction    │
//! │  ├── list(&self, filter)                                                │
//! │  ├── get(&self, id)                                                     │
//! │  └── delete(&self, id)                                                  │
//! │       │                                                                 │
//! │       │  parameterized SQL                                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalogue CRUD, search, low-stock filter
//! - [`customer::CustomerRepository`] - Customer CRUD
//! - [`supplier::SupplierRepository`] - Supplier CRUD
//! - [`transaction::TransactionRepository`] - Checkout, history, delete
//! - [`credit::CreditRepository`] - Receivables and payment ledger
//! - [`expense::ExpenseRepository`] - Expense log
//! - [`settings::SettingsRepository`] - Business settings
//! - [`module::ModuleRepository`] - Dashboard module registry
//! - [`user::UserRepository`] - Accounts
//! - [`report::ReportRepository`] - Aggregates and dashboard stats
//! - [`export::ExportRepository`] - Tabular exports

pub mod credit;
pub mod customer;
pub mod expense;
pub mod export;
pub mod module;
pub mod product;
pub mod report;
pub mod settings;
pub mod supplier;
pub mod transaction;
pub mod user;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

/// Starts a transaction that holds SQLite's write lock from `BEGIN`.
///
/// A deferred transaction that reads before it writes gets `SQLITE_BUSY`
/// on the upgrade without waiting; an immediate one queues behind the busy
/// timeout.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// `%term%` for a LIKE match.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{term}%")
}
