//! # umkm-db: Database Layer for the UMKM ERP
//!
//! SQLite storage through sqlx: connection pools, embedded migrations and
//! one repository per resource.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        UMKM ERP Data Flow                               │
//! │                                                                         │
//! │  axum handler (POST /api/transactions)                                 │
//! │       │  ActiveDb extractor hands over a Database                       │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     umkm-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TransactionRepo│   │ 0001_initial │  │   │
//! │  │   │ WAL, FKs on   │    │ CreditRepo ...│    │  _schema.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   data/umkm.db (or whatever the db_url cookie names)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded migrations and init-time seeding
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use umkm_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("sqlite://data/umkm.db")).await?;
//! db.initialize().await?;
//!
//! let low = db.products().list(&ProductFilter::low_stock()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::InitReport;
pub use pool::{database_file, normalize_url, Database, DbConfig, DbStats};

// Repository re-exports for convenience
pub use repository::credit::{CreditFilter, CreditRepository, NewCreditPayment};
pub use repository::customer::{CustomerFilter, CustomerPatch, CustomerRepository, NewCustomer};
pub use repository::expense::{ExpenseFilter, ExpenseList, ExpensePatch, ExpenseRepository, NewExpense};
pub use repository::export::{ExportRange, ExportRepository};
pub use repository::module::ModuleRepository;
pub use repository::product::{NewProduct, ProductFilter, ProductPatch, ProductRepository};
pub use repository::report::{ReportData, ReportRepository};
pub use repository::settings::{SettingsMap, SettingsRepository};
pub use repository::supplier::{NewSupplier, SupplierPatch, SupplierRepository};
pub use repository::transaction::{
    CheckoutLine, CheckoutRequest, TransactionFilter, TransactionRepository,
};
pub use repository::user::{NewUser, UserRepository};
