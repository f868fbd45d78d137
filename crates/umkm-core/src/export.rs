//! # Export
//!
//! Export kinds, their column lists and CSV rendering.
//!
//! Rows are kept as JSON values so the same table can be rendered as CSV or
//! returned as JSON objects keyed by header.
//!
//! ```rust
//! use serde_json::json;
//! use umkm_core::export::{ExportKind, ExportTable};
//!
//! let mut table = ExportTable::new(ExportKind::Customers);
//! table.push(vec![
//!     json!("c-1"), json!("Budi, Jr."), json!(null), json!("0812"),
//!     json!(null), json!("says \"hi\""), json!("2025-01-01"),
//! ]);
//!
//! let csv = table.to_csv();
//! assert!(csv.starts_with("ID,Name,Email,Phone,Address,Notes,Created\n"));
//! assert!(csv.ends_with("c-1,\"Budi, Jr.\",,0812,,\"says \"\"hi\"\"\",2025-01-01"));
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;

/// Content type of CSV downloads.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

// =============================================================================
// Kind & Format
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ExportKind {
    Transactions,
    Products,
    Expenses,
    Customers,
    Credits,
}

impl ExportKind {
    pub const ALL: [ExportKind; 5] = [
        ExportKind::Transactions,
        ExportKind::Products,
        ExportKind::Expenses,
        ExportKind::Customers,
        ExportKind::Credits,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Transactions => "transactions",
            ExportKind::Products => "products",
            ExportKind::Expenses => "expenses",
            ExportKind::Customers => "customers",
            ExportKind::Credits => "credits",
        }
    }

    /// Column headers, in the order rows are produced.
    pub const fn headers(&self) -> &'static [&'static str] {
        match self {
            ExportKind::Transactions => &[
                "ID",
                "Type",
                "Customer",
                "Subtotal",
                "Tax",
                "Discount",
                "Total",
                "Paid",
                "Payment Status",
                "Payment Method",
                "Due Date",
                "Status",
                "Notes",
                "Created",
            ],
            ExportKind::Products => &[
                "ID",
                "SKU",
                "Name",
                "Description",
                "Price",
                "Cost",
                "Stock",
                "Min Stock",
                "Created",
            ],
            ExportKind::Expenses => &[
                "ID",
                "Description",
                "Amount",
                "Category",
                "Date",
                "Payment Method",
                "Notes",
                "Created",
            ],
            ExportKind::Customers => &[
                "ID", "Name", "Email", "Phone", "Address", "Notes", "Created",
            ],
            ExportKind::Credits => &[
                "ID",
                "Customer",
                "Phone",
                "Total",
                "Paid",
                "Remaining",
                "Status",
                "Due Date",
                "Created",
            ],
        }
    }

    /// Whether `startDate`/`endDate` narrow this export.
    pub const fn is_date_filtered(&self) -> bool {
        matches!(self, ExportKind::Transactions | ExportKind::Expenses)
    }

    /// `<type>_<YYYY-MM-DD>`, without extension.
    pub fn file_stem(&self, today: NaiveDate) -> String {
        format!("{}_{}", self.as_str(), today.format("%Y-%m-%d"))
    }
}

impl FromStr for ExportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownKind {
                kind: "export",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(CoreError::UnknownKind {
                kind: "format",
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Rows ready for export, in header order.
#[derive(Debug, Clone)]
pub struct ExportTable {
    pub kind: ExportKind,
    pub rows: Vec<Vec<Value>>,
}

impl ExportTable {
    pub fn new(kind: ExportKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &'static [&'static str] {
        self.kind.headers()
    }

    pub fn push(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.headers().len());
        self.rows.push(row);
    }

    /// Renders the table as CSV: header line first, `\n` between rows,
    /// no trailing newline.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.headers().join(","));

        for row in &self.rows {
            let fields: Vec<Cow<'_, str>> = row.iter().map(csv_field).collect();
            lines.push(fields.join(","));
        }

        lines.join("\n")
    }

    /// One JSON object per row keyed by header.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers()
                    .iter()
                    .zip(row)
                    .map(|(h, v)| (h.to_string(), v.clone()))
                    .collect()
            })
            .collect()
    }
}

fn csv_field(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => escape_csv(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Quotes a field when it contains a comma, quote or newline, doubling any
/// embedded quotes.
pub fn escape_csv(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
