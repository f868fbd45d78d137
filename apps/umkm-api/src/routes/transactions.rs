//! Checkout and the transaction ledger.

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use umkm_core::checkout::CheckoutReceipt;
use umkm_core::validation::{parse_bound, parse_date};
use umkm_core::{Action, Money, PaymentStatus, Resource, TransactionType};
use umkm_db::{CheckoutLine, CheckoutRequest, TransactionFilter};

use super::{optional_text, require_id, IdQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/transactions",
        get(list_transactions)
            .post(checkout)
            .delete(delete_transaction),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: i64,
    /// Omitted: the product's current price.
    pub price: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub customer_id: Option<String>,
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    pub tax: Option<i64>,
    pub discount: Option<i64>,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub due_date: Option<String>,
    pub paid_amount: Option<i64>,
    pub notes: Option<String>,
}

impl CheckoutBody {
    fn into_request(self) -> ApiResult<CheckoutRequest> {
        if self.items.is_empty() {
            return Err(ApiError::Validation("items is required".to_string()));
        }

        let due_date = optional_text(self.due_date)
            .map(|raw| parse_date("dueDate", &raw))
            .transpose()?;

        let lines = self
            .items
            .into_iter()
            .map(|item| CheckoutLine {
                product_id: item.product_id,
                product_name: optional_text(item.product_name),
                quantity: item.quantity,
                price: item.price.map(Money::from_amount),
            })
            .collect();

        Ok(CheckoutRequest {
            transaction_type: self.transaction_type.unwrap_or(TransactionType::Sale),
            customer_id: optional_text(self.customer_id),
            supplier_id: optional_text(self.supplier_id),
            lines,
            tax: Money::from_amount(self.tax.unwrap_or(0)),
            discount: Money::from_amount(self.discount.unwrap_or(0)),
            payment_method: optional_text(self.payment_method),
            payment_status: self.payment_status,
            due_date,
            paid_amount: self.paid_amount.map(Money::from_amount),
            notes: optional_text(self.notes),
        })
    }
}

/// `GET /api/transactions`: one transaction with its items, or the latest
/// matching the filters.
async fn list_transactions(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> ApiResult<Response> {
    session.require(Resource::Transactions, Action::View)?;

    if let Some(id) = present(&query.id) {
        let detail = db
            .transactions()
            .get_detail(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Transaction not found: {}", id)))?;
        return Ok(ApiResponse::ok(detail).into_response());
    }

    let filter = TransactionFilter {
        transaction_type: present(&query.transaction_type)
            .map(str::parse::<TransactionType>)
            .transpose()?,
        start: present(&query.start_date)
            .map(|raw| parse_bound("startDate", raw, false))
            .transpose()?,
        end: present(&query.end_date)
            .map(|raw| parse_bound("endDate", raw, true))
            .transpose()?,
    };

    let transactions = db.transactions().list(&filter).await?;
    Ok(ApiResponse::ok(transactions).into_response())
}

/// `POST /api/transactions`: records the sale, purchase or return and
/// moves stock in one database transaction.
async fn checkout(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<CheckoutBody>,
) -> ApiResult<ApiResponse<CheckoutReceipt>> {
    session.require(Resource::Transactions, Action::Create)?;

    let request = body.into_request()?;
    let receipt = db.transactions().checkout(request).await?;

    let message = if receipt.payment_status == PaymentStatus::Paid {
        "Transaction recorded"
    } else {
        "Credit transaction recorded"
    };
    Ok(ApiResponse::ok(receipt).with_message(message))
}

async fn delete_transaction(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<ApiResponse<()>> {
    session.require(Resource::Transactions, Action::Delete)?;

    let id = require_id(&query.id, "Transaction")?;
    db.transactions().delete(id).await?;

    Ok(ApiResponse::message("Transaction deleted"))
}
