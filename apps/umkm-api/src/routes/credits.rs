//! Outstanding balances and credit payments.

use axum::{routing::get, Router};
use serde::Deserialize;

use umkm_core::credit::PaymentReceipt;
use umkm_core::{Action, CreditEntry, CreditPayment, Money, PaymentStatus, Resource};
use umkm_db::{CreditFilter, NewCreditPayment};

use super::{optional_text, require_id, today};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/credits",
        get(list_credits).post(record_payment).put(payment_history),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditQuery {
    /// `unpaid`, `partial` or `all`.
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub overdue: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    pub transaction_id: Option<String>,
    pub amount: Option<i64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBody {
    pub transaction_id: Option<String>,
}

fn status_filter(raw: Option<&str>) -> ApiResult<Option<PaymentStatus>> {
    match raw {
        None | Some("all") => Ok(None),
        Some(status) => Ok(Some(status.parse()?)),
    }
}

/// `GET /api/credits`: unsettled transactions, soonest due first, with a
/// ledger-wide `summary`.
async fn list_credits(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<CreditQuery>,
) -> ApiResult<ApiResponse<Vec<CreditEntry>>> {
    session.require(Resource::Transactions, Action::View)?;

    let filter = CreditFilter {
        status: status_filter(present(&query.status))?,
        customer_id: present(&query.customer_id).map(str::to_string),
        overdue: present(&query.overdue) == Some("true"),
    };

    let today = today();
    let credits = db.credits().list(&filter, today).await?;
    let summary = db.credits().summary(today).await?;

    Ok(ApiResponse::ok(credits).with_field("summary", summary))
}

/// `POST /api/credits`: applies a payment to one transaction's balance.
async fn record_payment(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<PaymentBody>,
) -> ApiResult<ApiResponse<PaymentReceipt>> {
    session.require(Resource::Transactions, Action::Create)?;

    let transaction_id = require_id(&body.transaction_id, "Transaction")?.to_string();
    let amount = body
        .amount
        .ok_or_else(|| ApiError::Validation("amount is required".to_string()))?;

    let receipt = db
        .credits()
        .record_payment(NewCreditPayment {
            transaction_id,
            amount: Money::from_amount(amount),
            payment_method: optional_text(body.payment_method),
            notes: optional_text(body.notes),
        })
        .await?;

    let message = if receipt.status == PaymentStatus::Paid {
        "Credit fully paid"
    } else {
        "Payment recorded"
    };
    Ok(ApiResponse::ok(receipt).with_message(message))
}

/// `PUT /api/credits`: the payments made against `transactionId`, newest
/// first.
async fn payment_history(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<HistoryBody>,
) -> ApiResult<ApiResponse<Vec<CreditPayment>>> {
    session.require(Resource::Transactions, Action::View)?;

    let transaction_id = require_id(&body.transaction_id, "Transaction")?;
    let payments = db.credits().history(transaction_id).await?;

    Ok(ApiResponse::ok(payments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter() {
        assert_eq!(status_filter(None).unwrap(), None);
        assert_eq!(status_filter(Some("all")).unwrap(), None);
        assert_eq!(
            status_filter(Some("partial")).unwrap(),
            Some(PaymentStatus::Partial)
        );
        assert!(matches!(
            status_filter(Some("lunas")),
            Err(ApiError::Validation(_))
        ));
    }
}
