//! Expense handlers.

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use umkm_core::validation::{parse_date, validate_amount, validate_name};
use umkm_core::{Action, Expense, Money, Resource};
use umkm_db::{ExpenseFilter, ExpensePatch, NewExpense};

use super::{optional_text, require_id, IdQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/expenses",
        get(list_expenses)
            .post(create_expense)
            .put(update_expense)
            .delete(delete_expense),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    pub id: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBody {
    pub id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<i64>,
    pub category: Option<String>,
    pub expense_date: Option<String>,
    pub payment_method: Option<String>,
    pub receipt: Option<String>,
    pub notes: Option<String>,
}

fn amount(raw: Option<i64>) -> ApiResult<Option<Money>> {
    raw.map(|a| -> ApiResult<Money> {
        validate_amount("amount", a)?;
        Ok(Money::from_amount(a))
    })
    .transpose()
}

fn date(field: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    Ok(raw.map(|r| parse_date(field, r)).transpose()?)
}

/// `GET /api/expenses`: `{expenses, total}` for the filters, or one expense
/// by `id`.
async fn list_expenses(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<ExpenseQuery>,
) -> ApiResult<Response> {
    session.require(Resource::Expenses, Action::View)?;

    if let Some(id) = present(&query.id) {
        let expense = db
            .expenses()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Expense not found: {}", id)))?;
        return Ok(ApiResponse::ok(expense).into_response());
    }

    let filter = ExpenseFilter {
        category: present(&query.category).map(str::to_string),
        start: date("startDate", present(&query.start_date))?,
        end: date("endDate", present(&query.end_date))?,
    };

    let list = db.expenses().list(&filter).await?;
    Ok(ApiResponse::ok(list).into_response())
}

async fn create_expense(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<ExpenseBody>,
) -> ApiResult<ApiResponse<Expense>> {
    session.require(Resource::Expenses, Action::Create)?;

    let description = validate_name("description", body.description.as_deref().unwrap_or_default())?;
    let amount = amount(body.amount)?
        .ok_or_else(|| ApiError::Validation("amount is required".to_string()))?;

    let new = NewExpense {
        description,
        amount,
        category: optional_text(body.category),
        expense_date: date("expenseDate", optional_text(body.expense_date).as_deref())?,
        payment_method: optional_text(body.payment_method),
        receipt: optional_text(body.receipt),
        notes: optional_text(body.notes),
    };

    let expense = db.expenses().create(new).await?;
    info!(
        expense_id = %expense.id,
        amount = expense.amount.amount(),
        category = %expense.category,
        "Expense recorded"
    );

    Ok(ApiResponse::ok(expense).with_message("Expense recorded"))
}

async fn update_expense(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<ExpenseBody>,
) -> ApiResult<ApiResponse<Expense>> {
    session.require(Resource::Expenses, Action::Edit)?;

    let id = require_id(&body.id, "Expense")?.to_string();
    let patch = ExpensePatch {
        description: optional_text(body.description)
            .map(|d| validate_name("description", &d))
            .transpose()?,
        amount: amount(body.amount)?,
        category: optional_text(body.category),
        expense_date: date("expenseDate", optional_text(body.expense_date).as_deref())?,
        payment_method: optional_text(body.payment_method),
        receipt: optional_text(body.receipt),
        notes: optional_text(body.notes),
    };

    let expense = db.expenses().update(&id, patch).await?;
    Ok(ApiResponse::ok(expense).with_message("Expense updated"))
}

async fn delete_expense(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<ApiResponse<()>> {
    session.require(Resource::Expenses, Action::Delete)?;

    let id = require_id(&query.id, "Expense")?;
    db.expenses().delete(id).await?;
    info!(expense_id = %id, "Expense deleted");

    Ok(ApiResponse::message("Expense deleted"))
}
