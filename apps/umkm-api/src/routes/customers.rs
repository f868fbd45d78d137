//! Customer handlers.

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use umkm_core::validation::{
    validate_custom_fields, validate_email, validate_name, validate_search_query,
};
use umkm_core::{Action, Customer, Resource};
use umkm_db::{CustomerFilter, CustomerPatch, NewCustomer};

use super::{optional_text, require_id, IdQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/customers",
        get(list_customers)
            .post(create_customer)
            .put(update_customer)
            .delete(delete_customer),
    )
}

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<Value>,
}

fn email(raw: Option<String>) -> ApiResult<Option<String>> {
    Ok(optional_text(raw).map(|e| validate_email(&e)).transpose()?)
}

async fn list_customers(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Response> {
    session.require(Resource::Customers, Action::View)?;

    if let Some(id) = present(&query.id) {
        let customer = db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Customer not found: {}", id)))?;
        return Ok(ApiResponse::ok(customer).into_response());
    }

    let filter = CustomerFilter {
        search: present(&query.search)
            .map(validate_search_query)
            .transpose()?
            .flatten(),
    };

    let customers = db.customers().list(&filter).await?;
    Ok(ApiResponse::ok(customers).into_response())
}

async fn create_customer(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<CustomerBody>,
) -> ApiResult<ApiResponse<Customer>> {
    session.require(Resource::Customers, Action::Create)?;

    let new = NewCustomer {
        name: validate_name("name", body.name.as_deref().unwrap_or_default())?,
        email: email(body.email)?,
        phone: optional_text(body.phone),
        address: optional_text(body.address),
        notes: optional_text(body.notes),
        custom_fields: validate_custom_fields(body.custom_fields.as_ref())?,
    };

    let customer = db.customers().create(new).await?;
    info!(customer_id = %customer.id, "Customer created");

    Ok(ApiResponse::ok(customer).with_message("Customer created"))
}

async fn update_customer(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<CustomerBody>,
) -> ApiResult<ApiResponse<Customer>> {
    session.require(Resource::Customers, Action::Edit)?;

    let id = require_id(&body.id, "Customer")?.to_string();
    let patch = CustomerPatch {
        name: optional_text(body.name)
            .map(|n| validate_name("name", &n))
            .transpose()?,
        email: email(body.email)?,
        phone: optional_text(body.phone),
        address: optional_text(body.address),
        notes: optional_text(body.notes),
        custom_fields: validate_custom_fields(body.custom_fields.as_ref())?,
    };

    let customer = db.customers().update(&id, patch).await?;
    Ok(ApiResponse::ok(customer).with_message("Customer updated"))
}

async fn delete_customer(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<ApiResponse<()>> {
    session.require(Resource::Customers, Action::Delete)?;

    let id = require_id(&query.id, "Customer")?;
    db.customers().delete(id).await?;
    info!(customer_id = %id, "Customer deleted");

    Ok(ApiResponse::message("Customer deleted"))
}
