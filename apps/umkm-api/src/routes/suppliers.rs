//! Supplier handlers.

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
use umkm_core::{Action, Resource, Supplier};
use umkm_db::{NewSupplier, SupplierPatch};

use super::{optional_text, require_id, IdQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/suppliers",
        get(list_suppliers)
            .post(create_supplier)
            .put(update_supplier)
            .delete(delete_supplier),
    )
}

#[derive(Debug, Deserialize)]
pub struct SupplierQuery {
    pub id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<Value>,
}

impl SupplierBody {
    fn email(&mut self) -> ApiResult<Option<String>> {
        Ok(optional_text(self.email.take())
            .map(|e| validate_email(&e))
            .transpose()?)
    }
}

async fn list_suppliers(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<SupplierQuery>,
) -> ApiResult<Response> {
    session.require(Resource::Suppliers, Action::View)?;

    if let Some(id) = present(&query.id) {
        let supplier = db
            .suppliers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Supplier not found: {}", id)))?;
        return Ok(ApiResponse::ok(supplier).into_response());
    }

    let search = present(&query.search)
        .map(validate_search_query)
        .transpose()?
        .flatten();

    let suppliers = db.suppliers().list(search.as_deref()).await?;
    Ok(ApiResponse::ok(suppliers).into_response())
}

async fn create_supplier(
    session: Session,
    db: ActiveDb,
    ApiJson(mut body): ApiJson<SupplierBody>,
) -> ApiResult<ApiResponse<Supplier>> {
    session.require(Resource::Suppliers, Action::Create)?;

    let new = NewSupplier {
        name: validate_name("name", body.name.as_deref().unwrap_or_default())?,
        email: body.email()?,
        phone: optional_text(body.phone),
        address: optional_text(body.address),
        bank_name: optional_text(body.bank_name),
        bank_account: optional_text(body.bank_account),
        notes: optional_text(body.notes),
        custom_fields: validate_custom_fields(body.custom_fields.as_ref())?,
    };

    let supplier = db.suppliers().create(new).await?;
    info!(supplier_id = %supplier.id, "Supplier created");

    Ok(ApiResponse::ok(supplier).with_message("Supplier created"))
}

async fn update_supplier(
    session: Session,
    db: ActiveDb,
    ApiJson(mut body): ApiJson<SupplierBody>,
) -> ApiResult<ApiResponse<Supplier>> {
    session.require(Resource::Suppliers, Action::Edit)?;

    let id = require_id(&body.id, "Supplier")?.to_string();
    let patch = SupplierPatch {
        name: optional_text(body.name.take())
            .map(|n| validate_name("name", &n))
            .transpose()?,
        email: body.email()?,
        phone: optional_text(body.phone),
        address: optional_text(body.address),
        bank_name: optional_text(body.bank_name),
        bank_account: optional_text(body.bank_account),
        notes: optional_text(body.notes),
        custom_fields: validate_custom_fields(body.custom_fields.as_ref())?,
    };

    let supplier = db.suppliers().update(&id, patch).await?;
    Ok(ApiResponse::ok(supplier).with_message("Supplier updated"))
}

async fn delete_supplier(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<ApiResponse<()>> {
    session.require(Resource::Suppliers, Action::Delete)?;

    let id = require_id(&query.id, "Supplier")?;
    db.suppliers().delete(id).await?;
    info!(supplier_id = %id, "Supplier deleted");

    Ok(ApiResponse::message("Supplier deleted"))
}
