//! Product catalogue handlers.

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use umkm_core::validation::{
    validate_custom_fields, validate_name, validate_price, validate_search_query, validate_sku,
};
use umkm_core::{Action, Money, Product, Resource};
use umkm_db::{NewProduct, ProductFilter, ProductPatch};

use super::{optional_text, require_id, IdQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::response::{present, ApiJson, ApiQuery, ApiResponse};
use crate::state::{ActiveDb, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/products",
        get(list_products)
            .post(create_product)
            .put(update_product)
            .delete(delete_product),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub id: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub low_stock: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub cost: Option<i64>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub custom_fields: Option<Value>,
}

fn money(field: &str, amount: Option<i64>) -> ApiResult<Option<Money>> {
    amount
        .map(|a| -> ApiResult<Money> {
            validate_price(field, a)?;
            Ok(Money::from_amount(a))
        })
        .transpose()
}

/// `GET /api/products`: one product by `id`, or the filtered list.
async fn list_products(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Response> {
    session.require(Resource::Products, Action::View)?;

    if let Some(id) = present(&query.id) {
        let product = db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Product not found: {}", id)))?;
        return Ok(ApiResponse::ok(product).into_response());
    }

    let filter = ProductFilter {
        search: present(&query.search)
            .map(validate_search_query)
            .transpose()?
            .flatten(),
        category_id: present(&query.category).map(str::to_string),
        low_stock: present(&query.low_stock) == Some("true"),
    };

    let products = db.products().list(&filter).await?;
    Ok(ApiResponse::ok(products).into_response())
}

async fn create_product(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<ProductBody>,
) -> ApiResult<ApiResponse<Product>> {
    session.require(Resource::Products, Action::Create)?;

    let name = validate_name("name", body.name.as_deref().unwrap_or_default())?;
    let new = NewProduct {
        name,
        sku: validate_sku(body.sku.as_deref())?,
        description: optional_text(body.description),
        price: money("price", body.price)?.unwrap_or_default(),
        cost: money("cost", body.cost)?.unwrap_or_default(),
        stock: body.stock.unwrap_or(0),
        min_stock: body.min_stock,
        category_id: optional_text(body.category_id),
        image_url: optional_text(body.image_url),
        custom_fields: validate_custom_fields(body.custom_fields.as_ref())?,
    };

    let product = db.products().create(new).await?;
    info!(product_id = %product.id, name = %product.name, "Product created");

    Ok(ApiResponse::ok(product).with_message("Product created"))
}

/// `PUT /api/products`: partial update, `id` in the body.
async fn update_product(
    session: Session,
    db: ActiveDb,
    ApiJson(body): ApiJson<ProductBody>,
) -> ApiResult<ApiResponse<Product>> {
    session.require(Resource::Products, Action::Edit)?;

    let id = require_id(&body.id, "Product")?.to_string();
    let patch = ProductPatch {
        name: optional_text(body.name)
            .map(|n| validate_name("name", &n))
            .transpose()?,
        sku: validate_sku(body.sku.as_deref())?,
        description: optional_text(body.description),
        price: money("price", body.price)?,
        cost: money("cost", body.cost)?,
        stock: body.stock,
        min_stock: body.min_stock,
        category_id: optional_text(body.category_id),
        image_url: optional_text(body.image_url),
        custom_fields: validate_custom_fields(body.custom_fields.as_ref())?,
    };

    let product = db.products().update(&id, patch).await?;
    Ok(ApiResponse::ok(product).with_message("Product updated"))
}

async fn delete_product(
    session: Session,
    db: ActiveDb,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<ApiResponse<()>> {
    session.require(Resource::Products, Action::Delete)?;

    let id = require_id(&query.id, "Product")?;
    db.products().delete(id).await?;
    info!(product_id = %id, "Product deleted");

    Ok(ApiResponse::message("Product deleted"))
}
