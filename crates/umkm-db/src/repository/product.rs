//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Filtered listing (search, category, low stock)
//! - CRUD with partial updates
//!
//! ## Filtering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How the list query is built                          │
//! │                                                                         │
//! │  GET /api/products?search=kopi&lowStock=true                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT * FROM products WHERE 1=1                                       │
//! │    AND (name LIKE ? OR sku LIKE ? OR description LIKE ?)  ← "%kopi%"    │
//! │    AND stock <= min_stock                                               │
//! │  ORDER BY created_at DESC                                               │
//! │                                                                         │
//! │  Every value is bound; only the shape of the SQL changes.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::like_pattern;
use crate::error::{DbError, DbResult};
use umkm_core::{new_id, Money, Product, DEFAULT_MIN_STOCK};

/// Filters for [`ProductRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Matched against name, SKU and description.
    pub search: Option<String>,
    pub category_id: Option<String>,
    /// Only products at or below their reorder threshold.
    pub low_stock: bool,
}

impl ProductFilter {
    pub fn low_stock() -> Self {
        ProductFilter {
            low_stock: true,
            ..Default::default()
        }
    }
}

/// A validated product ready to insert.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Money,
    pub stock: i64,
    /// Falls back to [`DEFAULT_MIN_STOCK`].
    pub min_stock: Option<i64>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    /// JSON object text.
    pub custom_fields: Option<String>,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub cost: Option<Money>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub custom_fields: Option<String>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let matches = repo.list(&ProductFilter { search: Some("kopi".into()), ..Default::default() }).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products matching `filter`, newest first.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(?filter, "Listing products");

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE 1=1");

        if let Some(term) = &filter.search {
            let pattern = like_pattern(term);
            query
                .push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR sku LIKE ")
                .push_bind(pattern.clone())
                .push(" OR description LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(category_id) = &filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id.clone());
        }

        if filter.low_stock {
            query.push(" AND stock <= min_stock");
        }

        query.push(" ORDER BY created_at DESC");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Product list returned");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a product and returns the stored row.
    pub async fn create(&self, product: NewProduct) -> DbResult<Product> {
        let id = new_id();
        let now = Utc::now();

        debug!(id = %id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, price, cost, stock, min_stock,
                category_id, image_url, custom_fields, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.cost)
        .bind(product.stock)
        .bind(product.min_stock.unwrap_or(DEFAULT_MIN_STOCK))
        .bind(&product.category_id)
        .bind(&product.image_url)
        .bind(&product.custom_fields)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch(&id).await
    }

    /// Applies a partial update.
    ///
    /// ## Errors
    /// `DbError::NotFound` when no product has this id.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE(?, name),
                sku = COALESCE(?, sku),
                description = COALESCE(?, description),
                price = COALESCE(?, price),
                cost = COALESCE(?, cost),
                stock = COALESCE(?, stock),
                min_stock = COALESCE(?, min_stock),
                category_id = COALESCE(?, category_id),
                image_url = COALESCE(?, image_url),
                custom_fields = COALESCE(?, custom_fields),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.sku)
        .bind(&patch.description)
        .bind(patch.price)
        .bind(patch.cost)
        .bind(patch.stock)
        .bind(patch.min_stock)
        .bind(&patch.category_id)
        .bind(&patch.image_url)
        .bind(&patch.custom_fields)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.fetch(id).await
    }

    /// Deletes a product. Past transaction items keep their snapshot.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    async fn fetch(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    fn product(name: &str, sku: Option<&str>, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            sku: sku.map(str::to_string),
            price: Money::from_amount(10_000),
            cost: Money::from_amount(7_000),
            stock,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let repo = repo().await;

        let created = repo.create(product("Kopi Susu", None, 3)).await.unwrap();

        assert_eq!(created.name, "Kopi Susu");
        assert_eq!(created.min_stock, DEFAULT_MIN_STOCK);
        assert_eq!(created.price.amount(), 10_000);
        assert!(created.is_low_stock());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = repo().await;
        repo.create(product("Kopi Susu", Some("KOPI-1"), 50)).await.unwrap();
        repo.create(product("Teh Manis", Some("TEH-1"), 2)).await.unwrap();

        let all = repo.list(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let search = ProductFilter {
            search: Some("teh".to_string()),
            ..Default::default()
        };
        let found = repo.list(&search).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku.as_deref(), Some("TEH-1"));

        let low = repo.list(&ProductFilter::low_stock()).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Teh Manis");
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let repo = repo().await;
        let created = repo.create(product("Kopi", Some("K-1"), 10)).await.unwrap();

        let updated = repo
            .update(
                &created.id,
                ProductPatch {
                    price: Some(Money::from_amount(12_000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price.amount(), 12_000);
        assert_eq!(updated.name, "Kopi");
        assert_eq!(updated.stock, 10);
    }

    #[tokio::test]
    async fn test_missing_product_errors() {
        let repo = repo().await;

        assert!(repo.get_by_id("nope").await.unwrap().is_none());
        assert!(matches!(
            repo.update("nope", ProductPatch::default()).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(repo.delete("nope").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let repo = repo().await;
        repo.create(product("A", Some("DUP"), 1)).await.unwrap();

        let err = repo.create(product("B", Some("DUP"), 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field } if field == "sku"));
    }
}
