//! # Supplier Repository
//!
//! CRUD for suppliers. Listing is alphabetical.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::like_pattern;
use crate::error::{DbError, DbResult};
use umkm_core::{new_id, Supplier};

#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<String>,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers by name, optionally matching name, email or phone.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Supplier>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM suppliers");

        if let Some(term) = search {
            let pattern = like_pattern(term);
            query
                .push(" WHERE name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR email LIKE ")
                .push_bind(pattern.clone())
                .push(" OR phone LIKE ")
                .push_bind(pattern);
        }

        query.push(" ORDER BY name ASC");

        let suppliers = query
            .build_query_as::<Supplier>()
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn create(&self, supplier: NewSupplier) -> DbResult<Supplier> {
        let id = new_id();
        let now = Utc::now();

        debug!(id = %id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, email, phone, address, bank_name, bank_account,
                notes, custom_fields, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&supplier.name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.bank_name)
        .bind(&supplier.bank_account)
        .bind(&supplier.notes)
        .bind(&supplier.custom_fields)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch(&id).await
    }

    pub async fn update(&self, id: &str, patch: SupplierPatch) -> DbResult<Supplier> {
        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                address = COALESCE(?, address),
                bank_name = COALESCE(?, bank_name),
                bank_account = COALESCE(?, bank_account),
                notes = COALESCE(?, notes),
                custom_fields = COALESCE(?, custom_fields),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(&patch.address)
        .bind(&patch.bank_name)
        .bind(&patch.bank_account)
        .bind(&patch.notes)
        .bind(&patch.custom_fields)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        debug!(id = %id, "Supplier updated");
        self.fetch(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    async fn fetch(&self, id: &str) -> DbResult<Supplier> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }
}
