//! # Customer Repository
//!
//! CRUD for customer contacts. Search matches name, email and phone.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::like_pattern;
use crate::error::{DbError, DbResult};
use umkm_core::{new_id, Customer};

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<String>,
}

/// Partial update: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists customers, newest first.
    pub async fn list(&self, filter: &CustomerFilter) -> DbResult<Vec<Customer>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM customers");

        if let Some(term) = &filter.search {
            let pattern = like_pattern(term);
            query
                .push(" WHERE name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR email LIKE ")
                .push_bind(pattern.clone())
                .push(" OR phone LIKE ")
                .push_bind(pattern);
        }

        query.push(" ORDER BY created_at DESC");

        let customers = query
            .build_query_as::<Customer>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = customers.len(), "Customer list returned");
        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn create(&self, customer: NewCustomer) -> DbResult<Customer> {
        let id = new_id();
        let now = Utc::now();

        debug!(id = %id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, notes, custom_fields, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.notes)
        .bind(&customer.custom_fields)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch(&id).await
    }

    pub async fn update(&self, id: &str, patch: CustomerPatch) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                address = COALESCE(?, address),
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
        .bind(&patch.notes)
        .bind(&patch.custom_fields)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.fetch(id).await
    }

    /// Deletes a customer. Their transactions stay, with `customer_id` cleared.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        debug!(id = %id, "Customer deleted");
        Ok(())
    }

    async fn fetch(&self, id: &str) -> DbResult<Customer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }
}
