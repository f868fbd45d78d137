//! # Module Repository
//!
//! Registry of dashboard features the owner can switch on and off.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use umkm_core::defaults::DEFAULT_MODULES;
use umkm_core::Module;

#[derive(Debug, Clone)]
pub struct ModuleRepository {
    pool: SqlitePool,
}

impl ModuleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ModuleRepository { pool }
    }

    /// Modules in menu order.
    pub async fn list(&self) -> DbResult<Vec<Module>> {
        let modules = sqlx::query_as::<_, Module>("SELECT * FROM modules ORDER BY sort_order, name")
            .fetch_all(&self.pool)
            .await?;

        Ok(modules)
    }

    pub async fn set_enabled(&self, slug: &str, enabled: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE modules SET enabled = ? WHERE slug = ?")
            .bind(enabled)
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Module", slug));
        }

        debug!(slug = %slug, enabled, "Module toggled");
        Ok(())
    }

    /// Registers the built-in modules. The slug doubles as the id.
    pub async fn seed_defaults(&self) -> DbResult<()> {
        for module in DEFAULT_MODULES {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO modules (id, name, slug, icon, description, enabled, sort_order)
                VALUES (?, ?, ?, ?, ?, 1, ?)
                "#,
            )
            .bind(module.slug)
            .bind(module.name)
            .bind(module.slug)
            .bind(module.icon)
            .bind(module.description)
            .bind(module.sort_order)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_seed_and_toggle() {
        let repo = Database::new(DbConfig::in_memory()).await.unwrap().modules();
        repo.seed_defaults().await.unwrap();
        repo.seed_defaults().await.unwrap();

        let modules = repo.list().await.unwrap();
        assert_eq!(modules.len(), DEFAULT_MODULES.len());
        assert_eq!(modules[0].slug, "products");
        assert!(modules.iter().all(|m| m.enabled));

        repo.set_enabled("suppliers", false).await.unwrap();
        let suppliers = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|m| m.slug == "suppliers")
            .unwrap();
        assert!(!suppliers.enabled);

        assert!(repo.set_enabled("payroll", true).await.is_err());
    }
}
