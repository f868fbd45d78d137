//! # Settings Repository
//!
//! Business settings as key/value rows. Reads flatten them into a map.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use umkm_core::defaults::{DEFAULT_SETTINGS, DEFAULT_SETTING_CATEGORY};
use umkm_core::Setting;

/// `key → value`, ordered by key.
pub type SettingsMap = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// All settings, or those of one category.
    pub async fn list(&self, category: Option<&str>) -> DbResult<Vec<Setting>> {
        let settings = match category {
            Some(category) => {
                sqlx::query_as::<_, Setting>(
                    "SELECT * FROM settings WHERE category = ? ORDER BY key",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY key")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(settings)
    }

    /// Flat map for the settings screen.
    pub async fn map(&self, category: Option<&str>) -> DbResult<SettingsMap> {
        Ok(self
            .list(category)
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect())
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value.flatten())
    }

    /// Inserts or overwrites every entry. An existing row keeps its category.
    pub async fn upsert_many<I>(&self, entries: I, category: Option<&str>) -> DbResult<usize>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let category = category.unwrap_or(DEFAULT_SETTING_CATEGORY);
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, category, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(&key)
            .bind(&value)
            .bind(category)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(count = written, category = %category, "Settings saved");
        Ok(written)
    }

    /// Writes the default settings, leaving existing keys untouched.
    pub async fn seed_defaults(&self) -> DbResult<()> {
        let now = Utc::now();

        for setting in DEFAULT_SETTINGS {
            sqlx::query(
                "INSERT OR IGNORE INTO settings (key, value, category, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(setting.key)
            .bind(setting.value)
            .bind(setting.category)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }

        debug!(count = DEFAULT_SETTINGS.len(), "Default settings seeded");
        Ok(())
    }
}
