//! # Application State
//!
//! Shared state handed to every handler, and the request-scoped database.
//!
//! ## Database Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request ──► db_url cookie? ──no──────────────────► DATABASE_URL        │
//! │                   │                                      │              │
//! │                  yes ──► signed in, or open mode? ──no───┘              │
//! │                                   │                      │              │
//! │                                  yes                     │              │
//! │                                   ▼                      │              │
//! │                      DbRegistry::admit (inside DATA_DIR) │              │
//! │                                   │                      │              │
//! │                                   ▼                      ▼              │
//! │                           DbRegistry::resolve(url) ◄─────┘              │
//! │                                   │                                     │
//! │        cached pool ◄──────────────┴──► connect + migrate, then cache    │
//! │                                   │    (oldest branch pool evicted      │
//! │                                   │     past DB_MAX_POOLS)              │
//! │                                   ▼                                     │
//! │                         ActiveDb(Database) → handler                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use umkm_db::{database_file, normalize_url, Database, DbConfig, DbResult, InitReport};

use crate::ai_client::AiClient;
use crate::auth::{read_cookie, request_claims, JwtManager, DB_COOKIE};
use crate::config::ApiConfig;
use crate::error::ApiError;

// =============================================================================
// AppState
// =============================================================================

/// Shared application state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub databases: Arc<DbRegistry>,
    pub jwt: Arc<JwtManager>,
    pub ai: AiClient,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let databases = DbRegistry::new(config.database_url.clone(), config.db_max_connections)
            .data_dir(config.data_dir.clone())
            .max_pools(config.db_max_pools);
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        let ai = AiClient::new(&config)?;

        Ok(AppState {
            config: Arc::new(config),
            databases: Arc::new(databases),
            jwt: Arc::new(jwt),
            ai,
        })
    }

    /// The database URL this request selects.
    ///
    /// With permissions enforced, the `db_url` cookie only counts for a
    /// signed-in caller; anyone else gets the default database.
    pub fn active_url(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        let Some(url) = read_cookie(headers, DB_COOKIE) else {
            return Ok(self.databases.default_url().to_string());
        };

        if self.config.enforce_permissions && request_claims(headers, &self.jwt).is_none() {
            debug!("Ignoring db_url cookie on an unauthenticated request");
            return Ok(self.databases.default_url().to_string());
        }

        self.databases.admit(&url)
    }
}

// =============================================================================
// DbRegistry
// =============================================================================

/// Pools kept open when no bound is configured.
pub const DEFAULT_MAX_POOLS: usize = 8;

/// One pool per database URL, created on first use.
///
/// At most `max_pools` stay cached. Registering past that drops the oldest
/// pool other than the default one; handles already given out keep working
/// until they are dropped.
pub struct DbRegistry {
    default_url: String,
    data_dir: PathBuf,
    max_connections: u32,
    max_pools: usize,
    /// Registration order, oldest first
    pools: RwLock<Vec<(String, Database)>>,
}

impl DbRegistry {
    pub fn new(default_url: impl Into<String>, max_connections: u32) -> Self {
        let default_url = normalize_url(&default_url.into());
        let data_dir = database_file(&default_url)
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("data"));

        DbRegistry {
            default_url,
            data_dir,
            max_connections,
            max_pools: DEFAULT_MAX_POOLS,
            pools: RwLock::new(Vec::new()),
        }
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn max_pools(mut self, max: usize) -> Self {
        self.max_pools = max.max(1);
        self
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    /// Normalizes a client-supplied URL and checks it names a database file
    /// inside the data directory. The default URL is always admitted.
    pub fn admit(&self, raw: &str) -> Result<String, ApiError> {
        let url = normalize_url(raw);
        if url == self.default_url {
            return Ok(url);
        }

        match database_file(&url) {
            Some(path) if is_within(path, &self.data_dir) => Ok(url),
            _ => {
                warn!(url = %url, data_dir = %self.data_dir.display(), "Database URL rejected");
                Err(ApiError::Validation(
                    "Database URL must name a file inside the data directory".to_string(),
                ))
            }
        }
    }

    /// Returns the cached handle for `url`, connecting and migrating on
    /// first use.
    pub async fn resolve(&self, url: &str) -> DbResult<Database> {
        let key = normalize_url(url);

        if let Some(db) = cached(&self.pools.read().await, &key) {
            return Ok(db);
        }

        let mut pools = self.pools.write().await;
        // Another request may have connected while we waited for the lock
        if let Some(db) = cached(&pools, &key) {
            return Ok(db);
        }

        let db = Database::new(DbConfig::new(&key).max_connections(self.max_connections)).await?;
        self.register(&mut pools, key, db.clone());

        Ok(db)
    }

    /// Migrates and seeds `url`, then caches its pool.
    ///
    /// A fresh connection skips the connect-time migration so the report
    /// counts the tables this call created.
    pub async fn initialize(&self, url: &str) -> DbResult<(Database, InitReport)> {
        let key = normalize_url(url);
        let mut pools = self.pools.write().await;

        let existing = cached(&pools, &key);
        let db = match &existing {
            Some(db) => db.clone(),
            None => {
                Database::new(
                    DbConfig::new(&key)
                        .max_connections(self.max_connections)
                        .run_migrations(false),
                )
                .await?
            }
        };

        let report = db.initialize().await?;
        if existing.is_none() {
            self.register(&mut pools, key, db.clone());
        }

        Ok((db, report))
    }

    /// Connects without migrating or caching and counts the tables.
    pub async fn probe(&self, url: &str) -> DbResult<i64> {
        let db = Database::new(DbConfig::new(url).max_connections(1).run_migrations(false)).await?;
        let tables = db.table_count().await;
        db.close().await;

        debug!(url = %normalize_url(url), "Database probed");
        tables
    }

    pub async fn close_all(&self) {
        let mut pools = self.pools.write().await;
        for (_, db) in pools.drain(..) {
            db.close().await;
        }
    }

    fn register(&self, pools: &mut Vec<(String, Database)>, key: String, db: Database) {
        if pools.len() >= self.max_pools {
            if let Some(oldest) = pools.iter().position(|(url, _)| *url != self.default_url) {
                let (evicted, _) = pools.remove(oldest);
                info!(url = %evicted, "Database pool evicted");
            }
        }

        info!(url = %key, cached = pools.len() + 1, "Database registered");
        pools.push((key, db));
    }
}

fn cached(pools: &[(String, Database)], key: &str) -> Option<Database> {
    pools
        .iter()
        .find(|(url, _)| url == key)
        .map(|(_, db)| db.clone())
}

/// Lexical containment: `..` anywhere is refused, `.` is ignored. An empty
/// directory admits relative paths only.
fn is_within(path: &Path, dir: &Path) -> bool {
    fn lexical(path: &Path) -> Option<PathBuf> {
        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => return None,
                other => out.push(other),
            }
        }
        Some(out)
    }

    match (lexical(path), lexical(dir)) {
        (Some(path), Some(dir)) if dir.as_os_str().is_empty() => path.is_relative(),
        (Some(path), Some(dir)) => path != dir && path.starts_with(&dir),
        _ => false,
    }
}

// =============================================================================
// ActiveDb
// =============================================================================

/// The database this request works against: the `db_url` cookie, or the
/// configured default.
pub struct ActiveDb(pub Database);

impl Deref for ActiveDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.0
    }
}

impl FromRequestParts<AppState> for ActiveDb {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let url = state.active_url(&parts.headers)?;

        let db = state.databases.resolve(&url).await?;
        Ok(ActiveDb(db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_caches_per_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("shop.db").display());
        let registry = DbRegistry::new(url.clone(), 2);

        let first = registry.resolve(&url).await.unwrap();
        first.initialize().await.unwrap();

        // Same pool: the row written through one handle is visible in the other
        let second = registry.resolve(&url).await.unwrap();
        assert_eq!(registry.pools.read().await.len(), 1);
        assert!(second.settings().get("currency").await.unwrap().is_some());

        let other = format!("sqlite://{}", dir.path().join("branch.db").display());
        registry.resolve(&other).await.unwrap();
        assert_eq!(registry.pools.read().await.len(), 2);

        registry.close_all().await;
        assert!(registry.pools.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_registry_evicts_oldest_branch_pool() {
        let dir = tempfile::tempdir().unwrap();
        let url_for = |name: &str| format!("sqlite://{}", dir.path().join(name).display());
        let default = url_for("main.db");
        let registry = DbRegistry::new(default.clone(), 1).max_pools(3);

        registry.resolve(&default).await.unwrap();
        for branch in ["a.db", "b.db", "c.db", "d.db"] {
            registry.resolve(&url_for(branch)).await.unwrap();
        }

        let urls: Vec<String> = registry
            .pools
            .read()
            .await
            .iter()
            .map(|(url, _)| url.clone())
            .collect();
        assert_eq!(urls, vec![default, url_for("c.db"), url_for("d.db")]);
    }

    #[test]
    fn test_admit_keeps_databases_inside_data_dir() {
        let registry = DbRegistry::new("sqlite:///srv/toko/main.db", 1);

        assert_eq!(
            registry.admit("/srv/toko/main.db").unwrap(),
            "sqlite:///srv/toko/main.db"
        );
        assert_eq!(
            registry.admit("/srv/toko/cabang.db").unwrap(),
            "sqlite:///srv/toko/cabang.db"
        );
        assert!(registry.admit("sqlite:///srv/toko/./arsip/2024.db").is_ok());

        for outside in [
            "/etc/passwd",
            "/srv/toko/../secret.db",
            "/srv/tokobaru/x.db",
            "/srv/toko",
            "relative.db",
            ":memory:",
            "sqlite::memory:",
        ] {
            let err = registry.admit(outside).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{outside} admitted");
        }
    }

    #[test]
    fn test_admit_with_relative_data_dir() {
        let registry = DbRegistry::new("sqlite://umkm.db", 1).data_dir("");

        assert!(registry.admit("cabang.db").is_ok());
        assert!(registry.admit("./data/cabang.db").is_ok());
        assert!(registry.admit("../cabang.db").is_err());
        assert!(registry.admit("/tmp/cabang.db").is_err());
    }

    #[tokio::test]
    async fn test_initialize_reports_created_tables_once() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("fresh.db").display());
        let registry = DbRegistry::new("sqlite::memory:", 1);

        let (_, first) = registry.initialize(&url).await.unwrap();
        assert!(first.tables_created > 0);
        assert_eq!(first.tables_created, first.total_tables);

        let (db, second) = registry.initialize(&url).await.unwrap();
        assert_eq!(second.tables_created, 0);
        assert_eq!(second.total_tables, first.total_tables);
        assert_eq!(db.settings().get("business_name").await.unwrap().as_deref(), Some("Toko UMKM"));
    }

    #[tokio::test]
    async fn test_probe_does_not_cache() {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("probe.db").display().to_string();
        let registry = DbRegistry::new("sqlite::memory:", 1);

        assert_eq!(registry.probe(&url).await.unwrap(), 0);
        assert!(registry.pools.read().await.is_empty());
    }
}
