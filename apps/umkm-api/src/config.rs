//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use umkm_core::ai::AiProvider;
use umkm_db::{database_file, normalize_url};

/// Default signing key. Deployments override it with `JWT_SECRET`.
const DEV_JWT_SECRET: &str = "umkm-erp-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Database used when a request carries no `db_url` cookie
    pub database_url: String,

    /// Connections per database pool
    pub db_max_connections: u32,

    /// Directory every cookie- or body-supplied database must live in
    pub data_dir: PathBuf,

    /// Database pools kept open at once
    pub db_max_pools: usize,

    /// JWT secret key for signing session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds (also the cookie max-age)
    pub jwt_lifetime_secs: i64,

    /// Adds `Secure` to the cookies we set
    pub cookie_secure: bool,

    /// Require a session and the role matrix on resource routes
    pub enforce_permissions: bool,

    /// Outbound AI request timeout in seconds
    pub ai_timeout_secs: u64,

    /// Per-provider base URL overrides (`AI_BASE_URL_<PROVIDER>`)
    pub ai_base_urls: HashMap<AiProvider, String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        let mut ai_base_urls = HashMap::new();
        for provider in AiProvider::ALL {
            let key = format!("AI_BASE_URL_{}", provider.as_str().to_uppercase());
            if let Some(url) = lookup(&key).filter(|u| !u.trim().is_empty()) {
                ai_base_urls.insert(provider, url.trim().to_string());
            }
        }

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://data/umkm.db".to_string());
        let data_dir = lookup("DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(|d| PathBuf::from(d.trim()))
            .unwrap_or_else(|| default_data_dir(&database_url));

        let config = ApiConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: parse_var(&lookup, "PORT", 3000)?,

            database_url,

            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 5)?,

            data_dir,

            db_max_pools: parse_var(&lookup, "DB_MAX_POOLS", 8)?,

            jwt_secret,

            jwt_lifetime_secs: parse_var(&lookup, "JWT_LIFETIME_SECS", 604_800)?, // 7 days

            cookie_secure: parse_flag(&lookup, "COOKIE_SECURE", false)?,

            enforce_permissions: parse_flag(&lookup, "ENFORCE_PERMISSIONS", false)?,

            ai_timeout_secs: parse_var(&lookup, "AI_TIMEOUT_SECS", 60)?,

            ai_base_urls,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.db_max_pools == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_POOLS".to_string()));
        }

        Ok(config)
    }

    /// Address handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL for `provider`, honouring overrides.
    pub fn ai_base_url(&self, provider: AiProvider) -> &str {
        self.ai_base_urls
            .get(&provider)
            .map(String::as_str)
            .unwrap_or(provider.base_url())
    }
}

/// The directory holding the default database file, or `data`.
fn default_data_dir(database_url: &str) -> PathBuf {
    let url = normalize_url(database_url);
    database_file(&url)
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(_) => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
