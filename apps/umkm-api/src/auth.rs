//! Session authentication.
//!
//! Handles JWT issuance and validation, password hashing, the `auth_token`
//! and `db_url` cookies, and the role check applied to resource routes.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
};
use chrono::{Duration, Utc};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use umkm_core::roles::{can, Action, Resource, Role};
use umkm_core::User;

use crate::error::ApiError;
use crate::AppState;

/// Session cookie holding the JWT.
pub const AUTH_COOKIE: &str = "auth_token";

/// Cookie naming the database the dashboard works against.
pub const DB_COOKIE: &str = "db_url";

/// `db_url` cookie lifetime: one year.
pub const DB_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365;

// =============================================================================
// JWT
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Issues a session token for `user`.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::Auth(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim)
}

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Cookies
// =============================================================================

/// Reads a cookie from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| Cookie::split_parse(header))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .and_then(|cookie| urlencoding::decode(cookie.value()).ok().map(|v| v.into_owned()))
        .filter(|value| !value.is_empty())
}

/// Builds a `Set-Cookie` value. `max_age` of zero expires the cookie.
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age_secs: i64,
    secure: bool,
) -> Result<HeaderValue, ApiError> {
    // Database URLs may carry characters a cookie value cannot
    let cookie = Cookie::build((name.to_string(), urlencoding::encode(value).into_owned()))
        .path("/")
        .max_age(CookieDuration::seconds(max_age_secs))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build();

    HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| ApiError::Internal(format!("Invalid cookie value: {}", e)))
}

/// `Set-Cookie` value that removes `name`.
pub fn expire_cookie(name: &str, secure: bool) -> Result<HeaderValue, ApiError> {
    set_cookie(name, "", 0, secure)
}

// =============================================================================
// Session extractor
// =============================================================================

/// The caller's session, if any, plus whether the role matrix is enforced.
///
/// Never rejects by itself: handlers call [`Session::require`] with the
/// resource and action they perform.
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: Option<Claims>,
    enforce: bool,
}

impl Session {
    /// Checks the permission matrix when enforcement is on.
    ///
    /// Missing session → 401. Role not in the matrix entry → 403.
    pub fn require(&self, resource: Resource, action: Action) -> Result<(), ApiError> {
        if !self.enforce {
            return Ok(());
        }

        let claims = self
            .claims
            .as_ref()
            .ok_or_else(|| ApiError::Auth("Authentication required".to_string()))?;

        if !can(claims.role, resource, action) {
            debug!(user_id = %claims.sub, role = %claims.role, ?resource, ?action, "Permission denied");
            return Err(ApiError::Forbidden(format!(
                "Role {} may not {:?} {:?}",
                claims.role, action, resource
            )));
        }

        Ok(())
    }
}

/// Claims from the bearer token, or else the `auth_token` cookie, when valid.
pub fn request_claims(headers: &HeaderMap, jwt: &JwtManager) -> Option<Claims> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string)
        .or_else(|| read_cookie(headers, AUTH_COOKIE))?;

    jwt.validate_token(&token).ok()
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Session {
            claims: request_claims(&parts.headers, &state.jwt),
            enforce: state.config.enforce_permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: "u-1".to_string(),
            email: "owner@toko.id".to_string(),
            password_hash: String::new(),
            name: "Owner".to_string(),
            role,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn session(role: Option<Role>, enforce: bool) -> Session {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let claims = role.map(|r| {
            let token = manager.generate_token(&user(r)).unwrap();
            manager.validate_token(&token).unwrap()
        });
        Session { claims, enforce }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_token(&user(Role::Cashier)).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email, "owner@toko.id");
        assert_eq!(claims.role, Role::Cashier);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new("secret-a".to_string(), 3600)
            .generate_token(&user(Role::Owner))
            .unwrap();

        let result = JwtManager::new("secret-b".to_string(), 3600).validate_token(&token);
        assert!(matches!(result, Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let manager = JwtManager::new("test-secret".to_string(), -120);
        let token = manager.generate_token(&user(Role::Owner)).unwrap();

        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_password_hash_verifies_only_the_same_password() {
        let hash = hash_password("rahasia123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("rahasia124", &hash));
        assert!(!verify_password("rahasia123", "not-a-phc-string"));
    }

    #[test]
    fn test_cookie_roundtrip() {
        let url = "sqlite://data/toko saya.db?mode=rwc;x";
        let set = set_cookie(DB_COOKIE, url, DB_COOKIE_MAX_AGE_SECS, true).unwrap();
        let set = set.to_str().unwrap();
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("SameSite=Strict"));
        assert!(set.contains("Secure"));
        assert!(set.contains("Max-Age=31536000"));

        // Browser sends back only `name=value`
        let pair = set.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {pair}")).unwrap(),
        );
        assert_eq!(read_cookie(&headers, DB_COOKIE).as_deref(), Some(url));
        assert_eq!(read_cookie(&headers, AUTH_COOKIE), None);
    }

    #[test]
    fn test_expire_cookie() {
        let value = expire_cookie(AUTH_COOKIE, false).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("auth_token=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_session_require() {
        // Enforcement off: everyone passes
        assert!(session(None, false)
            .require(Resource::Settings, Action::Edit)
            .is_ok());

        assert!(matches!(
            session(None, true).require(Resource::Products, Action::View),
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            session(Some(Role::Cashier), true).require(Resource::Products, Action::Delete),
            Err(ApiError::Forbidden(_))
        ));
        assert!(session(Some(Role::Cashier), true)
            .require(Resource::Transactions, Action::Create)
            .is_ok());
        assert!(session(Some(Role::Owner), true)
            .require(Resource::Users, Action::Delete)
            .is_ok());
    }
}
