//! Login, registration and logout on one endpoint, switched on `action`.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use umkm_core::validation::{validate_email, validate_name, validate_password};
use umkm_core::Role;
use umkm_db::NewUser;

use crate::auth::{expire_cookie, hash_password, set_cookie, verify_password, Session, AUTH_COOKIE};
use crate::error::{ApiError, ApiResult};
use crate::response::{ApiJson, ApiResponse};
use crate::state::{ActiveDb, AppState};

/// Same wording for an unknown email and a wrong password.
const BAD_CREDENTIALS: &str = "Invalid email or password";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth", get(auth_status).post(auth_action))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Login,
    Register,
    Logout,
}

#[derive(Debug, Deserialize)]
pub struct AuthBody {
    pub action: Option<AuthAction>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// The session as `GET /api/auth` reports it.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

async fn auth_action(
    State(state): State<AppState>,
    db: ActiveDb,
    ApiJson(body): ApiJson<AuthBody>,
) -> ApiResult<Response> {
    let action = body
        .action
        .ok_or_else(|| ApiError::Validation("action is required".to_string()))?;

    match action {
        AuthAction::Login => login(&state, &db, body).await,
        AuthAction::Register => register(&db, body).await,
        AuthAction::Logout => {
            let cookie = expire_cookie(AUTH_COOKIE, state.config.cookie_secure)?;
            Ok(([(SET_COOKIE, cookie)], ApiResponse::message("Logged out")).into_response())
        }
    }
}

async fn login(state: &AppState, db: &ActiveDb, body: AuthBody) -> ApiResult<Response> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let user = db
        .users()
        .find_by_email(&email.trim().to_lowercase())
        .await?
        .filter(|user| verify_password(&password, &user.password_hash))
        .ok_or_else(|| {
            warn!(email = %email.trim(), "Login rejected");
            ApiError::Auth(BAD_CREDENTIALS.to_string())
        })?;

    let token = state.jwt.generate_token(&user)?;
    let cookie = set_cookie(
        AUTH_COOKIE,
        &token,
        state.jwt.lifetime_secs(),
        state.config.cookie_secure,
    )?;
    info!(user_id = %user.id, role = %user.role, "User logged in");

    let body = ApiResponse::ok(user)
        .with_message("Logged in")
        .with_field("token", token);
    Ok(([(SET_COOKIE, cookie)], body).into_response())
}

async fn register(db: &ActiveDb, body: AuthBody) -> ApiResult<Response> {
    let email = validate_email(body.email.as_deref().unwrap_or_default())?;
    let password = body.password.unwrap_or_default();
    validate_password(&password)?;

    let name = match body.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => validate_name("name", name)?,
        None => email.split('@').next().unwrap_or_default().to_string(),
    };
    let role = match body.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::Viewer,
    };

    if db.users().find_by_email(&email).await?.is_some() {
        return Err(ApiError::Validation("Email already registered".to_string()));
    }

    let user = db
        .users()
        .create(NewUser {
            email,
            password_hash: hash_password(&password)?,
            name,
            role,
        })
        .await?;

    Ok(ApiResponse::ok(user)
        .with_message("Registered")
        .into_response())
}

/// `GET /api/auth`: `{authenticated, user?}`. An invalid or expired token
/// reads as signed out.
async fn auth_status(session: Session) -> ApiResponse<()> {
    match session.claims {
        Some(claims) => ApiResponse::done()
            .with_field("authenticated", true)
            .with_field(
                "user",
                SessionUser {
                    id: claims.sub,
                    email: claims.email,
                    role: claims.role,
                },
            ),
        None => ApiResponse::done().with_field("authenticated", false),
    }
}
