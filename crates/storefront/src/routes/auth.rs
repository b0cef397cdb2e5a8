//! Authentication route handlers: register, login, logout.
//!
//! Login cycles the session id and folds the anonymous session's cart into
//! the user's cart before the user lands in their account.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, SessionKey, session_keys};
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub fullname: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account, returned after register/login.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub id: i64,
    pub email: String,
    pub fullname: String,
}

/// POST `/auth/register` - create an account.
///
/// Accounts start unverified; verification delivery is an external
/// collaborator.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AccountResponse>> {
    let user = AuthService::new(state.pool())
        .register_with_password(&body.email, &body.password, &body.fullname)
        .await?;

    tracing::info!(user = %user.id, "account registered");

    Ok(Json(AccountResponse {
        success: true,
        id: user.id.as_i64(),
        email: user.email.as_str().to_owned(),
        fullname: user.fullname,
    }))
}

/// POST `/auth/login` - password login.
///
/// On success the session id is cycled and any cart the visitor built
/// anonymously is merged into their user cart.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AccountResponse>> {
    let user = AuthService::new(state.pool())
        .login_with_password(&body.email, &body.password)
        .await?;

    let anonymous_key: Option<SessionKey> = session.get(session_keys::SESSION_KEY).await?;
    session.cycle_id().await?;

    if let Some(key) = anonymous_key {
        CartService::new(state.pool())
            .merge_on_login(&key, user.id)
            .await?;
        session.remove::<SessionKey>(session_keys::SESSION_KEY).await?;
    }

    set_current_user(
        &session,
        &CurrentUser {
            id: user.id,
            email: user.email.clone(),
        },
    )
    .await?;

    tracing::info!(user = %user.id, "login");

    Ok(Json(AccountResponse {
        success: true,
        id: user.id.as_i64(),
        email: user.email.as_str().to_owned(),
        fullname: user.fullname,
    }))
}

/// POST `/auth/logout` - clear the session's user.
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;

    Ok(Json(json!({ "success": true })))
}
