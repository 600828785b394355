//! Authentication handlers
//!
//! Login, logout and current user endpoints

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tower_sessions::Session;

use crate::entity::profile;
use crate::middleware::auth::{CurrentUser, SESSION_TIMESTAMP_KEY, SESSION_USER_KEY};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn login_error(status: StatusCode, error: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": error })))
}

/// POST /api/login
pub async fn login(
    Extension(db): Extension<DbConn>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return login_error(StatusCode::BAD_REQUEST, "bad request");
    }

    let found = profile::Entity::find()
        .filter(profile::Column::Username.eq(username))
        .one(&*db)
        .await;

    let account = match found {
        Ok(Some(account)) => account,
        Ok(None) => {
            tracing::warn!("Login failed: user not found - {}", username);
            return login_error(StatusCode::BAD_REQUEST, "username or password error");
        }
        Err(e) => {
            tracing::error!("Database error during login: {}", e);
            return login_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    if !bcrypt::verify(&req.password, &account.password).unwrap_or(false) {
        tracing::warn!("Login failed: wrong password - {}", username);
        return login_error(StatusCode::BAD_REQUEST, "username or password error");
    }

    if !account.active {
        tracing::warn!("Login failed: user disabled - {}", username);
        return login_error(StatusCode::BAD_REQUEST, "user is disabled");
    }

    let role = account.role.clone();
    let mut active_model: profile::ActiveModel = account.into();
    active_model.last_login = Set(chrono::Utc::now().timestamp());
    if let Err(e) = active_model.update(&*db).await {
        tracing::error!("Failed to update last login: {}", e);
    }

    if let Err(e) = session.insert(SESSION_USER_KEY, username).await {
        tracing::error!("Failed to save session: {}", e);
        return login_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
    }
    if let Err(e) = session
        .insert(SESSION_TIMESTAMP_KEY, chrono::Utc::now().timestamp())
        .await
    {
        tracing::error!("Failed to save session timestamp: {}", e);
    }

    tracing::info!("User logged in: {} ({})", username, role);

    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": "login success", "role": role })),
    )
}

/// POST /api/logout
pub async fn logout(
    session: Session,
    Extension(current_user): Extension<CurrentUser>,
) -> impl IntoResponse {
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(500, "internal error")),
        );
    }

    tracing::info!("User logged out: {}", current_user.username);

    (StatusCode::OK, Json(ApiResponse::success_msg("logout success")))
}

/// GET /api/user/current
pub async fn current_user(Extension(user): Extension<CurrentUser>) -> Json<ApiResponse<CurrentUser>> {
    Json(ApiResponse::success(user))
}
