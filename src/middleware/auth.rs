//! Authentication middleware
//!
//! Session-based authentication for API routes

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use serde_json::json;
use std::ops::Deref;
use std::sync::Arc;
use tower_sessions::Session;

use crate::entity::profile::{self, Role};
use crate::state::AppState;

/// Session key for storing username
pub const SESSION_USER_KEY: &str = "user";
pub const SESSION_TIMESTAMP_KEY: &str = "timestamp";

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub Arc<DatabaseConnection>);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub use crate::permission::perm;

/// Signed-in staff member, stored in request extensions
#[derive(Clone, Debug, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl CurrentUser {
    pub fn has_permission(&self, perm: &str) -> bool {
        self.permissions.iter().any(|p| p == perm)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Paths that don't require authentication
fn is_public_path(path: &str) -> bool {
    // Everything outside /api is the static frontend
    if !path.starts_with("/api") {
        return true;
    }

    if path == "/api/login" || path == "/api/health" {
        return true;
    }
    // Customer-facing: order tracking and address lookup at checkout
    if path == "/api/track/ws" || path.starts_with("/api/postal/") {
        return true;
    }
    false
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // All handlers reach the pool via Extension<DbConn>
    request.extensions_mut().insert(DbConn(state.db.clone()));

    if is_public_path(&path) {
        return next.run(request).await;
    }

    let username: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);
    let Some(username) = username else {
        return reject(StatusCode::UNAUTHORIZED, "unauthorized");
    };

    let found = profile::Entity::find()
        .filter(profile::Column::Username.eq(&username))
        .one(&*state.db)
        .await;

    let account = match found {
        Ok(Some(account)) if account.active => account,
        Ok(Some(_)) => {
            tracing::warn!("Disabled user still holds a session: {}", username);
            return reject(StatusCode::UNAUTHORIZED, "user is disabled");
        }
        Ok(None) => {
            tracing::warn!("User not found in database: {}", username);
            return reject(StatusCode::UNAUTHORIZED, "invalid_session");
        }
        Err(e) => {
            tracing::error!("Database error during auth: {}", e);
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    let Some(role) = Role::parse(&account.role) else {
        tracing::error!("User {} has unknown role {:?}", account.username, account.role);
        return reject(StatusCode::FORBIDDEN, "forbidden");
    };

    let permissions = state.perm.get_user_permissions(&account.username).await;

    request.extensions_mut().insert(CurrentUser {
        id: account.id,
        username: account.username,
        full_name: account.full_name,
        role,
        permissions,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/"));
        assert!(is_public_path("/assets/app.js"));
        assert!(is_public_path("/api/login"));
        assert!(is_public_path("/api/health"));
        assert!(is_public_path("/api/track/ws"));
        assert!(is_public_path("/api/postal/01001000"));

        assert!(!is_public_path("/api/logout"));
        assert!(!is_public_path("/api/orders"));
        assert!(!is_public_path("/api/search/ws"));
        assert!(!is_public_path("/api/postal"));
    }

    #[test]
    fn test_permission_check() {
        let user = CurrentUser {
            id: 1,
            username: "ana".to_string(),
            full_name: "Ana".to_string(),
            role: Role::Waiter,
            permissions: vec![perm::ORDERS.to_string()],
        };
        assert!(user.has_permission(perm::ORDERS));
        assert!(!user.has_permission(perm::USERS));
        assert!(!user.is_admin());
    }
}
