//! Staff account handlers
//!
//! Accounts carry one role; extra permissions are granted per user. Every
//! change reloads the permission enforcer.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use super::{clean, failed, require};
use crate::catalog::is_unique_violation;
use crate::entity::profile::{self, Role};
use crate::entity::user_permission;
use crate::middleware::auth::{perm, CurrentUser};
use crate::routes::ApiResponse;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub active: bool,
    /// New password; unchanged when absent
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub profile: profile::Model,
    /// Effective permissions (role defaults plus grants)
    pub permissions: Vec<String>,
}

fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

async fn reload(state: &AppState) {
    if let Err(e) = state.perm.load_policies().await {
        tracing::error!("Failed to reload permissions: {}", e);
    }
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<Vec<UserResponse>>> {
    if let Err(denied) = require(&user, perm::USERS) {
        return denied;
    }

    let rows = match profile::Entity::find()
        .order_by_asc(profile::Column::Username)
        .all(&*state.db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => return failed("Failed to load users", e),
    };

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        let permissions = state.perm.get_user_permissions(&row.username).await;
        users.push(UserResponse {
            profile: row,
            permissions,
        });
    }
    Json(ApiResponse::success(users))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> Json<ApiResponse<profile::Model>> {
    if let Err(denied) = require(&user, perm::USERS) {
        return denied;
    }

    let username = req.username.trim();
    if username.is_empty() || req.full_name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Username and full name are required"));
    }
    if let Err(msg) = check_password(&req.password) {
        return Json(ApiResponse::error(400, msg));
    }

    let hash = match bcrypt::hash(&req.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => return failed("Failed to create user", e),
    };

    let now = chrono::Utc::now().timestamp();
    let row = profile::ActiveModel {
        username: Set(username.to_string()),
        password: Set(hash),
        full_name: Set(req.full_name.trim().to_string()),
        email: Set(clean(req.email)),
        role: Set(req.role.as_str().to_string()),
        active: Set(true),
        last_login: Set(0),
        created_at: Set(now),
        ..Default::default()
    };

    match row.insert(&*state.db).await {
        Ok(created) => {
            reload(&state).await;
            tracing::info!("{} created user {} ({})", user.username, created.username, created.role);
            Json(ApiResponse::success(created))
        }
        Err(e) if is_unique_violation(&e) => {
            Json(ApiResponse::error(400, "Username already exists"))
        }
        Err(e) => failed("Failed to create user", e),
    }
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Json<ApiResponse<profile::Model>> {
    if let Err(denied) = require(&user, perm::USERS) {
        return denied;
    }
    if req.full_name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Full name is required"));
    }
    if id == user.id && (!req.active || req.role != user.role) {
        return Json(ApiResponse::error(400, "You cannot disable or demote yourself"));
    }

    let current = match profile::Entity::find_by_id(id).one(&*state.db).await {
        Ok(Some(row)) => row,
        Ok(None) => return Json(ApiResponse::error(404, "User not found")),
        Err(e) => return failed("Failed to update user", e),
    };

    let mut row: profile::ActiveModel = current.into();
    row.full_name = Set(req.full_name.trim().to_string());
    row.email = Set(clean(req.email));
    row.role = Set(req.role.as_str().to_string());
    row.active = Set(req.active);
    if let Some(password) = req.password.filter(|p| !p.is_empty()) {
        if let Err(msg) = check_password(&password) {
            return Json(ApiResponse::error(400, msg));
        }
        match bcrypt::hash(&password, bcrypt::DEFAULT_COST) {
            Ok(hash) => row.password = Set(hash),
            Err(e) => return failed("Failed to update user", e),
        }
    }

    match row.update(&*state.db).await {
        Ok(updated) => {
            reload(&state).await;
            Json(ApiResponse::success(updated))
        }
        Err(e) => failed("Failed to update user", e),
    }
}

/// GET /api/users/:id/permissions
///
/// The user's extra grants only, without role defaults.
pub async fn get_user_grants(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<Vec<String>>> {
    if let Err(denied) = require(&user, perm::USERS) {
        return denied;
    }

    match user_permission::Entity::find()
        .filter(user_permission::Column::UserId.eq(id))
        .all(&*state.db)
        .await
    {
        Ok(rows) => Json(ApiResponse::success(
            rows.into_iter().map(|r| r.permission).collect(),
        )),
        Err(e) => failed("Failed to load permissions", e),
    }
}

/// PUT /api/users/:id/permissions
pub async fn set_user_grants(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<PermissionsRequest>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::USERS) {
        return denied;
    }
    if let Some(unknown) = req.permissions.iter().find(|p| !perm::is_known(p)) {
        return Json(ApiResponse::error(400, format!("Unknown permission: {}", unknown)));
    }

    match state.perm.set_user_permissions(id, &req.permissions).await {
        Ok(()) => {
            tracing::info!("{} set permissions of user {}: {:?}", user.username, id, req.permissions);
            Json(ApiResponse::success_msg("Permissions updated"))
        }
        Err(e) => failed("Failed to update permissions", e),
    }
}

/// GET /api/roles
pub async fn list_roles(
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<Vec<serde_json::Value>>> {
    if let Err(denied) = require(&user, perm::USERS) {
        return denied;
    }

    let roles = Role::ALL
        .iter()
        .map(|role| {
            serde_json::json!({
                "name": role.as_str(),
                "permissions": crate::permission::role_permissions(*role),
            })
        })
        .collect();
    Json(ApiResponse::success(roles))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rule() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }

    #[test]
    fn test_user_response_hides_password() {
        let response = UserResponse {
            profile: profile::Model {
                id: 1,
                username: "admin".to_string(),
                password: "$2b$12$secret".to_string(),
                full_name: "Administrator".to_string(),
                email: None,
                role: "admin".to_string(),
                active: true,
                last_login: 0,
                created_at: 0,
            },
            permissions: vec!["orders".to_string()],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["username"], "admin");
        assert!(value.get("password").is_none());
        assert_eq!(value["permissions"][0], "orders");
    }

    #[test]
    fn test_create_request_role() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"username":"bia","password":"secret1","fullName":"Bia","role":"kitchen"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Role::Kitchen);
        assert!(serde_json::from_str::<CreateUserRequest>(
            r#"{"username":"x","password":"secret1","fullName":"X","role":"chef"}"#
        )
        .is_err());
    }
}
