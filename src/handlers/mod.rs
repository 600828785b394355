//! Request handlers module

pub mod auth;
pub mod coupons;
pub mod customers;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod postal;
pub mod search;
pub mod settings;
pub mod suppliers;
pub mod tables;
pub mod theme;
pub mod users;

use axum::Json;
use serde::Serialize;
use std::fmt::Display;

use crate::middleware::auth::CurrentUser;
use crate::routes::ApiResponse;

pub(crate) const MSG_FORBIDDEN: &str = "Permission denied";

/// Reject the request unless `user` holds `perm`
pub(crate) fn require<T: Serialize>(
    user: &CurrentUser,
    perm: &str,
) -> Result<(), Json<ApiResponse<T>>> {
    if user.has_permission(perm) {
        Ok(())
    } else {
        tracing::warn!("{} lacks permission {}", user.username, perm);
        Err(Json(ApiResponse::error(403, MSG_FORBIDDEN)))
    }
}

/// Log a backend failure and answer with the user-facing `message`
pub(crate) fn failed<T: Serialize>(message: &str, err: impl Display) -> Json<ApiResponse<T>> {
    tracing::error!("{}: {}", message, err);
    Json(ApiResponse::error(500, message))
}

/// Trimmed, non-empty optional text
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
