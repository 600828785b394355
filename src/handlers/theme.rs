//! Display theme handlers

use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::{Deserialize, Serialize};

use super::failed;
use crate::middleware::auth::CurrentUser;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::theme::{ColorScheme, Theme};

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    /// Stored preference
    pub theme: Theme,
    /// Scheme to render with right now
    pub resolved: ColorScheme,
}

fn respond(theme: Theme, headers: &HeaderMap) -> ThemeResponse {
    let hint = headers
        .get(ColorScheme::CLIENT_HINT)
        .and_then(|v| v.to_str().ok());
    ThemeResponse {
        theme,
        resolved: theme.resolve(ColorScheme::from_client_hint(hint)),
    }
}

/// GET /api/theme
pub async fn get_theme(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Json<ApiResponse<ThemeResponse>> {
    let theme = state.themes.get(user.id).await;
    Json(ApiResponse::success(respond(theme, &headers)))
}

/// POST /api/theme
pub async fn set_theme(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    Json(req): Json<ThemeRequest>,
) -> Json<ApiResponse<ThemeResponse>> {
    if let Err(e) = state.themes.set(user.id, req.theme).await {
        return failed("Failed to save theme", e);
    }
    Json(ApiResponse::success(respond(req.theme, &headers)))
}
