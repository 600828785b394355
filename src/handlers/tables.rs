//! Dining table handlers

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::{EntityTrait, QueryOrder};

use super::{failed, require};
use crate::catalog::{
    self, TableError, TableForm, MSG_TABLE_CREATE_FAILED, MSG_TABLE_UPDATE_FAILED,
};
use crate::entity::dining_table;
use crate::error::{AppError, AppResult, OptionExt};
use crate::external::qr::table_menu_url;
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::state::AppState;

fn table_error<T: serde::Serialize>(err: TableError, fallback: &str) -> Json<ApiResponse<T>> {
    match &err {
        TableError::Database(e) => tracing::error!("{}: {}", fallback, e),
        other => tracing::warn!("Table rejected: {}", other),
    }
    Json(ApiResponse::error(400, err.user_message(fallback)))
}

/// GET /api/tables
pub async fn list_tables(
    Extension(db): Extension<DbConn>,
) -> Json<ApiResponse<Vec<dining_table::Model>>> {
    match dining_table::Entity::find()
        .order_by_asc(dining_table::Column::Number)
        .all(&*db)
        .await
    {
        Ok(tables) => Json(ApiResponse::success(tables)),
        Err(e) => failed("Failed to load tables", e),
    }
}

/// POST /api/tables
pub async fn create_table(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<TableForm>,
) -> Json<ApiResponse<dining_table::Model>> {
    if let Err(denied) = require(&user, perm::TABLES) {
        return denied;
    }

    match catalog::create_table(&*db, &form).await {
        Ok(table) => {
            tracing::info!("{} created table {}", user.username, table.number);
            Json(ApiResponse::success(table))
        }
        Err(e) => table_error(e, MSG_TABLE_CREATE_FAILED),
    }
}

/// PUT /api/tables/:id
pub async fn update_table(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<TableForm>,
) -> Json<ApiResponse<dining_table::Model>> {
    if let Err(denied) = require(&user, perm::TABLES) {
        return denied;
    }

    match catalog::update_table(&*db, id, &form).await {
        Ok(table) => Json(ApiResponse::success(table)),
        Err(e) => table_error(e, MSG_TABLE_UPDATE_FAILED),
    }
}

/// DELETE /api/tables/:id
pub async fn delete_table(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::TABLES) {
        return denied;
    }

    match dining_table::Entity::delete_by_id(id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => Json(ApiResponse::error(404, "Table not found")),
        Ok(_) => Json(ApiResponse::success_msg("Table deleted")),
        Err(e) => failed("Failed to delete table", e),
    }
}

/// GET /api/tables/:id/qr
///
/// PNG of the table's menu link, served as a download.
pub async fn table_qr(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if !user.has_permission(perm::TABLES) {
        return Err(AppError::Forbidden);
    }
    let table = dining_table::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_not_found("Table not found")?;

    let link = table_menu_url(&state.config.public_url, table.number);
    let png = state.qr.download(&link).await.map_err(AppError::from)?;

    let disposition = format!("attachment; filename=\"table-{}-qr.png\"", table.number);
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}
