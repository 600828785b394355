//! Order handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};

use super::{failed, require};
use crate::entity::order::OrderStatus;
use crate::entity::{dining_table, order, order_item, order_status_history, restaurant_settings};
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::orders::{self, NewOrder, OrderError};
use crate::receipt::render_receipt;
use crate::routes::ApiResponse;
use crate::state::AppState;

const PAGE_SIZE: u64 = 50;

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    pub history: Vec<order_status_history::Model>,
}

/// GET /api/orders?status=&page=
pub async fn list_orders(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<OrderListQuery>,
) -> Json<ApiResponse<Vec<order::Model>>> {
    if let Err(denied) = require(&user, perm::ORDERS) {
        return denied;
    }

    let mut select = order::Entity::find().order_by_desc(order::Column::OrderNumber);
    if let Some(status) = query.status.as_deref() {
        if OrderStatus::parse(status).is_none() {
            return Json(ApiResponse::error(400, format!("Unknown order status: {}", status)));
        }
        select = select.filter(order::Column::Status.eq(status));
    }

    let page = query.page.unwrap_or(0);
    match select.paginate(&*db, PAGE_SIZE).fetch_page(page).await {
        Ok(rows) => Json(ApiResponse::success(rows)),
        Err(e) => failed("Failed to load orders", e),
    }
}

/// GET /api/orders/:id
pub async fn get_order(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<OrderDetail>> {
    if let Err(denied) = require(&user, perm::ORDERS) {
        return denied;
    }

    let found = match order::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(o)) => o,
        Ok(None) => return Json(ApiResponse::error(404, "Order not found")),
        Err(e) => return failed("Failed to load order", e),
    };

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(id))
        .order_by_asc(order_item::Column::Id)
        .all(&*db)
        .await;
    let history = order_status_history::Entity::find()
        .filter(order_status_history::Column::OrderId.eq(id))
        .order_by_asc(order_status_history::Column::CreatedAt)
        .all(&*db)
        .await;

    match (items, history) {
        (Ok(items), Ok(history)) => Json(ApiResponse::success(OrderDetail {
            order: found,
            items,
            history,
        })),
        (Err(e), _) | (_, Err(e)) => failed("Failed to load order", e),
    }
}

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(new): Json<NewOrder>,
) -> Json<ApiResponse<OrderDetail>> {
    if let Err(denied) = require(&user, perm::ORDERS) {
        return denied;
    }

    match orders::create_order(&*state.db, &state.feed, new, Some(user.id)).await {
        Ok((order, items)) => Json(ApiResponse::success(OrderDetail {
            order,
            items,
            history: Vec::new(),
        })),
        Err(OrderError::Database(e)) => failed("Failed to create order", e),
        Err(e) => Json(ApiResponse::error(400, e.to_string())),
    }
}

/// POST /api/orders/:id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<StatusUpdate>,
) -> Json<ApiResponse<order::Model>> {
    if let Err(denied) = require(&user, perm::ORDERS) {
        return denied;
    }

    let updated =
        match orders::update_status(&*state.db, &state.feed, id, req.status, Some(user.id)).await {
            Ok(updated) => updated,
            Err(OrderError::NotFound) => return Json(ApiResponse::error(404, "Order not found")),
            Err(e) => return failed("Failed to update order status", e),
        };

    tracing::info!(
        "{} moved order #{} to {}",
        user.username,
        updated.order_number,
        req.status.as_str()
    );
    Json(ApiResponse::success(updated))
}

/// DELETE /api/orders/:id
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::ORDERS) {
        return denied;
    }
    if !user.is_admin() {
        return Json(ApiResponse::error(403, "Only administrators can delete orders"));
    }

    let found = match order::Entity::find_by_id(id).one(&*state.db).await {
        Ok(Some(o)) => o,
        Ok(None) => return Json(ApiResponse::error(404, "Order not found")),
        Err(e) => return failed("Failed to delete order", e),
    };

    let result = async {
        let txn = state.db.begin().await?;
        order_item::Entity::delete_many()
            .filter(order_item::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        order_status_history::Entity::delete_many()
            .filter(order_status_history::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        order::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok::<(), sea_orm::DbErr>(())
    }
    .await;

    match result {
        Ok(()) => {
            state.feed.publish_delete(order::TABLE_NAME, &found);
            tracing::info!("{} deleted order #{}", user.username, found.order_number);
            Json(ApiResponse::success_msg("Order deleted"))
        }
        Err(e) => failed("Failed to delete order", e),
    }
}

/// GET /api/orders/:id/receipt
pub async fn order_receipt(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if !user.has_permission(perm::ORDERS) {
        return Err(AppError::Forbidden);
    }
    let found = order::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found("Order not found")?;
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(id))
        .order_by_asc(order_item::Column::Id)
        .all(&*db)
        .await?;
    let settings = restaurant_settings::Entity::find()
        .one(&*db)
        .await?
        .ok_or_not_found("Restaurant settings missing; run the seed command")?;
    let table = match found.table_id {
        Some(table_id) => dining_table::Entity::find_by_id(table_id).one(&*db).await?,
        None => None,
    };

    let text = render_receipt(&settings, &found, &items, table.as_ref());
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
        .into_response())
}
