//! Supplier handlers

use axum::{extract::Path, Extension, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use super::{clean, failed, require};
use crate::entity::{inventory_item, supplier};
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct SupplierForm {
    pub name: String,
    #[serde(rename = "contactName")]
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// GET /api/suppliers
pub async fn list_suppliers(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<Vec<supplier::Model>>> {
    if let Err(denied) = require(&user, perm::SUPPLIERS) {
        return denied;
    }

    match supplier::Entity::find()
        .order_by_asc(supplier::Column::Name)
        .all(&*db)
        .await
    {
        Ok(rows) => Json(ApiResponse::success(rows)),
        Err(e) => failed("Failed to load suppliers", e),
    }
}

/// POST /api/suppliers
pub async fn create_supplier(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<SupplierForm>,
) -> Json<ApiResponse<supplier::Model>> {
    if let Err(denied) = require(&user, perm::SUPPLIERS) {
        return denied;
    }
    if form.name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Name is required"));
    }

    let row = supplier::ActiveModel {
        name: Set(form.name.trim().to_string()),
        contact_name: Set(clean(form.contact_name)),
        phone: Set(clean(form.phone)),
        email: Set(clean(form.email)),
        ..Default::default()
    };
    match row.insert(&*db).await {
        Ok(created) => Json(ApiResponse::success(created)),
        Err(e) => failed("Failed to create supplier", e),
    }
}

/// PUT /api/suppliers/:id
pub async fn update_supplier(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<SupplierForm>,
) -> Json<ApiResponse<supplier::Model>> {
    if let Err(denied) = require(&user, perm::SUPPLIERS) {
        return denied;
    }
    if form.name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Name is required"));
    }

    let current = match supplier::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(row)) => row,
        Ok(None) => return Json(ApiResponse::error(404, "Supplier not found")),
        Err(e) => return failed("Failed to update supplier", e),
    };

    let mut row: supplier::ActiveModel = current.into();
    row.name = Set(form.name.trim().to_string());
    row.contact_name = Set(clean(form.contact_name));
    row.phone = Set(clean(form.phone));
    row.email = Set(clean(form.email));
    match row.update(&*db).await {
        Ok(updated) => Json(ApiResponse::success(updated)),
        Err(e) => failed("Failed to update supplier", e),
    }
}

/// DELETE /api/suppliers/:id
///
/// Inventory items keep their rows but lose the supplier link.
pub async fn delete_supplier(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::SUPPLIERS) {
        return denied;
    }

    let unlinked = inventory_item::Entity::update_many()
        .col_expr(
            inventory_item::Column::SupplierId,
            sea_orm::sea_query::Expr::value(Option::<i64>::None),
        )
        .filter(inventory_item::Column::SupplierId.eq(id))
        .exec(&*db)
        .await;
    if let Err(e) = unlinked {
        return failed("Failed to delete supplier", e);
    }

    match supplier::Entity::delete_by_id(id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => Json(ApiResponse::error(404, "Supplier not found")),
        Ok(_) => Json(ApiResponse::success_msg("Supplier deleted")),
        Err(e) => failed("Failed to delete supplier", e),
    }
}
