//! Inventory handlers

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use super::{failed, require};
use crate::entity::inventory_item;
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct InventoryForm {
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    #[serde(rename = "minQuantity", default)]
    pub min_quantity: i32,
    #[serde(rename = "supplierId")]
    pub supplier_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryQuery {
    /// Only items at or below their minimum
    #[serde(rename = "lowStock", default)]
    pub low_stock: bool,
}

impl InventoryForm {
    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Name is required");
        }
        if self.unit.trim().is_empty() {
            return Err("Unit is required");
        }
        if self.quantity < 0 || self.min_quantity < 0 {
            return Err("Quantities cannot be negative");
        }
        Ok(())
    }
}

/// GET /api/inventory?lowStock=
pub async fn list_inventory(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<InventoryQuery>,
) -> Json<ApiResponse<Vec<inventory_item::Model>>> {
    if let Err(denied) = require(&user, perm::INVENTORY) {
        return denied;
    }

    let mut select = inventory_item::Entity::find().order_by_asc(inventory_item::Column::Name);
    if query.low_stock {
        select = select.filter(
            Expr::col(inventory_item::Column::Quantity)
                .lte(Expr::col(inventory_item::Column::MinQuantity)),
        );
    }

    match select.all(&*db).await {
        Ok(rows) => Json(ApiResponse::success(rows)),
        Err(e) => failed("Failed to load inventory", e),
    }
}

/// POST /api/inventory
pub async fn create_inventory_item(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<InventoryForm>,
) -> Json<ApiResponse<inventory_item::Model>> {
    if let Err(denied) = require(&user, perm::INVENTORY) {
        return denied;
    }
    if let Err(msg) = form.validate() {
        return Json(ApiResponse::error(400, msg));
    }

    let row = inventory_item::ActiveModel {
        name: Set(form.name.trim().to_string()),
        unit: Set(form.unit.trim().to_string()),
        quantity: Set(form.quantity),
        min_quantity: Set(form.min_quantity),
        supplier_id: Set(form.supplier_id),
        ..Default::default()
    };
    match row.insert(&*db).await {
        Ok(created) => Json(ApiResponse::success(created)),
        Err(e) => failed("Failed to create inventory item", e),
    }
}

/// PUT /api/inventory/:id
pub async fn update_inventory_item(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<InventoryForm>,
) -> Json<ApiResponse<inventory_item::Model>> {
    if let Err(denied) = require(&user, perm::INVENTORY) {
        return denied;
    }
    if let Err(msg) = form.validate() {
        return Json(ApiResponse::error(400, msg));
    }

    let current = match inventory_item::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(row)) => row,
        Ok(None) => return Json(ApiResponse::error(404, "Inventory item not found")),
        Err(e) => return failed("Failed to update inventory item", e),
    };

    let mut row: inventory_item::ActiveModel = current.into();
    row.name = Set(form.name.trim().to_string());
    row.unit = Set(form.unit.trim().to_string());
    row.quantity = Set(form.quantity);
    row.min_quantity = Set(form.min_quantity);
    row.supplier_id = Set(form.supplier_id);
    match row.update(&*db).await {
        Ok(updated) => {
            if updated.quantity <= updated.min_quantity {
                tracing::warn!("{} is low on stock ({} {})", updated.name, updated.quantity, updated.unit);
            }
            Json(ApiResponse::success(updated))
        }
        Err(e) => failed("Failed to update inventory item", e),
    }
}

/// DELETE /api/inventory/:id
pub async fn delete_inventory_item(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::INVENTORY) {
        return denied;
    }

    match inventory_item::Entity::delete_by_id(id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => {
            Json(ApiResponse::error(404, "Inventory item not found"))
        }
        Ok(_) => Json(ApiResponse::success_msg("Inventory item deleted")),
        Err(e) => failed("Failed to delete inventory item", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_validation() {
        let form: InventoryForm =
            serde_json::from_str(r#"{"name":"Flour","unit":"kg","quantity":20}"#).unwrap();
        assert_eq!(form.min_quantity, 0);
        assert!(form.validate().is_ok());

        let negative = InventoryForm {
            quantity: -2,
            ..form
        };
        assert_eq!(negative.validate(), Err("Quantities cannot be negative"));
    }
}
