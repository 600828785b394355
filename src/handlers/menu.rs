//! Menu handlers: categories and menu items

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use super::{clean, failed, require};
use crate::entity::{category, menu_item};
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "sortOrder", default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct MenuItemForm {
    #[serde(rename = "categoryId")]
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "priceCents")]
    pub price_cents: i64,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    #[serde(rename = "categoryId")]
    pub category_id: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl MenuItemForm {
    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Name is required");
        }
        if self.price_cents < 0 {
            return Err("Price cannot be negative");
        }
        Ok(())
    }
}

/// GET /api/categories
pub async fn list_categories(
    Extension(db): Extension<DbConn>,
) -> Json<ApiResponse<Vec<category::Model>>> {
    match category::Entity::find()
        .order_by_asc(category::Column::SortOrder)
        .order_by_asc(category::Column::Name)
        .all(&*db)
        .await
    {
        Ok(rows) => Json(ApiResponse::success(rows)),
        Err(e) => failed("Failed to load categories", e),
    }
}

/// POST /api/categories
pub async fn create_category(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<CategoryForm>,
) -> Json<ApiResponse<category::Model>> {
    if let Err(denied) = require(&user, perm::CATALOG) {
        return denied;
    }
    if form.name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Name is required"));
    }

    let row = category::ActiveModel {
        name: Set(form.name.trim().to_string()),
        description: Set(clean(form.description)),
        sort_order: Set(form.sort_order),
        active: Set(form.active),
        ..Default::default()
    };
    match row.insert(&*db).await {
        Ok(created) => Json(ApiResponse::success(created)),
        Err(e) => failed("Failed to create category", e),
    }
}

/// PUT /api/categories/:id
pub async fn update_category(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<CategoryForm>,
) -> Json<ApiResponse<category::Model>> {
    if let Err(denied) = require(&user, perm::CATALOG) {
        return denied;
    }
    if form.name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Name is required"));
    }

    let current = match category::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(row)) => row,
        Ok(None) => return Json(ApiResponse::error(404, "Category not found")),
        Err(e) => return failed("Failed to update category", e),
    };

    let mut row: category::ActiveModel = current.into();
    row.name = Set(form.name.trim().to_string());
    row.description = Set(clean(form.description));
    row.sort_order = Set(form.sort_order);
    row.active = Set(form.active);
    match row.update(&*db).await {
        Ok(updated) => Json(ApiResponse::success(updated)),
        Err(e) => failed("Failed to update category", e),
    }
}

/// DELETE /api/categories/:id
pub async fn delete_category(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::CATALOG) {
        return denied;
    }

    let in_use = menu_item::Entity::find()
        .filter(menu_item::Column::CategoryId.eq(id))
        .one(&*db)
        .await;
    match in_use {
        Ok(Some(_)) => return Json(ApiResponse::error(400, "Category still has menu items")),
        Err(e) => return failed("Failed to delete category", e),
        Ok(None) => {}
    }

    match category::Entity::delete_by_id(id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => Json(ApiResponse::error(404, "Category not found")),
        Ok(_) => Json(ApiResponse::success_msg("Category deleted")),
        Err(e) => failed("Failed to delete category", e),
    }
}

/// GET /api/menu-items?categoryId=
pub async fn list_menu_items(
    Extension(db): Extension<DbConn>,
    Query(query): Query<MenuQuery>,
) -> Json<ApiResponse<Vec<menu_item::Model>>> {
    let mut select = menu_item::Entity::find().order_by_asc(menu_item::Column::Name);
    if let Some(category_id) = query.category_id {
        select = select.filter(menu_item::Column::CategoryId.eq(category_id));
    }

    match select.all(&*db).await {
        Ok(rows) => Json(ApiResponse::success(rows)),
        Err(e) => failed("Failed to load menu items", e),
    }
}

/// POST /api/menu-items
pub async fn create_menu_item(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<MenuItemForm>,
) -> Json<ApiResponse<menu_item::Model>> {
    if let Err(denied) = require(&user, perm::CATALOG) {
        return denied;
    }
    if let Err(msg) = form.validate() {
        return Json(ApiResponse::error(400, msg));
    }

    let row = menu_item::ActiveModel {
        category_id: Set(form.category_id),
        name: Set(form.name.trim().to_string()),
        description: Set(clean(form.description)),
        price_cents: Set(form.price_cents),
        image_url: Set(clean(form.image_url)),
        available: Set(form.available),
        ..Default::default()
    };
    match row.insert(&*db).await {
        Ok(created) => Json(ApiResponse::success(created)),
        Err(e) => failed("Failed to create menu item", e),
    }
}

/// PUT /api/menu-items/:id
pub async fn update_menu_item(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<MenuItemForm>,
) -> Json<ApiResponse<menu_item::Model>> {
    if let Err(denied) = require(&user, perm::CATALOG) {
        return denied;
    }
    if let Err(msg) = form.validate() {
        return Json(ApiResponse::error(400, msg));
    }

    let current = match menu_item::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(row)) => row,
        Ok(None) => return Json(ApiResponse::error(404, "Menu item not found")),
        Err(e) => return failed("Failed to update menu item", e),
    };

    let mut row: menu_item::ActiveModel = current.into();
    row.category_id = Set(form.category_id);
    row.name = Set(form.name.trim().to_string());
    row.description = Set(clean(form.description));
    row.price_cents = Set(form.price_cents);
    row.image_url = Set(clean(form.image_url));
    row.available = Set(form.available);
    match row.update(&*db).await {
        Ok(updated) => Json(ApiResponse::success(updated)),
        Err(e) => failed("Failed to update menu item", e),
    }
}

/// DELETE /api/menu-items/:id
pub async fn delete_menu_item(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::CATALOG) {
        return denied;
    }

    match menu_item::Entity::delete_by_id(id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => Json(ApiResponse::error(404, "Menu item not found")),
        Ok(_) => Json(ApiResponse::success_msg("Menu item deleted")),
        Err(e) => failed("Failed to delete menu item", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_form_defaults() {
        let form: MenuItemForm =
            serde_json::from_str(r#"{"categoryId":1,"name":"Soup","priceCents":1500}"#).unwrap();
        assert!(form.available);
        assert!(form.validate().is_ok());

        let negative = MenuItemForm {
            price_cents: -1,
            ..form
        };
        assert_eq!(negative.validate(), Err("Price cannot be negative"));
    }
}
