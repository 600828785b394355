//! Customer handlers

use axum::{extract::Path, Extension, Json};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;

use super::{clean, failed, require};
use crate::entity::customer;
use crate::external::PostalClient;
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct CustomerForm {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
    pub address: Option<String>,
}

impl CustomerForm {
    /// Validated postal code in its 8-digit form
    fn postal_code(&self) -> Result<Option<String>, &'static str> {
        match clean(self.postal_code.clone()) {
            None => Ok(None),
            Some(code) => PostalClient::normalize(&code)
                .map(Some)
                .ok_or("Postal code must have 8 digits"),
        }
    }
}

/// GET /api/customers
pub async fn list_customers(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<Vec<customer::Model>>> {
    if let Err(denied) = require(&user, perm::CUSTOMERS) {
        return denied;
    }

    match customer::Entity::find()
        .order_by_asc(customer::Column::Name)
        .all(&*db)
        .await
    {
        Ok(rows) => Json(ApiResponse::success(rows)),
        Err(e) => failed("Failed to load customers", e),
    }
}

/// POST /api/customers
pub async fn create_customer(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<CustomerForm>,
) -> Json<ApiResponse<customer::Model>> {
    if let Err(denied) = require(&user, perm::CUSTOMERS) {
        return denied;
    }
    if form.name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Name is required"));
    }
    let postal_code = match form.postal_code() {
        Ok(code) => code,
        Err(msg) => return Json(ApiResponse::error(400, msg)),
    };

    let row = customer::ActiveModel {
        name: Set(form.name.trim().to_string()),
        phone: Set(clean(form.phone)),
        email: Set(clean(form.email)),
        postal_code: Set(postal_code),
        address: Set(clean(form.address)),
        created_at: Set(chrono::Utc::now().timestamp()),
        ..Default::default()
    };
    match row.insert(&*db).await {
        Ok(created) => Json(ApiResponse::success(created)),
        Err(e) => failed("Failed to create customer", e),
    }
}

/// PUT /api/customers/:id
pub async fn update_customer(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<CustomerForm>,
) -> Json<ApiResponse<customer::Model>> {
    if let Err(denied) = require(&user, perm::CUSTOMERS) {
        return denied;
    }
    if form.name.trim().is_empty() {
        return Json(ApiResponse::error(400, "Name is required"));
    }
    let postal_code = match form.postal_code() {
        Ok(code) => code,
        Err(msg) => return Json(ApiResponse::error(400, msg)),
    };

    let current = match customer::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(row)) => row,
        Ok(None) => return Json(ApiResponse::error(404, "Customer not found")),
        Err(e) => return failed("Failed to update customer", e),
    };

    let mut row: customer::ActiveModel = current.into();
    row.name = Set(form.name.trim().to_string());
    row.phone = Set(clean(form.phone));
    row.email = Set(clean(form.email));
    row.postal_code = Set(postal_code);
    row.address = Set(clean(form.address));
    match row.update(&*db).await {
        Ok(updated) => Json(ApiResponse::success(updated)),
        Err(e) => failed("Failed to update customer", e),
    }
}

/// DELETE /api/customers/:id
pub async fn delete_customer(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::CUSTOMERS) {
        return denied;
    }

    match customer::Entity::delete_by_id(id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => Json(ApiResponse::error(404, "Customer not found")),
        Ok(_) => Json(ApiResponse::success_msg("Customer deleted")),
        Err(e) => failed("Failed to delete customer", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(postal_code: Option<&str>) -> CustomerForm {
        CustomerForm {
            name: "Ana".to_string(),
            phone: None,
            email: None,
            postal_code: postal_code.map(str::to_string),
            address: None,
        }
    }

    #[test]
    fn test_postal_code_normalized() {
        assert_eq!(form(None).postal_code(), Ok(None));
        assert_eq!(form(Some("  ")).postal_code(), Ok(None));
        assert_eq!(
            form(Some("01001-000")).postal_code(),
            Ok(Some("01001000".to_string()))
        );
        assert!(form(Some("0100")).postal_code().is_err());
    }
}
