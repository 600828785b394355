//! Coupon handlers

use axum::{extract::Path, Extension, Json};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;

use super::{clean, failed, require};
use crate::catalog::is_unique_violation;
use crate::entity::coupon;
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

const MSG_COUPON_EXISTS: &str = "Coupon code already exists";

#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
    pub description: Option<String>,
    #[serde(rename = "discountPercent")]
    pub discount_percent: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Unix seconds; absent means no expiry
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl CouponForm {
    /// Upper-cased code, or the validation message
    fn validate(&self) -> Result<String, &'static str> {
        let code = self.code.trim().to_uppercase();
        if code.is_empty() {
            return Err("Code is required");
        }
        if !(1..=100).contains(&self.discount_percent) {
            return Err("Discount must be between 1 and 100 percent");
        }
        Ok(code)
    }
}

/// GET /api/coupons
pub async fn list_coupons(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<Vec<coupon::Model>>> {
    if let Err(denied) = require(&user, perm::COUPONS) {
        return denied;
    }

    match coupon::Entity::find()
        .order_by_asc(coupon::Column::Code)
        .all(&*db)
        .await
    {
        Ok(rows) => Json(ApiResponse::success(rows)),
        Err(e) => failed("Failed to load coupons", e),
    }
}

/// POST /api/coupons
pub async fn create_coupon(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<CouponForm>,
) -> Json<ApiResponse<coupon::Model>> {
    if let Err(denied) = require(&user, perm::COUPONS) {
        return denied;
    }
    let code = match form.validate() {
        Ok(code) => code,
        Err(msg) => return Json(ApiResponse::error(400, msg)),
    };

    let row = coupon::ActiveModel {
        code: Set(code),
        description: Set(clean(form.description)),
        discount_percent: Set(form.discount_percent),
        active: Set(form.active),
        expires_at: Set(form.expires_at),
        ..Default::default()
    };
    match row.insert(&*db).await {
        Ok(created) => Json(ApiResponse::success(created)),
        Err(e) if is_unique_violation(&e) => Json(ApiResponse::error(400, MSG_COUPON_EXISTS)),
        Err(e) => failed("Failed to create coupon", e),
    }
}

/// PUT /api/coupons/:id
pub async fn update_coupon(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<CouponForm>,
) -> Json<ApiResponse<coupon::Model>> {
    if let Err(denied) = require(&user, perm::COUPONS) {
        return denied;
    }
    let code = match form.validate() {
        Ok(code) => code,
        Err(msg) => return Json(ApiResponse::error(400, msg)),
    };

    let current = match coupon::Entity::find_by_id(id).one(&*db).await {
        Ok(Some(row)) => row,
        Ok(None) => return Json(ApiResponse::error(404, "Coupon not found")),
        Err(e) => return failed("Failed to update coupon", e),
    };

    let mut row: coupon::ActiveModel = current.into();
    row.code = Set(code);
    row.description = Set(clean(form.description));
    row.discount_percent = Set(form.discount_percent);
    row.active = Set(form.active);
    row.expires_at = Set(form.expires_at);
    match row.update(&*db).await {
        Ok(updated) => Json(ApiResponse::success(updated)),
        Err(e) if is_unique_violation(&e) => Json(ApiResponse::error(400, MSG_COUPON_EXISTS)),
        Err(e) => failed("Failed to update coupon", e),
    }
}

/// DELETE /api/coupons/:id
pub async fn delete_coupon(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    if let Err(denied) = require(&user, perm::COUPONS) {
        return denied;
    }

    match coupon::Entity::delete_by_id(id).exec(&*db).await {
        Ok(res) if res.rows_affected == 0 => Json(ApiResponse::error(404, "Coupon not found")),
        Ok(_) => Json(ApiResponse::success_msg("Coupon deleted")),
        Err(e) => failed("Failed to delete coupon", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_validation() {
        let form: CouponForm =
            serde_json::from_str(r#"{"code":" welcome10 ","discountPercent":10}"#).unwrap();
        assert!(form.active);
        assert_eq!(form.validate(), Ok("WELCOME10".to_string()));

        let too_big = CouponForm {
            discount_percent: 120,
            ..form
        };
        assert!(too_big.validate().is_err());
    }
}
