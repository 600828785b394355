//! Restaurant settings handlers

use axum::{Extension, Json};
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TryIntoModel};
use serde::Deserialize;

use super::{clean, failed, require};
use crate::entity::restaurant_settings;
use crate::middleware::auth::{perm, CurrentUser};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: String,
    #[serde(rename = "serviceFeePercent", default)]
    pub service_fee_percent: i32,
    #[serde(rename = "receiptFooter")]
    pub receipt_footer: Option<String>,
}

impl SettingsForm {
    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Restaurant name is required");
        }
        let currency = self.currency.trim();
        if currency.is_empty() || currency.len() > 8 {
            return Err("Currency must have 1 to 8 characters");
        }
        if !(0..=100).contains(&self.service_fee_percent) {
            return Err("Service fee must be between 0 and 100 percent");
        }
        Ok(())
    }
}

/// GET /api/settings
pub async fn get_settings(
    Extension(db): Extension<DbConn>,
) -> Json<ApiResponse<Option<restaurant_settings::Model>>> {
    match restaurant_settings::Entity::find().one(&*db).await {
        Ok(row) => Json(ApiResponse::success(row)),
        Err(e) => failed("Failed to load settings", e),
    }
}

/// PUT /api/settings
///
/// There is a single settings row; it is created on first save.
pub async fn update_settings(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<SettingsForm>,
) -> Json<ApiResponse<restaurant_settings::Model>> {
    if let Err(denied) = require(&user, perm::SETTINGS) {
        return denied;
    }
    if let Err(msg) = form.validate() {
        return Json(ApiResponse::error(400, msg));
    }

    let current = match restaurant_settings::Entity::find().one(&*db).await {
        Ok(row) => row,
        Err(e) => return failed("Failed to save settings", e),
    };

    let mut row: restaurant_settings::ActiveModel = match current {
        Some(existing) => existing.into(),
        None => <restaurant_settings::ActiveModel as sea_orm::ActiveModelTrait>::default(),
    };
    row.name = Set(form.name.trim().to_string());
    row.address = Set(clean(form.address));
    row.phone = Set(clean(form.phone));
    row.email = Set(clean(form.email));
    row.currency = Set(form.currency.trim().to_uppercase());
    row.service_fee_percent = Set(form.service_fee_percent);
    row.receipt_footer = Set(clean(form.receipt_footer));

    match row.save(&*db).await.and_then(|saved| saved.try_into_model()) {
        Ok(saved) => {
            tracing::info!("{} updated restaurant settings", user.username);
            Json(ApiResponse::success(saved))
        }
        Err(e) => failed("Failed to save settings", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_validation() {
        let form: SettingsForm =
            serde_json::from_str(r#"{"name":"Cantina","currency":"brl"}"#).unwrap();
        assert!(form.validate().is_ok());

        let bad_fee = SettingsForm {
            service_fee_percent: 101,
            ..form
        };
        assert!(bad_fee.validate().is_err());
    }
}
