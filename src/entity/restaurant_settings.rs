//! RestaurantSettings entity - single row of restaurant-wide settings
//!
//! Table: pos_restaurant_settings

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_restaurant_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    #[sea_orm(column_type = "String(Some(32))", nullable)]
    pub phone: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub email: Option<String>,

    /// ISO 4217 currency code used on receipts
    #[sea_orm(column_type = "String(Some(8))")]
    pub currency: String,

    /// Service charge in whole percent added on receipts
    pub service_fee_percent: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub receipt_footer: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
