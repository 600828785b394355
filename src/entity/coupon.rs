//! Coupon entity - discount codes
//!
//! Table: pos_coupon

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_coupon")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Redemption code (unique)
    #[sea_orm(column_type = "String(Some(32))", unique)]
    pub code: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Discount in whole percent, 1..=100
    pub discount_percent: i32,

    pub active: bool,

    /// Unix timestamp after which the coupon is void
    pub expires_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
