//! OrderItem entity - lines of an order
//!
//! Table: pos_order_item

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_order_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub order_id: i64,

    pub menu_item_id: i64,

    /// Menu item name at the time of ordering
    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// Unit price in cents at the time of ordering
    pub unit_price_cents: i64,

    pub quantity: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}
