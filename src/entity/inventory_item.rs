//! InventoryItem entity - stock of ingredients and supplies
//!
//! Table: pos_inventory_item

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_inventory_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// Unit of measure (kg, l, un, ...)
    #[sea_orm(column_type = "String(Some(16))")]
    pub unit: String,

    pub quantity: i32,

    /// Restock threshold
    pub min_quantity: i32,

    pub supplier_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
