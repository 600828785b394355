//! MenuItem entity - sellable dishes and drinks
//!
//! Table: pos_menu_item

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_menu_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub category_id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Unit price in cents
    pub price_cents: i64,

    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,

    /// Whether the item can currently be ordered
    pub available: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
