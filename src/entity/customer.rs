//! Customer entity
//!
//! Table: pos_customer

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_customer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    #[sea_orm(column_type = "String(Some(32))", nullable)]
    pub phone: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub email: Option<String>,

    #[sea_orm(column_type = "String(Some(16))", nullable)]
    pub postal_code: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
