//! DiningTable entity - restaurant tables
//!
//! Table: pos_dining_table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Table occupancy status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::Reserved => "reserved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(TableStatus::Available),
            "occupied" => Some(TableStatus::Occupied),
            "reserved" => Some(TableStatus::Reserved),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_dining_table")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Table number shown to staff (unique)
    #[sea_orm(unique)]
    pub number: i32,

    /// Seat count
    pub capacity: i32,

    /// available / occupied / reserved
    #[sea_orm(column_type = "String(Some(16))")]
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
