//! OrderStatusHistory entity - one row per status transition
//!
//! Table: pos_order_status_history
//!
//! Inserts into this table drive the customer-facing order notifications.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const TABLE_NAME: &str = "pos_order_status_history";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_order_status_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub order_id: i64,

    #[sea_orm(column_type = "String(Some(32))")]
    pub status: String,

    /// Profile id of the staff member who changed the status
    pub changed_by: Option<i64>,

    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
