//! Order entity
//!
//! Table: pos_order

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const TABLE_NAME: &str = "pos_order";

/// Order lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "out_for_delivery" => Some(OrderStatus::OutForDelivery),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// How the order leaves the kitchen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine_in",
            OrderType::Takeaway => "takeaway",
            OrderType::Delivery => "delivery",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_order")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Human-facing sequential order number
    #[sea_orm(unique)]
    pub order_number: i64,

    pub table_id: Option<i64>,

    pub customer_id: Option<i64>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub customer_name: Option<String>,

    /// Phone the customer tracks the order with
    #[sea_orm(column_type = "String(Some(32))", nullable)]
    pub customer_phone: Option<String>,

    /// dine_in / takeaway / delivery
    #[sea_orm(column_type = "String(Some(16))")]
    pub order_type: String,

    #[sea_orm(column_type = "String(Some(32))")]
    pub status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    #[sea_orm(column_type = "String(Some(32))", nullable)]
    pub coupon_code: Option<String>,

    /// Sum of line totals before discount, in cents
    pub subtotal_cents: i64,

    pub discount_cents: i64,

    pub total_cents: i64,

    pub created_at: i64,

    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
