//! Profile entity - staff accounts
//!
//! Table: pos_profile

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
    Waiter,
    Kitchen,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Cashier,
        Role::Waiter,
        Role::Kitchen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
            Role::Waiter => "waiter",
            Role::Kitchen => "kitchen",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pos_profile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Login name (unique)
    #[sea_orm(column_type = "String(Some(64))", unique)]
    pub username: String,

    /// bcrypt hash
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(column_type = "String(Some(128))")]
    pub full_name: String,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub email: Option<String>,

    #[sea_orm(column_type = "String(Some(16))")]
    pub role: String,

    pub active: bool,

    pub last_login: i64,

    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
