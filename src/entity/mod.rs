//! Entity module - SeaORM entity definitions
//!
//! One module per backend table. Relationships are carried as id columns and
//! resolved by explicit queries.

pub mod category;
pub mod coupon;
pub mod customer;
pub mod dining_table;
pub mod inventory_item;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod order_status_history;
pub mod profile;
pub mod restaurant_settings;
pub mod supplier;
pub mod theme_preference;
pub mod user_permission;
