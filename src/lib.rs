//! RestoPOS - restaurant point of sale backend
//!
//! Menu, tables, orders and staff management over a JSON API, with live
//! order tracking and search over WebSocket.

pub mod catalog;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod notify;
pub mod orders;
pub mod permission;
pub mod receipt;
pub mod routes;
pub mod search;
pub mod seed;
pub mod state;
pub mod theme;
pub mod ws;

pub use config::Config;
pub use state::AppState;
