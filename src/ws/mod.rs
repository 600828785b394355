//! WebSocket endpoints

pub mod hub;

pub use hub::{serve_search_ws, serve_track_ws, HUB};
