use axum::{extract::State, response::Json};
use serde::Serialize;

use super::ApiResponse;
use crate::state::AppState;
use crate::ws::HUB;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    /// Open customer order-tracking sockets
    pub trackers: usize,
    /// Distinct phone numbers behind those sockets
    #[serde(rename = "trackedPhones")]
    pub tracked_phones: usize,
    /// Live change-feed subscribers
    #[serde(rename = "feedSubscribers")]
    pub feed_subscribers: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        trackers: HUB.connection_count(),
        tracked_phones: HUB.tracked_phones(),
        feed_subscribers: state.feed.subscriber_count(),
    }))
}
