//! One-shot search

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::routes::ApiResponse;
use crate::search::SearchResults;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<SearchResults>> {
    let hits = state.search.search(&query.q).await;
    Json(ApiResponse::success(SearchResults {
        query: query.q,
        hits,
    }))
}
