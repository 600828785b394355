//! Postal code lookup

use axum::{
    extract::{Path, State},
    Json,
};

use crate::external::{Address, PostalError};
use crate::routes::ApiResponse;
use crate::state::AppState;

pub const MSG_NOT_FOUND: &str = "Postal code not found";
pub const MSG_INVALID: &str = "Postal code must have 8 digits";
pub const MSG_FAILED: &str = "Failed to look up postal code";

/// GET /api/postal/:code
pub async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<ApiResponse<Option<Address>>> {
    match state.postal.lookup(&code).await {
        Ok(Some(address)) => Json(ApiResponse::success(Some(address))),
        Ok(None) => {
            tracing::info!("Postal code not found: {}", code);
            Json(ApiResponse::with_message(None, MSG_NOT_FOUND))
        }
        Err(PostalError::InvalidFormat) => Json(ApiResponse::error(400, MSG_INVALID)),
        Err(e) => {
            tracing::error!("Postal lookup for {} failed: {}", code, e);
            Json(ApiResponse::error(502, MSG_FAILED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_serializes_null_data() {
        let body = ApiResponse::<Option<Address>>::with_message(None, MSG_NOT_FOUND);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["code"], true);
        assert_eq!(value["message"], MSG_NOT_FOUND);
        assert!(value.get("data").is_some_and(|d| d.is_null()));
    }
}
