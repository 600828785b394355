use axum::{
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;
use crate::ws;

pub mod health;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(_code: i32, message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }

    /// Successful response with a custom message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Session store (in-memory)
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        // Auth
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/user/current", get(handlers::auth::current_user))
        // Theme
        .route("/theme", get(handlers::theme::get_theme).post(handlers::theme::set_theme))
        // Search
        .route("/search", get(handlers::search::search))
        .route("/search/ws", get(ws::serve_search_ws))
        // Customer-facing
        .route("/track/ws", get(ws::serve_track_ws))
        .route("/postal/:code", get(handlers::postal::lookup))
        // Tables
        .route(
            "/tables",
            get(handlers::tables::list_tables).post(handlers::tables::create_table),
        )
        .route(
            "/tables/:id",
            put(handlers::tables::update_table).delete(handlers::tables::delete_table),
        )
        .route("/tables/:id/qr", get(handlers::tables::table_qr))
        // Menu
        .route(
            "/categories",
            get(handlers::menu::list_categories).post(handlers::menu::create_category),
        )
        .route(
            "/categories/:id",
            put(handlers::menu::update_category).delete(handlers::menu::delete_category),
        )
        .route(
            "/menu-items",
            get(handlers::menu::list_menu_items).post(handlers::menu::create_menu_item),
        )
        .route(
            "/menu-items/:id",
            put(handlers::menu::update_menu_item).delete(handlers::menu::delete_menu_item),
        )
        // Orders
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/status", post(handlers::orders::update_order_status))
        .route("/orders/:id/receipt", get(handlers::orders::order_receipt))
        // Customers
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/customers/:id",
            put(handlers::customers::update_customer).delete(handlers::customers::delete_customer),
        )
        // Suppliers
        .route(
            "/suppliers",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route(
            "/suppliers/:id",
            put(handlers::suppliers::update_supplier).delete(handlers::suppliers::delete_supplier),
        )
        // Coupons
        .route(
            "/coupons",
            get(handlers::coupons::list_coupons).post(handlers::coupons::create_coupon),
        )
        .route(
            "/coupons/:id",
            put(handlers::coupons::update_coupon).delete(handlers::coupons::delete_coupon),
        )
        // Inventory
        .route(
            "/inventory",
            get(handlers::inventory::list_inventory).post(handlers::inventory::create_inventory_item),
        )
        .route(
            "/inventory/:id",
            put(handlers::inventory::update_inventory_item)
                .delete(handlers::inventory::delete_inventory_item),
        )
        // Users
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/users/:id", put(handlers::users::update_user))
        .route(
            "/users/:id/permissions",
            get(handlers::users::get_user_grants).put(handlers::users::set_user_grants),
        )
        .route("/roles", get(handlers::users::list_roles))
        // Settings
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .fallback(fallback);

    // Static frontend; unknown paths fall back to index.html for SPA routing
    let static_dir = "webapp/dist";
    let index_file = format!("{}/index.html", static_dir);
    let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(404, "Not Found")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        let ok = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(ok["code"], true);
        assert_eq!(ok["data"][1], 2);

        let err = serde_json::to_value(ApiResponse::<()>::error(400, "Name is required")).unwrap();
        assert_eq!(err["code"], false);
        assert_eq!(err["message"], "Name is required");
        assert!(err.get("data").is_none());
    }
}
