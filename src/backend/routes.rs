use axum::routing::{delete, get, post};
use axum::Router;

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/api/transactions/{id}",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/api/categories/{id}", delete(handlers::delete_category))
        .route("/api/analytics/summary", get(handlers::analytics_summary))
        .route("/api/parse", post(handlers::parse_text))
}
