pub mod error;
mod handlers;
mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::config::Config;
use crate::parser::TransactionParser;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub parser: Arc<dyn TransactionParser>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Nonna backend is running" }))
        .merge(routes::api_routes())
        .with_state(state)
}

pub async fn run_server(
    pool: Pool<Sqlite>,
    parser: Arc<dyn TransactionParser>,
    config: &Config,
) -> anyhow::Result<()> {
    let state = AppState { db: pool, parser };
    let app = app(state);

    info!(addr = %config.listen_addr, "server listening");
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
