//! HTTP surface: the chat endpoint plus the JSON expense API.

pub mod api;
pub mod state;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Header carrying the caller's user id.
pub const USER_HEADER: &str = "x-user-id";

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Chat
        .route("/chat", post(api::chat))
        .route("/chat/status", get(api::chat_status))
        // Expenses
        .route("/expenses", get(api::list_expenses).post(api::create_expense))
        .route("/expenses/pending", get(api::list_pending))
        .route("/expenses/:id", get(api::get_expense))
        .route("/expenses/:id/submit", post(api::submit_expense))
        .route("/expenses/:id/approve", post(api::approve_expense))
        .route("/expenses/:id/reject", post(api::reject_expense))
        .route("/categories", get(api::list_categories))
        .route("/dashboard", get(api::dashboard));

    Router::new()
        .route("/health", get(api::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
