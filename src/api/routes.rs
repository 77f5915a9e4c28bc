use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Deck
        .route("/deck", get(handlers::get_deck))
        .route("/deck/swipe", post(handlers::swipe))
        .route("/deck/decide", post(handlers::decide))
        .route("/deck/refill", post(handlers::refill))
        // Confirmation panel
        .route("/panel", get(handlers::get_panel))
        .route("/panel/confirm", post(handlers::confirm))
        .route("/panel/cancel", post(handlers::cancel))
        // Watchlist
        .route("/watchlist", get(handlers::get_watchlist))
        .route("/watchlist/:id", delete(handlers::remove_from_watchlist))
        .route("/notices", get(handlers::take_notices))
        // The swipe UI may be served from another local origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
