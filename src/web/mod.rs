use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::models::Product;
use crate::plugins::notifiers::BroadcastNotifier;
use crate::scheduler::SharedStats;

pub mod handlers;
pub mod responses;

pub use handlers::{get_status, health_check, list_products, root, stream_events};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub stats: SharedStats,
    pub push: BroadcastNotifier,
    pub products: Arc<Vec<Product>>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/events", get(stream_events))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/products", get(list_products))
}
