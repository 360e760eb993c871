use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

use super::responses::{ApiResponse, ProductView, StatusResponse};
use super::AppState;

pub async fn root() -> &'static str {
    "OK"
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let stats = state.stats.read().await.clone();
    let uptime_seconds = stats.uptime_seconds();

    Json(ApiResponse::success(StatusResponse {
        stats,
        uptime_seconds,
        subscribers: state.push.subscriber_count(),
    }))
}

pub async fn list_products(State(state): State<AppState>) -> Json<ApiResponse<Vec<ProductView>>> {
    let stats = state.stats.read().await;
    let products = state
        .products
        .iter()
        .map(|product| ProductView {
            status: stats.statuses.get(&product.url).copied().unwrap_or_default(),
            product: product.clone(),
        })
        .collect();

    Json(ApiResponse::success(products))
}

/// Server-sent events: a `hello` on connect, then every stock update as it is emitted.
pub async fn stream_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.push.subscribe();
    tracing::debug!("SSE client connected ({} subscribers)", state.push.subscriber_count());

    let hello = tokio_stream::once(Ok(Event::default()
        .event("hello")
        .data(json!({ "msg": "It works!" }).to_string())));

    let updates = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(update) => match Event::default().event("stock_update").json_data(&update) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::warn!("Failed to encode stock update for {}: {}", update.url, e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("SSE client lagged, {} updates dropped", skipped);
            Some(Ok(Event::default()
                .event("lagged")
                .data(json!({ "skipped": skipped }).to_string())))
        }
    });

    Sse::new(hello.chain(updates)).keep_alive(KeepAlive::default())
}
