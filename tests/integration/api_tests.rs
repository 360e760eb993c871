use super::*;
use axum::http::{Method, StatusCode};
use futures::StreamExt;
use restock_watcher::web::create_router;
use std::time::Duration;

fn products() -> Vec<restock_watcher::models::Product> {
    vec![
        target_product("https://www.target.com", "94681674"),
        walmart_product("https://www.walmart.com", "5079"),
    ]
}

#[tokio::test]
async fn test_root_and_health_check() -> anyhow::Result<()> {
    let (state, _scheduler) = create_test_app_state(&get_test_config(Vec::new()))?;
    let mut app = create_router(state);

    let response = make_request(&mut app, Method::GET, "/").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], b"OK");

    let response = make_request(&mut app, Method::GET, "/health").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await?["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_status_reports_scheduler_stats() -> anyhow::Result<()> {
    let (state, _scheduler) = create_test_app_state(&get_test_config(products()))?;
    let mut app = create_router(state);

    let response = make_request(&mut app, Method::GET, "/api/v1/status").await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["current_interval_ms"], 50);
    assert_eq!(body["data"]["consecutive_failures"], 0);
    assert_eq!(body["data"]["cycles_started"], 0);
    assert_eq!(body["data"]["subscribers"], 0);
    Ok(())
}

#[tokio::test]
async fn test_products_list_last_known_status() -> anyhow::Result<()> {
    let config = get_test_config(products());
    let (state, _scheduler) = create_test_app_state(&config)?;
    state
        .stats
        .write()
        .await
        .statuses
        .insert(config.products[0].url.clone(), restock_watcher::models::StockStatus::InStock);
    let mut app = create_router(state);

    let response = make_request(&mut app, Method::GET, "/api/v1/products").await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await?;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["site"], "target");
    assert_eq!(items[0]["status"], "in_stock");
    assert_eq!(items[1]["site"], "walmart");
    assert_eq!(items[1]["status"], "unknown");
    Ok(())
}

#[tokio::test]
async fn test_event_stream_greets_then_pushes_updates() -> anyhow::Result<()> {
    let config = get_test_config(products());
    let (state, _scheduler) = create_test_app_state(&config)?;
    let push = state.push.clone();
    let mut app = create_router(state);

    let response = make_request(&mut app, Method::GET, "/events").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut body = response.into_body().into_data_stream();
    let hello = tokio::time::timeout(Duration::from_secs(2), body.next()).await?.unwrap()?;
    let hello = String::from_utf8(hello.to_vec())?;
    assert!(hello.contains("event: hello"));
    assert!(hello.contains(r#"{"msg":"It works!"}"#));

    let event = restock_watcher::models::StockUpdateEvent::new(
        &config.products[0],
        restock_watcher::models::StockStatus::InStock,
        Default::default(),
    );
    restock_watcher::plugins::NotifierPlugin::notify(&push, &event).await?;

    let update = tokio::time::timeout(Duration::from_secs(2), body.next()).await?.unwrap()?;
    let update = String::from_utf8(update.to_vec())?;
    assert!(update.contains("event: stock_update"));
    assert!(update.contains(r#""type":"stock_update""#));
    assert!(update.contains(r#""status":"in_stock""#));
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> anyhow::Result<()> {
    let (state, _scheduler) = create_test_app_state(&get_test_config(Vec::new()))?;
    let mut app = create_router(state);

    let response = make_request(&mut app, Method::GET, "/api/v1/nope").await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
