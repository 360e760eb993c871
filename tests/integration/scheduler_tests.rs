use super::*;
use restock_watcher::models::StockStatus;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_scheduler_detects_restock() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OOS_PAGE))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .mount(&server)
        .await;

    let config = get_test_config(vec![target_product(&server.uri(), "94681674")]);
    let (scheduler, push) = create_scheduler(&config)?;
    let mut rx = push.subscribe();
    let handle = scheduler.spawn();

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await??;
    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await??;
    assert_eq!(first.status, StockStatus::Oos);
    assert_eq!(second.status, StockStatus::InStock);

    let stats = handle.stats();
    handle.shutdown().await;

    let stats = stats.read().await;
    assert!(stats.cycles_started >= 4);
    assert_eq!(stats.events_emitted, 2);
    assert_eq!(stats.fetches_failed, 0);
    assert_eq!(stats.current_interval_ms, 50);
    Ok(())
}

#[tokio::test]
async fn test_scheduler_slows_down_and_recovers() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(9)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .mount(&server)
        .await;

    let config = get_test_config(vec![target_product(&server.uri(), "1")]);
    let (scheduler, push) = create_scheduler(&config)?;
    let mut rx = push.subscribe();
    let handle = scheduler.spawn();
    let stats = handle.stats();

    // Nine failures: 50 -> 100 -> 150 -> 200
    let backed_off = wait_for_condition(|| async { stats.read().await.current_interval_ms == 200 }, 5000).await;
    assert!(backed_off, "interval never reached base_slow_ms");

    // Then the page recovers and every success steps the interval back down
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await??;
    assert_eq!(event.status, StockStatus::InStock);
    let recovered = wait_for_condition(|| async { stats.read().await.current_interval_ms == 50 }, 5000).await;

    handle.shutdown().await;
    assert!(recovered, "interval never returned to base_fast_ms");

    let stats = stats.read().await;
    assert_eq!(stats.fetches_failed, 9);
    assert!(stats.interval_changes >= 6);
    Ok(())
}

#[tokio::test]
async fn test_slow_fetch_is_not_overlapped() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(OOS_PAGE)
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let mut config = get_test_config(vec![target_product(&server.uri(), "1")]);
    config.scheduler.base_fast_ms = 20;
    let (scheduler, _push) = create_scheduler(&config)?;
    let handle = scheduler.spawn();
    let stats = handle.stats();

    tokio::time::sleep(Duration::from_millis(250)).await;
    let snapshot = stats.read().await.clone();
    handle.shutdown().await;

    assert!(snapshot.cycles_started >= 3);
    assert_eq!(snapshot.fetches_started, 1);
    assert!(snapshot.skipped_in_flight >= 2);
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_staggered_fetch_starts() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OOS_PAGE))
        .mount(&server)
        .await;

    let mut config = get_test_config(vec![
        target_product(&server.uri(), "1"),
        target_product(&server.uri(), "2"),
        target_product(&server.uri(), "3"),
    ]);
    config.scheduler.stagger_ms = 100;
    config.scheduler.base_fast_ms = 10_000;
    config.scheduler.base_slow_ms = 10_000;
    let (scheduler, _push) = create_scheduler(&config)?;
    let handle = scheduler.spawn();

    // Only the first product's fetch has started shortly after the immediate first cycle
    tokio::time::sleep(Duration::from_millis(50)).await;
    let early = server.received_requests().await.map(|r| r.len()).unwrap_or_default();

    tokio::time::sleep(Duration::from_millis(400)).await;
    let late = server.received_requests().await.map(|r| r.len()).unwrap_or_default();
    handle.shutdown().await;

    assert_eq!(early, 1);
    assert_eq!(late, 3);
    Ok(())
}

#[tokio::test]
async fn test_slow_webhook_does_not_stall_polling() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/-/A-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(3000)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = get_test_config(vec![target_product(&server.uri(), "1")]);
    config.notifications.discord.webhook_url = Some(format!("{}/hook", server.uri()));
    let (scheduler, push) = create_scheduler(&config)?;
    let mut rx = push.subscribe();
    let handle = scheduler.spawn();
    let stats = handle.stats();

    // The push channel gets the event while the webhook is still sleeping
    let event = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await??;
    assert_eq!(event.status, StockStatus::InStock);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let snapshot = stats.read().await.clone();
    handle.shutdown().await;

    assert!(snapshot.cycles_started >= 5, "only {} cycles while the webhook was pending", snapshot.cycles_started);
    assert!(snapshot.fetches_succeeded >= 5);
    assert_eq!(snapshot.events_emitted, 1);

    // Shutdown waits for the pending delivery
    let webhook_calls = server
        .received_requests()
        .await
        .map(|requests| requests.iter().filter(|r| r.url.path() == "/hook").count());
    assert_eq!(webhook_calls, Some(1));
    Ok(())
}
