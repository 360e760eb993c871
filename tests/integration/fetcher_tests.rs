use super::*;
use restock_watcher::scraper::PageFetcher;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_fetcher(request_timeout_ms: u64) -> anyhow::Result<HttpFetcher> {
    let mut config = get_test_config(Vec::new());
    config.scraper.request_timeout_ms = request_timeout_ms;
    Ok(HttpFetcher::new(&config.scraper)?)
}

#[tokio::test]
async fn test_fetch_sends_browser_headers() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/-/A-1"))
        .and(header("user-agent", "RestockWatcher-Test/1.0"))
        .and(header("cache-control", "no-cache"))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(2000)?;
    let outcome = fetcher.fetch(&format!("{}/p/-/A-1", server.uri())).await;

    assert!(outcome.ok);
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.markup.as_deref(), Some(IN_STOCK_PAGE));
    Ok(())
}

#[tokio::test]
async fn test_fetch_reports_error_status() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let fetcher = create_fetcher(2000)?;
    let outcome = fetcher.fetch(&format!("{}/p/-/A-404", server.uri())).await;

    assert!(!outcome.ok);
    assert!(outcome.markup.is_none());
    assert_eq!(outcome.status_code, Some(404));
    assert!(outcome.error.unwrap().contains("404"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_follows_redirects() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/-/A-old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/p/-/A-new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/-/A-new"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OOS_PAGE))
        .mount(&server)
        .await;

    let fetcher = create_fetcher(2000)?;
    let outcome = fetcher.fetch(&format!("{}/p/-/A-old", server.uri())).await;

    assert!(outcome.ok);
    assert_eq!(outcome.markup.as_deref(), Some(OOS_PAGE));
    Ok(())
}

#[tokio::test]
async fn test_fetch_is_bounded_by_timeout() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(IN_STOCK_PAGE)
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let fetcher = create_fetcher(200)?;
    let started = std::time::Instant::now();
    let outcome = fetcher.fetch(&format!("{}/p/-/A-slow", server.uri())).await;

    assert!(!outcome.ok);
    assert!(outcome.error.unwrap().contains("timed out"));
    assert!(started.elapsed() < Duration::from_millis(1500));
    Ok(())
}
