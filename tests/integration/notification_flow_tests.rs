use super::*;
use restock_watcher::models::{StockStatus, StockUpdateEvent};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_sequence(server: &MockServer, route: &str, pages: &[&str]) {
    // Mounted mocks are tried in order; each page serves one request, the last one repeats
    let (last, rest) = pages.split_last().expect("at least one page");
    for page in rest {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(*page))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(*last))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_restock_emits_only_on_change() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_sequence(
        &server,
        "/p/-/A-94681674",
        &[OOS_PAGE, OOS_PAGE, IN_STOCK_PAGE, IN_STOCK_PAGE, PREORDER_PAGE],
    )
    .await;

    let product = target_product(&server.uri(), "94681674");
    let config = get_test_config(vec![product.clone()]);
    let (mut manager, push) = create_product_manager(&config)?;
    let mut rx = push.subscribe();

    let mut emitted = Vec::new();
    for _ in 0..6 {
        for result in manager.check_all_once().await {
            if let Some(event) = result.event {
                emitted.push(event.status);
            }
        }
    }

    assert_eq!(emitted, vec![StockStatus::Oos, StockStatus::InStock, StockStatus::Preorder]);
    assert_eq!(manager.status_of(&product.url), StockStatus::Preorder);

    let first: StockUpdateEvent = rx.recv().await?;
    assert_eq!(first.url, product.url);
    assert_eq!(first.name, product.name);
    assert_eq!(first.status, StockStatus::Oos);
    Ok(())
}

#[tokio::test]
async fn test_failed_fetch_leaves_status_untouched() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IN_STOCK_PAGE))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let product = target_product(&server.uri(), "7");
    let config = get_test_config(vec![product.clone()]);
    let (mut manager, _push) = create_product_manager(&config)?;

    let first = manager.check_all_once().await;
    assert!(first[0].changed());

    let second = manager.check_all_once().await;
    assert!(!second[0].fetch_ok);
    assert!(second[0].event.is_none());
    assert_eq!(manager.status_of(&product.url), StockStatus::InStock);
    Ok(())
}

#[tokio::test]
async fn test_first_party_policy_downgrades_marketplace_listing() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip/55"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"availabilityStatus":"IN_STOCK","sellerName":"CardKingdom LLC"}"#),
        )
        .mount(&server)
        .await;

    let product = walmart_product(&server.uri(), "55");
    let mut config = get_test_config(vec![product]);
    config.notifications.require_first_party = true;
    let (mut manager, push) = create_product_manager(&config)?;
    let mut rx = push.subscribe();

    manager.check_all_once().await;

    let event = rx.recv().await?;
    assert_eq!(event.status, StockStatus::Oos);
    let wire = serde_json::to_value(&event)?;
    assert_eq!(wire["type"], "stock_update");
    assert_eq!(wire["site"], "walmart");
    assert_eq!(wire["extra"]["firstParty"], false);
    assert_eq!(wire["extra"]["rawStatus"], "third_party");
    Ok(())
}
