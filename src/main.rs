use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use restock_watcher::plugins::notifiers::BroadcastNotifier;
use restock_watcher::plugins::PluginManager;
use restock_watcher::scraper::HttpFetcher;
use restock_watcher::web::{create_router, AppState};
use restock_watcher::{AppConfig, ProductManager, ProductScheduler};

#[derive(Parser, Debug)]
#[command(name = "restock-watcher", version, about)]
struct Cli {
    /// Configuration file, without extension
    #[arg(short, long, default_value = "config/default")]
    config: String,

    /// Check every product once, print the results as JSON lines and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restock_watcher=debug".parse()?),
        )
        .init();

    let config = AppConfig::load(&cli.config)?;
    info!("Starting Restock Watcher with {} products", config.products.len());

    if config.metrics.enabled {
        PrometheusBuilder::new()
            .with_http_listener(SocketAddr::from(([0, 0, 0, 0], config.metrics.port)))
            .install()?;
        info!("Prometheus exporter listening on port {}", config.metrics.port);
    }

    let push = BroadcastNotifier::new(config.notifications.channel_capacity);
    let mut plugins = PluginManager::new();
    plugins.initialize_default_plugins(&config.notifications, push.clone())?;
    let sites: Vec<String> = plugins.list_classifier_sites().iter().map(|s| s.to_string()).collect();
    info!("Classifiers: {}", sites.join(", "));
    info!("Notifiers: {}", plugins.list_notifier_names().join(", "));

    let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);
    let mut product_manager = ProductManager::new(fetcher, plugins, &config);

    if cli.once {
        for result in product_manager.check_all_once().await {
            println!("{}", serde_json::to_string(&result)?);
        }
        product_manager.close().await;
        return Ok(());
    }

    let scheduler = ProductScheduler::new(product_manager, &config.scheduler).spawn();

    let state = AppState {
        stats: scheduler.stats(),
        push,
        products: Arc::new(config.products.clone()),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    scheduler.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
