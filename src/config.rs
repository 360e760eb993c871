use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use url::Url;

use crate::models::Product;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub scheduler: SchedulerConfig,
    pub notifications: NotificationsConfig,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub base_fast_ms: u64,
    pub base_slow_ms: u64,
    pub step_up_ms: u64,
    pub step_down_ms: u64,
    pub stagger_ms: u64,
    pub failure_threshold: u32,
    /// Skip a product for a cycle while its previous fetch is still running.
    pub suppress_overlapping: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub require_first_party: bool,
    pub channel_capacity: usize,
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            scraper: ScraperConfig {
                user_agent: DEFAULT_USER_AGENT.to_string(),
                accept: "text/html,application/xhtml+xml".to_string(),
                accept_language: "en-US,en;q=0.9".to_string(),
                request_timeout_ms: 8000,
            },
            scheduler: SchedulerConfig {
                base_fast_ms: 3000,
                base_slow_ms: 10000,
                step_up_ms: 2000,
                step_down_ms: 1000,
                stagger_ms: 500,
                failure_threshold: 3,
                suppress_overlapping: true,
            },
            notifications: NotificationsConfig {
                require_first_party: false,
                channel_capacity: 256,
                discord: DiscordConfig {
                    webhook_url: None,
                    username: "Restock Watcher".to_string(),
                },
            },
            metrics: MetricsConfig {
                enabled: false,
                port: 9001,
            },
            products: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config_path` (optional), `config/local` (optional)
    /// and `RESTOCK__`-prefixed environment variables, on top of built-in defaults.
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let s = Config::builder()
            // Start with built-in defaults
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", u64::from(defaults.server.port))?
            .set_default("scraper.user_agent", defaults.scraper.user_agent)?
            .set_default("scraper.accept", defaults.scraper.accept)?
            .set_default("scraper.accept_language", defaults.scraper.accept_language)?
            .set_default("scraper.request_timeout_ms", defaults.scraper.request_timeout_ms)?
            .set_default("scheduler.base_fast_ms", defaults.scheduler.base_fast_ms)?
            .set_default("scheduler.base_slow_ms", defaults.scheduler.base_slow_ms)?
            .set_default("scheduler.step_up_ms", defaults.scheduler.step_up_ms)?
            .set_default("scheduler.step_down_ms", defaults.scheduler.step_down_ms)?
            .set_default("scheduler.stagger_ms", defaults.scheduler.stagger_ms)?
            .set_default("scheduler.failure_threshold", u64::from(defaults.scheduler.failure_threshold))?
            .set_default("scheduler.suppress_overlapping", defaults.scheduler.suppress_overlapping)?
            .set_default("notifications.require_first_party", defaults.notifications.require_first_party)?
            .set_default("notifications.channel_capacity", defaults.notifications.channel_capacity as u64)?
            .set_default("notifications.discord.username", defaults.notifications.discord.username)?
            .set_default("metrics.enabled", defaults.metrics.enabled)?
            .set_default("metrics.port", u64::from(defaults.metrics.port))?
            // Main config file
            .add_source(File::with_name(config_path).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "RESTOCK"
            .add_source(Environment::with_prefix("RESTOCK").separator("__").try_parsing(true))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Hosting platforms hand the listen port over as a bare PORT variable
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.server.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate scraper configuration
        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Scraper user_agent must not be empty".into()));
        }

        if self.scraper.request_timeout_ms == 0 {
            return Err(ConfigError::Message("Scraper request_timeout_ms must be greater than 0".into()));
        }

        // Validate scheduler configuration
        let scheduler = &self.scheduler;
        if scheduler.base_fast_ms == 0 {
            return Err(ConfigError::Message("Scheduler base_fast_ms must be greater than 0".into()));
        }

        if scheduler.base_fast_ms > scheduler.base_slow_ms {
            return Err(ConfigError::Message("Scheduler base_fast_ms cannot exceed base_slow_ms".into()));
        }

        if scheduler.failure_threshold == 0 {
            return Err(ConfigError::Message("Scheduler failure_threshold must be greater than 0".into()));
        }

        // Validate notification configuration
        if self.notifications.channel_capacity == 0 {
            return Err(ConfigError::Message("Notifications channel_capacity must be greater than 0".into()));
        }

        if let Some(webhook_url) = &self.notifications.discord.webhook_url {
            match Url::parse(webhook_url) {
                Ok(url) if url.scheme() == "https" || url.scheme() == "http" => {}
                _ => return Err(ConfigError::Message("Invalid Discord webhook URL format".into())),
            }
        }

        // Validate products
        let mut seen = HashSet::new();
        for product in &self.products {
            if Url::parse(&product.url).is_err() {
                return Err(ConfigError::Message(format!("Invalid product URL: {}", product.url)));
            }
            if !seen.insert(product.url.as_str()) {
                return Err(ConfigError::Message(format!("Duplicate product URL: {}", product.url)));
            }
        }

        Ok(())
    }
}
