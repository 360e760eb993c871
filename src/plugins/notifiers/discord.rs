use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::DiscordConfig;
use crate::models::{StockStatus, StockUpdateEvent};
use crate::plugins::traits::NotifierPlugin;
use crate::utils::error::AppError;

pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>, config: &DiscordConfig) -> Result<Self, AppError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(DiscordNotifier {
            client,
            webhook_url: webhook_url.into(),
            username: config.username.clone(),
        })
    }

    /// Builds a notifier when a webhook is configured.
    pub fn from_config(config: &DiscordConfig) -> Result<Option<Self>, AppError> {
        match &config.webhook_url {
            Some(url) => Ok(Some(Self::new(url.clone(), config)?)),
            None => Ok(None),
        }
    }

    fn get_embed_color(&self, status: &StockStatus) -> u32 {
        match status {
            StockStatus::InStock => 0x00ff00,    // Green, go buy it
            StockStatus::Preorder => 0x0099ff,   // Blue
            StockStatus::ThirdParty => 0xff9900, // Orange, marketplace seller
            StockStatus::Oos | StockStatus::Unknown => 0x808080,
        }
    }

    fn get_emoji(&self, status: &StockStatus) -> &str {
        match status {
            StockStatus::InStock => "🟢",
            StockStatus::Preorder => "🕒",
            StockStatus::ThirdParty => "🟠",
            StockStatus::Oos | StockStatus::Unknown => "⚪",
        }
    }

    fn create_embed(&self, event: &StockUpdateEvent) -> serde_json::Value {
        let mut fields = vec![
            json!({
                "name": "Status",
                "value": event.status.as_str(),
                "inline": true
            }),
            json!({
                "name": "🏪 Store",
                "value": format!("[{}]({})", event.site, event.url),
                "inline": true
            }),
        ];

        if let Some(raw_status) = event.extra.as_ref().and_then(|e| e.raw_status) {
            if raw_status != event.status {
                fields.push(json!({
                    "name": "Listing",
                    "value": format!("{} (first-party seller required)", raw_status),
                    "inline": false
                }));
            }
        }

        json!({
            "title": format!("{} {}", self.get_emoji(&event.status), event.name),
            "url": event.url,
            "color": self.get_embed_color(&event.status),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "fields": fields,
            "footer": { "text": "Restock Watcher" }
        })
    }

    fn create_webhook_payload(&self, event: &StockUpdateEvent) -> serde_json::Value {
        json!({
            "username": self.username,
            "embeds": [self.create_embed(event)]
        })
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, event: &StockUpdateEvent) -> Result<(), AppError> {
        let payload = self.create_webhook_payload(event);

        let response = self.client.post(&self.webhook_url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Notification {
                notifier: self.name().to_string(),
                message: format!("webhook returned {}", response.status()),
            });
        }

        Ok(())
    }
}
