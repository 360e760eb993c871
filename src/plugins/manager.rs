use std::collections::HashMap;
use std::sync::Arc;

use super::classifiers::{TargetClassifier, WalmartClassifier};
use super::dispatcher::NotificationDispatcher;
use super::notifiers::{BroadcastNotifier, DiscordNotifier};
use super::traits::{Classification, NotifierPlugin, StockClassifier};
use crate::config::NotificationsConfig;
use crate::models::Site;
use crate::utils::error::AppError;

pub type ClassifierBox = Box<dyn StockClassifier>;
pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Classifiers keyed by merchant plus the notifiers every change is fanned out to.
///
/// Owned by the scheduler loop, so no interior locking.
pub struct PluginManager {
    classifiers: HashMap<Site, ClassifierBox>,
    notifiers: Vec<Arc<dyn NotifierPlugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            classifiers: HashMap::new(),
            notifiers: Vec::new(),
        }
    }

    /// Register a classifier, replacing any existing one for the same site
    pub fn register_classifier(&mut self, plugin: ClassifierBox) {
        let site = plugin.site();
        if self.classifiers.insert(site, plugin).is_some() {
            tracing::warn!("Replaced existing classifier for {}", site);
        }
    }

    pub fn register_notifier(&mut self, plugin: NotifierPluginBox) {
        tracing::debug!("Registered notifier {}", plugin.name());
        self.notifiers.push(Arc::from(plugin));
    }

    pub fn has_classifier(&self, site: Site) -> bool {
        self.classifiers.contains_key(&site)
    }

    pub fn list_classifier_sites(&self) -> Vec<Site> {
        self.classifiers.keys().copied().collect()
    }

    pub fn list_notifier_names(&self) -> Vec<String> {
        self.notifiers.iter().map(|n| n.name().to_string()).collect()
    }

    /// Register the built-in classifiers, the push channel and (when configured) Discord
    pub fn initialize_default_plugins(
        &mut self,
        config: &NotificationsConfig,
        push_channel: BroadcastNotifier,
    ) -> Result<(), AppError> {
        self.register_classifier(Box::new(TargetClassifier::new()));
        self.register_classifier(Box::new(WalmartClassifier::new()));

        self.register_notifier(Box::new(push_channel));
        if let Some(discord) = DiscordNotifier::from_config(&config.discord)? {
            self.register_notifier(Box::new(discord));
        }

        Ok(())
    }

    /// Classify markup with the site's classifier, `None` if no classifier is registered
    pub fn classify(&self, site: Site, markup: &str) -> Option<Classification> {
        self.classifiers.get(&site).map(|c| c.classify(markup))
    }

    /// Start one delivery task per registered notifier
    pub fn start_dispatcher(&self) -> NotificationDispatcher {
        NotificationDispatcher::start(&self.notifiers)
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
