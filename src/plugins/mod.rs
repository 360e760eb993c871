pub mod classifiers;
pub mod dispatcher;
pub mod manager;
pub mod notifiers;
pub mod traits;

pub use dispatcher::NotificationDispatcher;
pub use manager::PluginManager;
pub use traits::{Classification, NotifierPlugin, StockClassifier};
