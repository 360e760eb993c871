pub mod classifier;
pub mod notifier;

pub use classifier::{Classification, StockClassifier};
pub use notifier::NotifierPlugin;
