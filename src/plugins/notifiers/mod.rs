// Notifier plugin implementations
pub mod broadcast;
pub mod discord;

pub use broadcast::BroadcastNotifier;
pub use discord::DiscordNotifier;
