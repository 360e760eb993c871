use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Notification error: {notifier}: {message}")]
    Notification { notifier: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
