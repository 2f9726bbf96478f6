use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AppError {
    pub fn provider(context: impl std::fmt::Display, detail: impl std::fmt::Display) -> Self {
        AppError::Provider(format!("{}: {}", context, detail))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
