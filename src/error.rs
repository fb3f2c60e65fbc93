use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackFeedError {
    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("Realtime session error: {0}")]
    Session(String),

    #[error("File download failed: {0}")]
    Download(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SlackFeedError>;
