use thiserror::Error;

/// Errors produced by the property store and its backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Local storage could not be written (disk full, permissions, ...).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The hosted backend could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The hosted backend answered but refused the request.
    #[error("Backend rejected request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Realtime channel error: {0}")]
    Realtime(#[from] tokio_tungstenite::tungstenite::Error),

    /// The realtime server refused to subscribe us to the table.
    #[error("Realtime subscription rejected: {0}")]
    JoinRejected(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
