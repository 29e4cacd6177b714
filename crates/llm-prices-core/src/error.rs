#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[cfg(feature = "network")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PriceError>;
