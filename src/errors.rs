use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Filter encoding error: {0}")]
    FilterEncoding(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Value encoding error: {0}")]
    ValueEncoding(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Document not found: {0}")]
    NoSuchDocument(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl DbError {
    /// True for the deterministic encode-time failures; resending the same input cannot succeed.
    #[must_use]
    pub fn is_encoding(&self) -> bool {
        matches!(
            self,
            Self::FilterEncoding(_) | Self::UnsupportedFilter(_) | Self::ValueEncoding(_)
        )
    }
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
