//! Query store error types

/// Errors that can occur while reading or writing a query store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backing URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The store cannot be accessed (poisoned lock, detached backend).
    #[error("Query store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Creates a new unavailable-store error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
