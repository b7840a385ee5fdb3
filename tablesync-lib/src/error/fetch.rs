//! Data fetch error types

/// Errors reported by a [`DataSource`](crate::source::DataSource).
///
/// The controller never retries; a failed fetch leaves the previously
/// loaded rows in place.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The remote source rejected or failed the request.
    #[error("Fetch failed: {message}")]
    Failed { message: String },
}

impl FetchError {
    /// Creates a new failed-fetch error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
