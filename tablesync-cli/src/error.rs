use tablesync_lib::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error for the demo binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("query store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}
