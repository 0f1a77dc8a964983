use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// Unified error type for the search client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
