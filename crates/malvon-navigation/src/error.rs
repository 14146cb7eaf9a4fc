//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("Failed to encode search term: {0}")]
    Encoding(String),

    #[error("Invalid search template: {0}")]
    InvalidSearchTemplate(String),

    #[error("Bundled resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Suggestion request failed: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(#[from] malvon_storage::StorageError),
}
