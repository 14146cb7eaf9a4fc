//! Malvon Storage Layer
//!
//! SQLite persistence for the address bar: visit frequencies, browsing
//! history and persisted settings.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
