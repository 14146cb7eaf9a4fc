//! Malvon Core
//!
//! Coordination layer for the Malvon browser: configuration, profiles and
//! the address bar pipeline wired to persistent visit tracking.

mod browser;
mod config;
mod error;
mod profile;

pub use browser::Browser;
pub use config::Config;
pub use error::CoreError;
pub use profile::{Profile, DEFAULT_PROFILE_NAME, PRIVATE_PROFILE_NAME};

// Re-export core components
pub use malvon_navigation::{
    classify, BrowsingContext, CanonicalUrl, ClassifiedQuery, HistoryEntry, HistoryManager,
    HistorySuggestion, InputResolver, NavigationError, Normalizer, SearchOccurrenceStore,
    Suggestions,
};
pub use malvon_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
