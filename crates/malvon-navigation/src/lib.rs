//! Malvon Navigation
//!
//! Address bar input resolution:
//!   1. `malvon?<name>` → bundled internal page
//!   2. `file:///...` → local file, passed through
//!   3. Complete URL without whitespace → normalized and recorded as a visit
//!   4. Anything else → search engine query
//!
//! Direct URL visits feed a frequency store that ranks address bar
//! suggestions.

mod canonical;
mod context;
mod detector;
mod error;
mod history;
mod input;
mod normalize;
mod occurrences;
mod query;
mod resources;
mod suggestions;
mod visits;

pub use canonical::CanonicalUrl;
pub use context::BrowsingContext;
pub use detector::is_link;
pub use error::NavigationError;
pub use history::{HistoryEntry, HistoryManager};
pub use input::{InputResolver, DEFAULT_FALLBACK_URL, DEFAULT_SEARCH_TEMPLATE};
pub use normalize::Normalizer;
pub use occurrences::{SearchOccurrenceStore, DEFAULT_MIN_OCCURRENCES, DEFAULT_SUGGESTION_LIMIT};
pub use query::{classify, ClassifiedQuery, FILE_URL_PREFIX, INTERNAL_COMMAND_PREFIX};
pub use resources::{DirectoryBundle, NoBundledResources, ResourceBundle};
pub use suggestions::{
    parse_remote_suggestions, HistorySuggestion, RemoteSuggestions, Suggestions,
    SuggestionsManager,
};
pub use visits::{VisitFrequencyStore, VisitRecorder, VisitSink, DEFAULT_VISIT_QUEUE_CAPACITY};

pub type Result<T> = std::result::Result<T, NavigationError>;
