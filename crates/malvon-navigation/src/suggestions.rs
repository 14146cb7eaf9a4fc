//! Address bar suggestions
//!
//! Local suggestions come from the occurrence store (frequently typed URLs)
//! and browsing history. Remote suggestions come from the search engine's
//! completion endpoint.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::NavigationError;
use crate::history::HistoryManager;
use crate::occurrences::{
    SearchOccurrenceStore, DEFAULT_MIN_OCCURRENCES, DEFAULT_SUGGESTION_LIMIT,
};
use crate::Result;

pub const REMOTE_SUGGESTIONS_ENDPOINT: &str =
    "https://suggestqueries.google.com/complete/search?client=firefox&q=";

/// History entries must have been visited more than four times.
const HISTORY_MIN_VISITS: i32 = 5;
const HISTORY_LIMIT: usize = 8;
const REMOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Query component encoding: everything but RFC 3986 unreserved characters.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySuggestion {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    /// The text as typed, always offered first
    pub query: String,
    /// Frequently typed URLs starting with the query
    pub top_searches: Vec<String>,
    /// Frequently visited pages matching the query
    pub history: Vec<HistorySuggestion>,
}

pub struct SuggestionsManager {
    occurrences: SearchOccurrenceStore,
    history: HistoryManager,
    limit: usize,
    min_occurrences: i64,
}

impl SuggestionsManager {
    pub fn new(occurrences: SearchOccurrenceStore, history: HistoryManager) -> Self {
        Self {
            occurrences,
            history,
            limit: DEFAULT_SUGGESTION_LIMIT,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
        }
    }

    pub fn with_limits(mut self, limit: usize, min_occurrences: i64) -> Self {
        self.limit = limit;
        self.min_occurrences = min_occurrences;
        self
    }

    pub fn local(&self, query: &str) -> Result<Suggestions> {
        if query.trim().is_empty() {
            return Ok(Suggestions {
                query: query.to_string(),
                ..Suggestions::default()
            });
        }

        let top_searches =
            self.occurrences
                .relevant_suggestions(query, self.limit, self.min_occurrences)?;

        let history = self
            .history
            .search(query, HISTORY_LIMIT, HISTORY_MIN_VISITS)?
            .into_iter()
            .map(|entry| HistorySuggestion {
                title: entry.title,
                url: entry.url,
            })
            .collect();

        Ok(Suggestions {
            query: query.to_string(),
            top_searches,
            history,
        })
    }
}

impl Clone for SuggestionsManager {
    fn clone(&self) -> Self {
        Self {
            occurrences: self.occurrences.clone(),
            history: self.history.clone(),
            limit: self.limit,
            min_occurrences: self.min_occurrences,
        }
    }
}

/// Client for the search engine completion endpoint.
#[derive(Clone)]
pub struct RemoteSuggestions {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteSuggestions {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(REMOTE_SUGGESTIONS_ENDPOINT.to_string())
    }

    /// `endpoint` is used as a prefix; the encoded query is appended.
    pub fn with_endpoint(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REMOTE_TIMEOUT)
            .build()
            .map_err(|e| NavigationError::Remote(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn request_url(&self, query: &str) -> String {
        format!(
            "{}{}",
            self.endpoint,
            utf8_percent_encode(query, QUERY_COMPONENT)
        )
    }

    /// Fetch completions for `query`. Failures yield an empty list.
    pub async fn fetch(&self, query: &str) -> Vec<String> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        match self.try_fetch(query).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::debug!(query = %query, error = %e, "Remote suggestions unavailable");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, query: &str) -> Result<Vec<String>> {
        let body = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| NavigationError::Remote(e.to_string()))?
            .text()
            .await
            .map_err(|e| NavigationError::Remote(e.to_string()))?;

        parse_remote_suggestions(&body)
    }
}

/// Parse the `["query", ["suggestion", ...], ...]` completion format.
pub fn parse_remote_suggestions(body: &str) -> Result<Vec<String>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| NavigationError::Remote(e.to_string()))?;

    let list = value
        .as_array()
        .and_then(|items| items.get(1))
        .and_then(|items| items.as_array())
        .ok_or_else(|| NavigationError::Remote("unexpected suggestion format".to_string()))?;

    Ok(list
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use malvon_storage::Database;

    fn manager() -> (SuggestionsManager, SearchOccurrenceStore, HistoryManager) {
        let db = Database::open_in_memory().unwrap();
        let occurrences = SearchOccurrenceStore::new(db.clone());
        let history = HistoryManager::new(db);
        (
            SuggestionsManager::new(occurrences.clone(), history.clone()),
            occurrences,
            history,
        )
    }

    #[test]
    fn test_local_suggestions() {
        let (manager, occurrences, history) = manager();

        for _ in 0..3 {
            occurrences.increment_occurrence("github.com").unwrap();
        }
        occurrences.increment_occurrence("gist.github.com").unwrap();

        for _ in 0..5 {
            history
                .record_visit("https://github.com/rust-lang/rust", "rust-lang/rust")
                .unwrap();
        }
        for _ in 0..2 {
            history
                .record_visit("https://github.com/tokio-rs/tokio", "tokio")
                .unwrap();
        }

        let suggestions = manager.local("gi").unwrap();
        assert_eq!(suggestions.query, "gi");
        assert_eq!(suggestions.top_searches, vec!["github.com".to_string()]);
        assert_eq!(
            suggestions.history,
            vec![HistorySuggestion {
                title: "rust-lang/rust".to_string(),
                url: "https://github.com/rust-lang/rust".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_query() {
        let (manager, occurrences, _) = manager();
        for _ in 0..5 {
            occurrences.increment_occurrence("github.com").unwrap();
        }

        let suggestions = manager.local("").unwrap();
        assert!(suggestions.top_searches.is_empty());
        assert!(suggestions.history.is_empty());
    }

    #[test]
    fn test_custom_limits() {
        let (manager, occurrences, _) = manager();
        occurrences.increment_occurrence("a.com").unwrap();
        occurrences.increment_occurrence("ab.com").unwrap();

        let manager = manager.with_limits(1, 1);
        assert_eq!(manager.local("a").unwrap().top_searches.len(), 1);
    }

    #[test]
    fn test_parse_remote_suggestions() {
        let body = r#"["rust",["rust lang","rust book","rustup"],[],{"google:suggesttype":[]}]"#;
        assert_eq!(
            parse_remote_suggestions(body).unwrap(),
            vec![
                "rust lang".to_string(),
                "rust book".to_string(),
                "rustup".to_string()
            ]
        );

        assert!(parse_remote_suggestions("{}").is_err());
        assert!(parse_remote_suggestions("not json").is_err());
        assert!(parse_remote_suggestions(r#"["rust"]"#).is_err());
    }

    #[test]
    fn test_request_url_encodes_query() {
        let remote = RemoteSuggestions::new().unwrap();
        assert_eq!(
            remote.request_url("a&b c"),
            "https://suggestqueries.google.com/complete/search?client=firefox&q=a%26b%20c"
        );
    }

    #[tokio::test]
    async fn test_fetch_empty_query_skips_request() {
        let remote = RemoteSuggestions::with_endpoint("http://127.0.0.1:9/?q=".to_string()).unwrap();
        assert!(remote.fetch("   ").await.is_empty());
    }
}
