//! Frequency store for URLs typed into the address bar

use malvon_storage::Database;
use rusqlite::OptionalExtension;

use crate::visits::VisitFrequencyStore;
use crate::Result;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 4;
pub const DEFAULT_MIN_OCCURRENCES: i64 = 3;

pub struct SearchOccurrenceStore {
    db: Database,
}

impl SearchOccurrenceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Bump the counter for `url`, inserting it on first sight.
    pub fn increment_occurrence(&self, url: &str) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO search_occurrences (url, occurrences) VALUES (?1, 1)
                 ON CONFLICT(url) DO UPDATE SET occurrences = occurrences + 1",
                [url],
            )?;
            Ok(())
        })?)
    }

    /// How many times `url` was recorded; zero when never seen.
    pub fn occurrences(&self, url: &str) -> Result<i64> {
        Ok(self.db.with_connection(|conn| {
            let count: Option<i64> = conn
                .query_row(
                    "SELECT occurrences FROM search_occurrences WHERE url = ?1",
                    [url],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(count.unwrap_or(0))
        })?)
    }

    /// Most frequent URLs starting with `prefix`.
    pub fn relevant_suggestions(
        &self,
        prefix: &str,
        limit: usize,
        min_occurrences: i64,
    ) -> Result<Vec<String>> {
        Ok(self.db.with_connection(|conn| {
            let pattern = format!("{}%", escape_like(prefix));

            let mut stmt = conn.prepare(
                "SELECT url FROM search_occurrences
                 WHERE url LIKE ?1 ESCAPE '\\' AND occurrences >= ?2
                 ORDER BY occurrences DESC, url ASC
                 LIMIT ?3",
            )?;

            let urls: Vec<String> = stmt
                .query_map(
                    rusqlite::params![pattern, min_occurrences, limit as i64],
                    |row| row.get::<_, String>(0),
                )?
                .filter_map(|r| r.ok())
                .collect();

            Ok(urls)
        })?)
    }

    pub fn clear(&self) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute("DELETE FROM search_occurrences", [])?;
            Ok(())
        })?)
    }
}

impl VisitFrequencyStore for SearchOccurrenceStore {
    fn increment_occurrence(&self, url: &str) -> Result<()> {
        SearchOccurrenceStore::increment_occurrence(self, url)
    }
}

impl Clone for SearchOccurrenceStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

/// Escape LIKE wildcards so user text matches literally (`ESCAPE '\'`).
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SearchOccurrenceStore {
        SearchOccurrenceStore::new(Database::open_in_memory().unwrap())
    }

    fn record(store: &SearchOccurrenceStore, url: &str, times: usize) {
        for _ in 0..times {
            store.increment_occurrence(url).unwrap();
        }
    }

    #[test]
    fn test_increment() {
        let store = store();
        assert_eq!(store.occurrences("example.com").unwrap(), 0);

        record(&store, "example.com", 3);
        assert_eq!(store.occurrences("example.com").unwrap(), 3);
        assert_eq!(store.occurrences("https://example.com").unwrap(), 0);
    }

    #[test]
    fn test_relevant_suggestions() {
        let store = store();
        record(&store, "github.com", 5);
        record(&store, "github.com/rust-lang", 3);
        record(&store, "gitlab.com", 7);
        record(&store, "google.com", 2);

        let suggestions = store
            .relevant_suggestions("git", DEFAULT_SUGGESTION_LIMIT, DEFAULT_MIN_OCCURRENCES)
            .unwrap();
        assert_eq!(
            suggestions,
            vec![
                "gitlab.com".to_string(),
                "github.com".to_string(),
                "github.com/rust-lang".to_string(),
            ]
        );

        // google.com is below the threshold
        let suggestions = store.relevant_suggestions("g", 10, 3).unwrap();
        assert!(!suggestions.contains(&"google.com".to_string()));

        let suggestions = store.relevant_suggestions("git", 1, 3).unwrap();
        assert_eq!(suggestions, vec!["gitlab.com".to_string()]);
    }

    #[test]
    fn test_prefix_is_literal() {
        let store = store();
        record(&store, "a_b.com", 3);
        record(&store, "axb.com", 3);

        let suggestions = store.relevant_suggestions("a_", 10, 1).unwrap();
        assert_eq!(suggestions, vec!["a_b.com".to_string()]);

        let suggestions = store.relevant_suggestions("%", 10, 1).unwrap();
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_clear() {
        let store = store();
        record(&store, "example.com", 2);
        store.clear().unwrap();
        assert_eq!(store.occurrences("example.com").unwrap(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let store = store();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || record(&store, "example.com", 25))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.occurrences("example.com").unwrap(), 100);
    }
}
