//! Browsing history

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::occurrences::escape_like;
use crate::Result;
use malvon_storage::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub visited_at: DateTime<Utc>,
    pub visit_count: i32,
}

impl HistoryEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let visited_str: String = row.get(3)?;
        let visited_at = DateTime::parse_from_rfc3339(&visited_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            visited_at,
            visit_count: row.get(4)?,
        })
    }
}

pub struct HistoryManager {
    db: Database,
}

impl HistoryManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a page load. An empty title keeps the stored one.
    pub fn record_visit(&self, url: &str, title: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        Ok(self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO history (url, title, visited_at, visit_count) VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT(url) DO UPDATE SET
                     title = CASE WHEN excluded.title != '' THEN excluded.title ELSE title END,
                     visited_at = excluded.visited_at,
                     visit_count = visit_count + 1",
                rusqlite::params![url, title, now],
            )?;
            Ok(())
        })?)
    }

    /// Update the stored title for a URL without incrementing visit count.
    pub fn update_title(&self, url: &str, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Ok(());
        }

        Ok(self.db.with_connection(|conn| {
            conn.execute(
                "UPDATE history SET title = ?1 WHERE url = ?2",
                rusqlite::params![title, url],
            )?;
            Ok(())
        })?)
    }

    /// Entries whose URL or title contains `query`, visited at least
    /// `min_visits` times, most visited first.
    pub fn search(&self, query: &str, limit: usize, min_visits: i32) -> Result<Vec<HistoryEntry>> {
        Ok(self.db.with_connection(|conn| {
            let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

            let mut stmt = conn.prepare(
                "SELECT id, url, title, visited_at, visit_count FROM history
                 WHERE (LOWER(url) LIKE ?1 ESCAPE '\\' OR LOWER(title) LIKE ?1 ESCAPE '\\')
                   AND visit_count >= ?2
                 ORDER BY visit_count DESC, visited_at DESC
                 LIMIT ?3",
            )?;

            let entries: Vec<HistoryEntry> = stmt
                .query_map(
                    rusqlite::params![pattern, min_visits, limit as i64],
                    HistoryEntry::from_row,
                )?
                .filter_map(|r| r.ok())
                .collect();

            Ok(entries)
        })?)
    }

    /// Get recent history entries
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, title, visited_at, visit_count FROM history
                 ORDER BY visited_at DESC
                 LIMIT ?1",
            )?;

            let entries: Vec<HistoryEntry> = stmt
                .query_map([limit as i64], HistoryEntry::from_row)?
                .filter_map(|r| r.ok())
                .collect();

            Ok(entries)
        })?)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute("DELETE FROM history WHERE id = ?1", [id])?;
            Ok(())
        })?)
    }

    pub fn clear_all(&self) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute("DELETE FROM history", [])?;
            Ok(())
        })?)
    }

    /// Clear history within an optional time range (inclusive).
    pub fn clear_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let start = start.map(|t| t.to_rfc3339());
        let end = end.map(|t| t.to_rfc3339());

        Ok(self.db.with_connection(|conn| {
            conn.execute(
                "DELETE FROM history
                 WHERE (?1 IS NULL OR visited_at >= ?1)
                   AND (?2 IS NULL OR visited_at <= ?2)",
                rusqlite::params![start, end],
            )?;
            Ok(())
        })?)
    }
}

impl Clone for HistoryManager {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
