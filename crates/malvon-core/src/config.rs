//! Browser configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use malvon_navigation::{
    CanonicalUrl, InputResolver, DEFAULT_FALLBACK_URL, DEFAULT_MIN_OCCURRENCES,
    DEFAULT_SEARCH_TEMPLATE, DEFAULT_SUGGESTION_LIMIT, DEFAULT_VISIT_QUEUE_CAPACITY,
};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Search engine URL template
    pub search_engine: String,
    /// Destination when address bar input cannot be resolved
    pub fallback_url: String,
    /// Directory holding bundled `malvon?<name>` pages
    pub resources_dir: Option<PathBuf>,
    /// Pending visits kept before new ones are dropped
    pub visit_queue_capacity: usize,
    /// Maximum number of frequently typed URLs suggested
    pub suggestion_limit: usize,
    /// Minimum times a URL must be typed before it is suggested
    pub min_suggestion_occurrences: i64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("malvon.db"),
            search_engine: DEFAULT_SEARCH_TEMPLATE.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            resources_dir: None,
            visit_queue_capacity: DEFAULT_VISIT_QUEUE_CAPACITY,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            min_suggestion_occurrences: DEFAULT_MIN_OCCURRENCES,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Malvon"))
            .unwrap_or_else(|| PathBuf::from(".malvon"))
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;

        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        InputResolver::with_search_engine(self.search_engine.clone())?;

        let fallback = self.fallback()?;
        if !fallback.has_scheme_and_host() {
            return Err(CoreError::Config(format!(
                "fallback_url {} must be an absolute URL",
                self.fallback_url
            )));
        }

        if self.visit_queue_capacity == 0 {
            return Err(CoreError::Config(
                "visit_queue_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn fallback(&self) -> Result<CanonicalUrl> {
        Ok(CanonicalUrl::parse(&self.fallback_url)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new(PathBuf::from("/tmp/malvon"));
        config.validate().unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/malvon/malvon.db"));
        assert_eq!(config.fallback().unwrap().as_str(), "https://www.apple.com/");
        assert_eq!(config.suggestion_limit, DEFAULT_SUGGESTION_LIMIT);
        assert_eq!(config.min_suggestion_occurrences, DEFAULT_MIN_OCCURRENCES);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "search_engine": "https://duckduckgo.com/?q=%s", "suggestion_limit": 6 }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.search_engine, "https://duckduckgo.com/?q=%s");
        assert_eq!(config.suggestion_limit, 6);
        assert_eq!(config.fallback_url, DEFAULT_FALLBACK_URL);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = Config::new(PathBuf::from("/tmp/malvon"));
        config.search_engine = "https://duckduckgo.com/".to_string();
        assert!(matches!(config.validate(), Err(CoreError::Navigation(_))));

        let mut config = Config::new(PathBuf::from("/tmp/malvon"));
        config.fallback_url = "start.example".to_string();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let mut config = Config::new(PathBuf::from("/tmp/malvon"));
        config.visit_queue_capacity = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
