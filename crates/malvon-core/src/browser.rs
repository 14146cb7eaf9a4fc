//! Main browser state container
//!
//! Owns the database, the address bar resolver and the background runtime
//! that records visits. The active profile is passed to each resolution
//! explicitly.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use malvon_navigation::{
    BrowsingContext, CanonicalUrl, DirectoryBundle, HistoryEntry, HistoryManager, InputResolver,
    RemoteSuggestions, SearchOccurrenceStore, Suggestions, SuggestionsManager, VisitRecorder,
};
use malvon_storage::Database;

use crate::config::Config;
use crate::error::CoreError;
use crate::profile::{Profile, DEFAULT_PROFILE_NAME};
use crate::Result;

const SEARCH_ENGINE_SETTING: &str = "search_engine";
const ACTIVE_PROFILE_SETTING: &str = "active_profile";
const PROFILES_SETTING: &str = "profiles";

/// Runtime for visit recording and remote suggestion requests.
///
/// Shut down without blocking on drop, so the last `Browser` may be dropped
/// from inside another runtime.
struct BackgroundRuntime {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl BackgroundRuntime {
    fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("malvon-background")
            .enable_all()
            .build()?;

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }
}

impl Drop for BackgroundRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

pub struct Browser {
    config: Config,
    db: Database,
    occurrences: SearchOccurrenceStore,
    history_manager: HistoryManager,
    suggestions: SuggestionsManager,
    remote_suggestions: RemoteSuggestions,
    /// Input resolver for address bar
    input_resolver: Arc<RwLock<InputResolver>>,
    profiles: Arc<RwLock<Vec<Profile>>>,
    active_profile: Arc<RwLock<String>>,
    runtime: Arc<BackgroundRuntime>,
}

impl Browser {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    /// Build a browser over an already opened database.
    pub fn with_database(config: Config, db: Database) -> Result<Self> {
        let runtime = BackgroundRuntime::new()?;

        let occurrences = SearchOccurrenceStore::new(db.clone());
        let history_manager = HistoryManager::new(db.clone());
        let suggestions = SuggestionsManager::new(occurrences.clone(), history_manager.clone())
            .with_limits(config.suggestion_limit, config.min_suggestion_occurrences);

        // The worker is detached; it stops once the resolver is dropped.
        let (recorder, _worker) = VisitRecorder::spawn(
            Arc::new(occurrences.clone()),
            &runtime.handle,
            config.visit_queue_capacity,
        );

        let mut resolver = InputResolver::with_search_engine(config.search_engine.clone())?
            .with_fallback(config.fallback()?)?
            .with_visit_sink(Arc::new(recorder));

        if let Some(dir) = &config.resources_dir {
            resolver = resolver.with_resources(Arc::new(DirectoryBundle::new(dir)));
        }

        Ok(Self {
            config,
            db,
            occurrences,
            history_manager,
            suggestions,
            remote_suggestions: RemoteSuggestions::new()?,
            input_resolver: Arc::new(RwLock::new(resolver)),
            profiles: Arc::new(RwLock::new(vec![Profile::default(), Profile::private()])),
            active_profile: Arc::new(RwLock::new(DEFAULT_PROFILE_NAME.to_string())),
            runtime: Arc::new(runtime),
        })
    }

    /// Apply persisted settings and profiles.
    pub fn initialize(&self) -> Result<()> {
        if let Some(saved) = self.db.get_setting_json::<Vec<Profile>>(PROFILES_SETTING)? {
            let mut profiles = self.profiles.write();
            for profile in saved {
                if !profiles.iter().any(|p| p.name == profile.name) {
                    profiles.push(profile);
                }
            }
        }

        if let Some(template) = self.db.get_setting(SEARCH_ENGINE_SETTING)? {
            if let Err(e) = self.input_resolver.write().set_search_engine(template) {
                tracing::warn!(error = %e, "Ignoring persisted search engine");
            }
        }

        if let Some(name) = self.db.get_setting(ACTIVE_PROFILE_SETTING)? {
            if self.profile(&name).is_some() {
                *self.active_profile.write() = name;
            } else {
                tracing::warn!(profile = %name, "Persisted active profile no longer exists");
            }
        }

        let active = self.active_profile.read().clone();
        tracing::info!(profile = %active, "Browser initialized");

        Ok(())
    }

    // === Address bar ===

    /// Resolve address bar input for the active profile.
    pub fn resolve_query(&self, input: &str) -> CanonicalUrl {
        let profile = self.active_profile();
        self.resolve_query_in(input, Some(&profile))
    }

    /// Resolve address bar input for an explicit profile, or none.
    pub fn resolve_query_in(&self, input: &str, profile: Option<&Profile>) -> CanonicalUrl {
        let context = profile.map(|p| p as &dyn BrowsingContext);
        self.input_resolver.read().resolve(input, context)
    }

    pub fn try_resolve_query(&self, input: &str) -> Result<CanonicalUrl> {
        let profile = self.active_profile();
        Ok(self
            .input_resolver
            .read()
            .try_resolve(input, Some(&profile))?)
    }

    pub fn suggestions(&self, query: &str) -> Result<Suggestions> {
        Ok(self.suggestions.local(query)?)
    }

    /// Fetch search engine completions on the background runtime.
    pub fn spawn_remote_suggestions(&self, query: String) -> JoinHandle<Vec<String>> {
        let remote = self.remote_suggestions.clone();
        self.runtime
            .handle
            .spawn(async move { remote.fetch(&query).await })
    }

    /// How many times `url` was typed as a direct URL.
    pub fn occurrences(&self, url: &str) -> Result<i64> {
        Ok(self.occurrences.occurrences(url)?)
    }

    // === History ===

    /// Record a loaded page in history unless the active profile is private.
    pub fn record_page_visit(&self, url: &str, title: &str) -> Result<()> {
        if self.active_profile().is_private() {
            return Ok(());
        }

        Ok(self.history_manager.record_visit(url, title)?)
    }

    pub fn update_page_title(&self, url: &str, title: &str) -> Result<()> {
        if self.active_profile().is_private() {
            return Ok(());
        }

        Ok(self.history_manager.update_title(url, title)?)
    }

    pub fn search_history(&self, query: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self.history_manager.search(query, 20, 1)?)
    }

    pub fn recent_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.history_manager.recent(20)?)
    }

    pub fn clear_history_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<()> {
        Ok(self.history_manager.clear_range(start, end)?)
    }

    /// Forget typed URLs and history.
    pub fn clear_browsing_data(&self) -> Result<()> {
        self.occurrences.clear()?;
        self.history_manager.clear_all()?;
        tracing::info!("Cleared browsing data");
        Ok(())
    }

    // === Profiles ===

    pub fn active_profile(&self) -> Profile {
        let name = self.active_profile.read().clone();
        self.profile(&name).unwrap_or_default()
    }

    pub fn list_profiles(&self) -> Vec<Profile> {
        self.profiles.read().clone()
    }

    fn profile(&self, name: &str) -> Option<Profile> {
        self.profiles.read().iter().find(|p| p.name == name).cloned()
    }

    pub fn add_profile(&self, name: String) -> Result<Profile> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::Config("Profile name cannot be empty".to_string()));
        }

        let mut profiles = self.profiles.write();
        if profiles.iter().any(|p| p.name == name) {
            return Err(CoreError::Config(format!("Profile {} already exists", name)));
        }

        let profile = Profile::new(name);
        let mut updated = profiles.clone();
        updated.push(profile.clone());
        self.db.set_setting_json(PROFILES_SETTING, &updated)?;
        *profiles = updated;

        tracing::info!(profile = %profile.name, "Added profile");
        Ok(profile)
    }

    pub fn switch_profile(&self, name: &str) -> Result<Profile> {
        let profile = self
            .profile(name)
            .ok_or_else(|| CoreError::UnknownProfile(name.to_string()))?;

        *self.active_profile.write() = profile.name.clone();
        self.db.set_setting(ACTIVE_PROFILE_SETTING, &profile.name)?;

        tracing::info!(profile = %profile.name, private = profile.is_private(), "Switched profile");
        Ok(profile)
    }

    // === Settings ===

    pub fn get_search_engine(&self) -> String {
        self.input_resolver.read().search_template().to_string()
    }

    pub fn set_search_engine(&self, template: String) -> Result<()> {
        self.input_resolver
            .write()
            .set_search_engine(template.clone())?;
        self.db.set_setting(SEARCH_ENGINE_SETTING, &template)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for Browser {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            occurrences: self.occurrences.clone(),
            history_manager: self.history_manager.clone(),
            suggestions: self.suggestions.clone(),
            remote_suggestions: self.remote_suggestions.clone(),
            input_resolver: Arc::clone(&self.input_resolver),
            profiles: Arc::clone(&self.profiles),
            active_profile: Arc::clone(&self.active_profile),
            runtime: Arc::clone(&self.runtime),
        }
    }
}
