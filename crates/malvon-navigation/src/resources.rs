//! Bundled pages reachable through `malvon?<name>`

use std::path::{Path, PathBuf};
use url::Url;

use crate::canonical::CanonicalUrl;

/// Source of internal pages shipped with the browser.
pub trait ResourceBundle: Send + Sync {
    /// Look up a bundled page by name (`history`, `settings`, ...).
    fn lookup(&self, name: &str) -> Option<CanonicalUrl>;
}

/// Bundle with no pages. Internal commands resolve to the fallback URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBundledResources;

impl ResourceBundle for NoBundledResources {
    fn lookup(&self, _name: &str) -> Option<CanonicalUrl> {
        None
    }
}

/// Pages stored as `<name>.html` files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ResourceBundle for DirectoryBundle {
    fn lookup(&self, name: &str) -> Option<CanonicalUrl> {
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        if !valid_name {
            tracing::debug!(name = %name, "Rejected bundled resource name");
            return None;
        }

        let path = self.root.join(format!("{}.html", name));
        if !path.is_file() {
            return None;
        }

        let absolute = path.canonicalize().ok()?;
        let url = Url::from_file_path(&absolute).ok()?;
        Some(CanonicalUrl::from_url(&url))
    }
}
