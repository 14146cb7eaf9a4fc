//! Browsing profiles

use serde::{Deserialize, Serialize};

use malvon_navigation::BrowsingContext;

/// Name of the built-in private profile.
pub const PRIVATE_PROFILE_NAME: &str = "Private";
pub const DEFAULT_PROFILE_NAME: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn private() -> Self {
        Self::new(PRIVATE_PROFILE_NAME)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_NAME)
    }
}

/// Privacy follows the name: the profile called "Private" never records.
impl BrowsingContext for Profile {
    fn is_private(&self) -> bool {
        self.name == PRIVATE_PROFILE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_by_name() {
        assert!(Profile::private().is_private());
        assert!(Profile::new("Private").is_private());
        assert!(!Profile::new("private").is_private());
        assert!(!Profile::default().is_private());
    }

    #[test]
    fn test_privacy_cannot_be_overridden_by_data() {
        let profile: Profile =
            serde_json::from_str(r#"{ "name": "Private", "private": false }"#).unwrap();
        assert!(profile.is_private());

        let profile: Profile =
            serde_json::from_str(r#"{ "name": "Work", "private": true }"#).unwrap();
        assert!(!profile.is_private());
    }
}
