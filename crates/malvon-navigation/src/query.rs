//! Address bar query classification

use serde::{Deserialize, Serialize};

use crate::detector::is_link;

/// Prefix of internal pages bundled with the browser (`malvon?history`).
pub const INTERNAL_COMMAND_PREFIX: &str = "malvon?";

/// Prefix of local file URLs.
pub const FILE_URL_PREFIX: &str = "file:///";

/// The shape of raw address bar input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifiedQuery {
    /// `malvon?<path>`; `path` is everything after the prefix
    InternalCommand { path: String },
    /// `file:///...`; `path` is the full input
    FileReference { path: String },
    /// A complete URL without whitespace
    DirectUrl { raw: String },
    /// Free text for the search engine
    SearchTerm { text: String },
}

/// Classify raw input. Every string, including the empty one, lands in
/// exactly one bucket; the first matching rule wins.
pub fn classify(input: &str) -> ClassifiedQuery {
    if let Some(path) = input.strip_prefix(INTERNAL_COMMAND_PREFIX) {
        return ClassifiedQuery::InternalCommand {
            path: path.to_string(),
        };
    }

    if input.starts_with(FILE_URL_PREFIX) {
        return ClassifiedQuery::FileReference {
            path: input.to_string(),
        };
    }

    if is_link(input) && !has_whitespace(input) {
        return ClassifiedQuery::DirectUrl {
            raw: input.to_string(),
        };
    }

    ClassifiedQuery::SearchTerm {
        text: input.to_string(),
    }
}

fn has_whitespace(input: &str) -> bool {
    input.chars().any(char::is_whitespace)
}
