//! Parsed URL values handed to the content loader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::NavigationError;
use crate::Result;

/// Characters that can never appear in a URL string, even unescaped in a path.
const FORBIDDEN: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];

/// A URL value as typed or derived from address bar input.
///
/// Strings carrying a scheme are parsed by the WHATWG parser and keep its
/// serialization. Scheme-less strings such as `example.com/page` are kept as
/// relative references until the [`Normalizer`](crate::Normalizer) turns them
/// into absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalUrl {
    serialization: String,
    scheme: Option<String>,
    host: Option<String>,
    path: String,
    query: Option<String>,
}

impl CanonicalUrl {
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(NavigationError::MalformedUrl("empty input".to_string()));
        }
        validate_characters(input)?;

        if split_scheme(input).is_some() {
            let url = Url::parse(input)
                .map_err(|e| NavigationError::MalformedUrl(format!("{}: {}", input, e)))?;
            return Ok(Self::from_url(&url));
        }

        Ok(Self::relative(input))
    }

    pub fn from_url(url: &Url) -> Self {
        Self {
            serialization: url.as_str().to_string(),
            scheme: Some(url.scheme().to_string()),
            host: url
                .host_str()
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
        }
    }

    /// `https://www.apple.com/`, the destination used when nothing better
    /// can be produced.
    pub(crate) fn default_fallback() -> Self {
        Self {
            serialization: "https://www.apple.com/".to_string(),
            scheme: Some("https".to_string()),
            host: Some("www.apple.com".to_string()),
            path: "/".to_string(),
            query: None,
        }
    }

    fn relative(input: &str) -> Self {
        let (without_fragment, _) = split_off(input, '#');
        let (before_query, query) = split_off(without_fragment, '?');

        let (host, path) = match before_query.strip_prefix("//") {
            Some(rest) => {
                let cut = rest.find('/').unwrap_or(rest.len());
                let (authority, path) = rest.split_at(cut);
                (authority_host(authority), path)
            }
            None => (None, before_query),
        };

        Self {
            serialization: input.to_string(),
            scheme: None,
            host,
            path: path.to_string(),
            query: query.map(str::to_string),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.serialization
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_file(&self) -> bool {
        self.scheme() == Some("file")
    }

    /// True when both a non-empty scheme and a non-empty host are present.
    pub fn has_scheme_and_host(&self) -> bool {
        self.scheme().is_some_and(|s| !s.is_empty()) && self.host().is_some_and(|h| !h.is_empty())
    }

    /// Scheme-only URLs without an authority (`mailto:`, `about:`, `data:`).
    pub fn is_opaque(&self) -> bool {
        self.scheme.is_some() && self.host.is_none() && !self.is_file()
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialization)
    }
}

impl FromStr for CanonicalUrl {
    type Err = NavigationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CanonicalUrl {
    type Error = NavigationError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CanonicalUrl> for String {
    fn from(url: CanonicalUrl) -> Self {
        url.serialization
    }
}

fn validate_characters(input: &str) -> Result<()> {
    let bytes = input.as_bytes();

    for (idx, ch) in input.char_indices() {
        if ch.is_whitespace() || ch.is_control() {
            return Err(NavigationError::MalformedUrl(format!(
                "{:?} contains whitespace or control characters",
                input
            )));
        }

        if FORBIDDEN.contains(&ch) {
            return Err(NavigationError::MalformedUrl(format!(
                "{:?} contains illegal character {:?}",
                input, ch
            )));
        }

        if ch == '%' {
            let escape = bytes.get(idx + 1..idx + 3);
            let valid = escape.is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(NavigationError::MalformedUrl(format!(
                    "{:?} contains an invalid percent escape",
                    input
                )));
            }
        }
    }

    Ok(())
}

/// Return the scheme when `input` starts with one.
///
/// `host:port` forms (`localhost:8080/x`, `example.com:443`) are not treated
/// as schemes even though they are syntactically valid scheme names.
pub(crate) fn split_scheme(input: &str) -> Option<&str> {
    let (candidate, rest) = input.split_once(':')?;

    let mut chars = candidate.chars();
    let first_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = first_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return None;
    }

    if !rest.starts_with("//") {
        let port_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let port = &rest[..port_end];
        if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    Some(candidate)
}

fn split_off(input: &str, delimiter: char) -> (&str, Option<&str>) {
    match input.split_once(delimiter) {
        Some((head, tail)) => (head, Some(tail)),
        None => (input, None),
    }
}

fn authority_host(authority: &str) -> Option<String> {
    let without_user = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    let host = if without_user.starts_with('[') {
        match without_user.find(']') {
            Some(end) => &without_user[..=end],
            None => without_user,
        }
    } else {
        without_user.split(':').next().unwrap_or(without_user)
    };

    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
