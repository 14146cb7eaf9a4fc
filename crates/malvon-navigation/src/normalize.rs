//! URL normalization applied before a URL is loaded or stored

use crate::canonical::CanonicalUrl;

/// Turns scheme-less address bar URLs into absolute `https` URLs.
///
/// Normalizing is idempotent: every value this returns either has both a
/// scheme and a host, or is a file/opaque URL, and those pass through.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fallback: CanonicalUrl,
}

impl Normalizer {
    /// `fallback` must carry both a scheme and a host.
    pub fn new(fallback: CanonicalUrl) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> &CanonicalUrl {
        &self.fallback
    }

    pub fn normalize(&self, url: CanonicalUrl) -> CanonicalUrl {
        if url.is_file() || url.has_scheme_and_host() || url.is_opaque() {
            return url;
        }

        let rebuilt = rebuild(&url);

        // An authority that was dropped leaves "https:///path", which the
        // WHATWG parser would silently read as host "path".
        if rebuilt.starts_with("https:///") {
            tracing::warn!(url = %url, rebuilt = %rebuilt, "Normalization lost the host, using fallback");
            return self.fallback.clone();
        }

        match CanonicalUrl::parse(&rebuilt) {
            Ok(normalized) if normalized.has_scheme_and_host() => normalized,
            Ok(normalized) => {
                tracing::warn!(url = %url, rebuilt = %normalized, "Normalized URL has no host, using fallback");
                self.fallback.clone()
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to re-parse normalized URL, using fallback");
                self.fallback.clone()
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CanonicalUrl::default_fallback())
    }
}

fn rebuild(url: &CanonicalUrl) -> String {
    let mut rebuilt = String::new();

    if url.scheme().is_none() {
        rebuilt.push_str("https://");
    }

    // Substring match: any host containing "www" is re-prefixed, others are
    // dropped from the rebuilt string.
    if let Some(host) = url.host() {
        if host.contains("www") {
            rebuilt.push_str("www.");
            rebuilt.push_str(host);
        }
    }

    rebuilt.push_str(url.path());

    // Separator is added here; a bare concatenation would fold the query
    // into the last path segment.
    if let Some(query) = url.query() {
        rebuilt.push('?');
        rebuilt.push_str(query);
    }

    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> CanonicalUrl {
        CanonicalUrl::parse(input).unwrap()
    }

    #[test]
    fn test_adds_https_scheme() {
        let normalizer = Normalizer::default();

        let url = normalizer.normalize(parse("www.example.com/page"));
        assert_eq!(url.scheme(), Some("https"));
        assert_eq!(url.host(), Some("www.example.com"));
        assert_eq!(url.as_str(), "https://www.example.com/page");

        let url = normalizer.normalize(parse("example.com/search?q=rust"));
        assert_eq!(url.as_str(), "https://example.com/search?q=rust");
    }

    #[test]
    fn test_query_keeps_separator() {
        let normalizer = Normalizer::default();

        let url = normalizer.normalize(parse("example.com?q=rust&lang=en"));
        assert_eq!(url.path(), "/");
        assert_eq!(url.query(), Some("q=rust&lang=en"));
        assert_eq!(url.as_str(), "https://example.com/?q=rust&lang=en");
    }

    #[test]
    fn test_passes_through_complete_urls() {
        let normalizer = Normalizer::default();
        for input in [
            "https://example.com/path?q=1",
            "http://localhost:8080/",
            "file:///tmp/index.html",
            "mailto:someone@example.com",
        ] {
            let url = parse(input);
            assert_eq!(normalizer.normalize(url.clone()), url);
        }
    }

    #[test]
    fn test_www_substring_host() {
        let normalizer = Normalizer::default();

        // Network-path reference with a www host gets the literal prefix
        let url = normalizer.normalize(parse("//www.example.com/a"));
        assert_eq!(url.host(), Some("www.www.example.com"));

        let url = normalizer.normalize(parse("//iwww.com/a"));
        assert_eq!(url.host(), Some("www.iwww.com"));
    }

    #[test]
    fn test_dropped_host_falls_back() {
        let normalizer = Normalizer::default();
        let url = normalizer.normalize(parse("//example.com/a"));
        assert_eq!(&url, normalizer.fallback());
    }

    #[test]
    fn test_idempotent() {
        let normalizer = Normalizer::new(parse("https://fallback.example/"));
        for input in [
            "example.com",
            "www.example.com/page",
            "localhost:8080/x?y=1",
            "192.168.0.1",
            "[::1]:8080",
            "//www.example.com/a",
            "//example.com/a",
            "https://example.com/path?q=1",
            "file:///tmp/a.html",
            "about:blank",
            "relative/path",
        ] {
            let once = normalizer.normalize(parse(input));
            let twice = normalizer.normalize(once.clone());
            assert_eq!(once, twice, "{input}");
        }
    }
}
