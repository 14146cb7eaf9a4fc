//! Link detection for address bar input
//!
//! A string only counts as a link when the detected link spans the whole
//! input. `visit http://example.com now` contains a link but is not one.

use std::net::{IpAddr, Ipv4Addr};
use url::Url;

/// Check whether `input`, taken as a whole, is a link.
///
/// Recognized shapes:
/// - `scheme://host...` that parses with a non-empty host
/// - `mailto:user@domain.tld`
/// - bare hosts with optional port and path: `localhost`, IPv4 addresses,
///   bracketed IPv6 addresses and dotted domains with an alphabetic TLD
pub fn is_link(input: &str) -> bool {
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        return false;
    }

    if let Some((scheme, rest)) = input.split_once("://") {
        return is_scheme(scheme) && !rest.is_empty() && has_host(input);
    }

    if let Some(address) = strip_prefix_ignore_case(input, "mailto:") {
        return is_email(address);
    }

    let (authority, _) = split_host_and_rest(input);
    looks_like_host(authority)
}

fn is_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn has_host(input: &str) -> bool {
    Url::parse(input)
        .ok()
        .and_then(|url| url.host_str().map(|h| !h.is_empty()))
        .unwrap_or(false)
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&input[prefix.len()..])
    } else {
        None
    }
}

fn is_email(address: &str) -> bool {
    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };

    !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
        && is_domain(domain)
}

/// `authority` is everything before the first `/`, `?` or `#`.
fn looks_like_host(authority: &str) -> bool {
    let Some(host) = strip_port(authority) else {
        return false;
    };

    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return matches!(inner.parse::<IpAddr>(), Ok(IpAddr::V6(_)));
    }

    if host.parse::<Ipv4Addr>().is_ok() {
        return true;
    }

    is_domain(host)
}

/// Remove a trailing `:port`. Returns `None` when the port is malformed.
fn strip_port(authority: &str) -> Option<&str> {
    let (host, port) = if authority.starts_with('[') {
        let end = authority.find(']')?;
        let (host, rest) = authority.split_at(end + 1);
        match rest.strip_prefix(':') {
            Some(port) => (host, Some(port)),
            None if rest.is_empty() => (host, None),
            None => return None,
        }
    } else {
        match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    match port {
        Some(port) if port.parse::<u16>().is_err() => None,
        _ => Some(host),
    }
}

fn is_domain(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let valid_labels = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });

    let tld = labels[labels.len() - 1];
    let tld_len = tld.chars().count();

    valid_labels && (2..=63).contains(&tld_len) && tld.chars().all(char::is_alphabetic)
}

fn split_host_and_rest(input: &str) -> (&str, &str) {
    let cut = input.find(['/', '?', '#']).unwrap_or(input.len());
    input.split_at(cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_links() {
        assert!(is_link("https://example.com"));
        assert!(is_link("https://example.com/path?q=1"));
        assert!(is_link("http://localhost:3000/"));
        assert!(is_link("ftp://files.example.org/pub"));
        assert!(!is_link("https://"));
        assert!(!is_link("not a scheme://example.com"));
    }

    #[test]
    fn test_bare_domains() {
        assert!(is_link("example.com"));
        assert!(is_link("www.example.com/page"));
        assert!(is_link("docs.rs/url/latest?search=parse#top"));
        assert!(is_link("example.com:8080/admin"));
        assert!(!is_link("example"));
        assert!(!is_link("example.c"));
        assert!(!is_link("example.123"));
        assert!(!is_link("-bad.example.com"));
        assert!(!is_link("example..com"));
        assert!(!is_link("example.com:99999"));
    }

    #[test]
    fn test_hosts_and_addresses() {
        assert!(is_link("localhost"));
        assert!(is_link("localhost:8080"));
        assert!(is_link("192.168.1.1"));
        assert!(is_link("10.0.0.1:8443/status"));
        assert!(is_link("[::1]:8080"));
        assert!(!is_link("[example]"));
        assert!(!is_link("::1"));
    }

    #[test]
    fn test_mailto() {
        assert!(is_link("mailto:someone@example.com"));
        assert!(is_link("MAILTO:someone@example.com"));
        assert!(!is_link("mailto:nobody"));
    }

    #[test]
    fn test_match_must_cover_whole_input() {
        assert!(!is_link("visit http://example.com now"));
        assert!(!is_link("example.com search term"));
        assert!(!is_link("hello world"));
        assert!(!is_link(""));
    }
}
