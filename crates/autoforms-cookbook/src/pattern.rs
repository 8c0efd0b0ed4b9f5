//! URL patterns for manual lookup.
//!
//! A pattern is `host/seg/seg...` with the scheme, query and fragment
//! stripped. Hosts with three or more labels tokenize as
//! `[subdomain, registrable-domain]`, so `*.example.com` is two tokens.
//! A `*` token matches exactly one token on the other side.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Single-segment wildcard.
pub const WILDCARD: &str = "*";

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("valid uuid regex")
});

static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid numeric regex"));

static LOCALE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]{2}([-_][a-zA-Z]{2})?$").expect("valid locale regex")
});

/// Host and path of a URL, normalized for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UrlParts {
    host: String,
    segments: Vec<String>,
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Manual split for inputs `Url` refuses (relative URLs, bare patterns).
fn split_loose(input: &str) -> UrlParts {
    let rest = match input.find("://") {
        Some(idx) => &input[idx + 3..],
        None => input,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let rest = &rest[..end];
    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    // Drop credentials and port.
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = match host.rfind(':') {
        Some(idx) if host[idx + 1..].chars().all(|c| c.is_ascii_digit()) => &host[..idx],
        _ => host,
    };
    UrlParts {
        host: host.to_ascii_lowercase(),
        segments: split_path(path),
    }
}

fn parse_parts(input: &str) -> UrlParts {
    let input = input.trim();
    match Url::parse(input) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => UrlParts {
                host: host.to_ascii_lowercase(),
                segments: split_path(parsed.path()),
            },
            None => split_loose(input),
        },
        Err(_) => split_loose(input),
    }
}

fn is_ip_literal(host: &str) -> bool {
    host.starts_with('[') || host.parse::<std::net::Ipv4Addr>().is_ok()
}

/// Split a host into one or two comparison tokens.
fn host_tokens(host: &str) -> Vec<String> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 || is_ip_literal(host) {
        return vec![host.to_string()];
    }
    let split = labels.len() - 2;
    vec![labels[..split].join("."), labels[split..].join(".")]
}

fn tokens(parts: &UrlParts) -> Vec<String> {
    let mut out = host_tokens(&parts.host);
    out.extend(parts.segments.iter().cloned());
    out
}

fn is_variable_segment(segment: &str) -> bool {
    UUID_SEGMENT.is_match(segment)
        || NUMERIC_SEGMENT.is_match(segment)
        || LOCALE_SEGMENT.is_match(segment)
}

/// Derive a reusable pattern from a concrete URL.
///
/// The subdomain of a host with three or more labels becomes `*`, as does
/// every path segment that looks like a UUID, a numeric id or a locale.
pub fn url_to_pattern(url: &str) -> String {
    let parts = parse_parts(url);

    let host = match host_tokens(&parts.host).as_slice() {
        [_, domain] => format!("{}.{}", WILDCARD, domain),
        _ => parts.host.clone(),
    };

    let mut pattern = host;
    for segment in &parts.segments {
        pattern.push('/');
        if is_variable_segment(segment) {
            pattern.push_str(WILDCARD);
        } else {
            pattern.push_str(segment);
        }
    }
    pattern
}

/// Whether `url` matches `pattern`, token by token.
pub fn url_matches_pattern(url: &str, pattern: &str) -> bool {
    let url_tokens = tokens(&parse_parts(url));
    let pattern_tokens = tokens(&split_loose(pattern));

    url_tokens.len() == pattern_tokens.len()
        && url_tokens
            .iter()
            .zip(&pattern_tokens)
            .all(|(u, p)| p == WILDCARD || u == p)
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
