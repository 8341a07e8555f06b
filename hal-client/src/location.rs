//! Representation locations and reference resolution

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

static NEXT_ANONYMOUS_ID: AtomicU64 = AtomicU64::new(1);

/// Where a representation lives.
///
/// `Anonymous` stands in for documents without a discoverable location
/// (typically embedded resources lacking a `self` link). Each anonymous
/// location is unique to the process and equal only to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Href(String),
    Anonymous(u64),
}

impl Location {
    pub fn href(href: impl Into<String>) -> Self {
        Location::Href(href.into())
    }

    /// Allocate a fresh anonymous location.
    pub fn anonymous() -> Self {
        Location::Anonymous(NEXT_ANONYMOUS_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Location::Anonymous(_))
    }

    pub fn as_href(&self) -> Option<&str> {
        match self {
            Location::Href(href) => Some(href),
            Location::Anonymous(_) => None,
        }
    }

    /// Resolve `reference` against this location.
    ///
    /// Anonymous locations contribute no base: the reference comes back
    /// verbatim. Absolute references are never rewritten.
    pub fn join(&self, reference: &str) -> String {
        match self {
            Location::Href(base) => resolve(base, reference),
            Location::Anonymous(_) => reference.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Href(href) => f.write_str(href),
            Location::Anonymous(id) => write!(f, "ANONYMOUS({id})"),
        }
    }
}

/// Returns true if the reference has an RFC 3986 scheme.
pub fn is_absolute(reference: &str) -> bool {
    match reference.find(':') {
        Some(colon) => {
            let scheme = &reference[..colon];
            !scheme.is_empty()
                && scheme.as_bytes()[0].is_ascii_alphabetic()
                && scheme
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
        }
        None => false,
    }
}

/// Resolve a (possibly templated) reference against a base URL.
///
/// URI-template expressions are swapped for inert placeholders while the
/// `url` crate does the resolution, so their braces are not percent-encoded.
pub fn resolve(base: &str, reference: &str) -> String {
    if is_absolute(reference) {
        return reference.to_string();
    }
    let Ok(base_url) = Url::parse(base) else {
        return reference.to_string();
    };

    let (masked, expressions) = mask_expressions(reference);
    match base_url.join(&masked) {
        Ok(joined) => unmask_expressions(joined.as_str(), &expressions),
        Err(_) => reference.to_string(),
    }
}

fn placeholder(idx: usize) -> String {
    format!("__uritemplate_expr_{idx}__")
}

fn mask_expressions(reference: &str) -> (String, Vec<String>) {
    let mut masked = String::with_capacity(reference.len());
    let mut expressions = Vec::new();
    let mut rest = reference;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        masked.push_str(&rest[..open]);
        masked.push_str(&placeholder(expressions.len()));
        expressions.push(rest[open..open + close + 1].to_string());
        rest = &rest[open + close + 1..];
    }
    masked.push_str(rest);
    (masked, expressions)
}

fn unmask_expressions(joined: &str, expressions: &[String]) -> String {
    expressions
        .iter()
        .enumerate()
        .fold(joined.to_string(), |acc, (idx, expr)| {
            acc.replacen(&placeholder(idx), expr, 1)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("http://example.com/"));
        assert!(is_absolute("urn:isbn:0451450523"));
        assert!(!is_absolute("/path"));
        assert!(!is_absolute("path/to/thing"));
        assert!(!is_absolute(""));
    }

    #[test]
    fn test_join_relative() {
        let base = Location::href("http://example.com/a/b");
        assert_eq!(base.join("c"), "http://example.com/a/c");
        assert_eq!(base.join("/root"), "http://example.com/root");
        assert_eq!(base.join("?q=1"), "http://example.com/a/b?q=1");
    }

    #[test]
    fn test_join_absolute_untouched() {
        let base = Location::href("http://example.com/");
        assert_eq!(
            base.join("http://other.example.com/x{?y}"),
            "http://other.example.com/x{?y}"
        );
    }

    #[test]
    fn test_join_preserves_template_expressions() {
        let base = Location::href("http://example.com/a/");
        assert_eq!(
            base.join("people{?name}"),
            "http://example.com/a/people{?name}"
        );
        assert_eq!(
            base.join("/things/{id}/parts{/part}"),
            "http://example.com/things/{id}/parts{/part}"
        );
    }

    #[test]
    fn test_anonymous_contributes_no_base() {
        let anon = Location::anonymous();
        assert_eq!(anon.join("path/to/href_1"), "path/to/href_1");
        assert_eq!(anon.join("http://example.com/"), "http://example.com/");
    }

    #[test]
    fn test_anonymous_identity() {
        let a = Location::anonymous();
        let b = Location::anonymous();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.to_string().starts_with("ANONYMOUS("));
    }
}
