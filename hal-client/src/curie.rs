//! CURIE expansion for link relations
//!
//! A HAL document may declare namespaces in `_links.curies`:
//!
//! ```json
//! { "_links": { "curies": [{ "name": "ex", "href": "http://example.com/rels/{rel}", "templated": true }] } }
//! ```
//!
//! after which `ex:widgets` and `http://example.com/rels/widgets` name the
//! same relation.

use crate::uri_template::{TemplateVars, UriTemplate};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::debug;

/// Expands `prefix:suffix` relations using a document's curie definitions.
#[derive(Debug, Clone, Default)]
pub struct CurieResolver {
    namespaces: HashMap<String, UriTemplate>,
    /// Definitions as written, kept for serialization
    definitions: Vec<JsonValue>,
    /// Declared as a bare object rather than an array
    single: bool,
}

impl CurieResolver {
    /// Build a resolver from a list of curie definition link objects.
    ///
    /// Definitions lacking a string `name` or `href` are ignored.
    pub fn new(curie_defs: &[JsonValue]) -> Self {
        let mut namespaces = HashMap::new();

        for def in curie_defs {
            let name = def.get("name").and_then(JsonValue::as_str);
            let href = def.get("href").and_then(JsonValue::as_str);
            match (name, href) {
                (Some(name), Some(href)) => {
                    namespaces.insert(name.to_string(), UriTemplate::new(href));
                }
                _ => debug!(definition = %def, "ignoring incomplete curie definition"),
            }
        }

        Self {
            namespaces,
            definitions: curie_defs.to_vec(),
            single: false,
        }
    }

    /// Build a resolver from the value of a `curies` entry, which may be a
    /// single definition or an array of them.
    pub fn from_section(section: &JsonValue) -> Self {
        match section {
            JsonValue::Array(defs) => Self::new(defs),
            JsonValue::Null => Self::default(),
            single => Self {
                single: true,
                ..Self::new(std::slice::from_ref(single))
            },
        }
    }

    /// The `curies` entry in the shape it was declared in.
    pub fn to_section(&self) -> JsonValue {
        match self.definitions.as_slice() {
            [only] if self.single => only.clone(),
            defs => JsonValue::Array(defs.to_vec()),
        }
    }

    /// Expand `rel` when it is a curie in a known namespace, otherwise
    /// return it unchanged.
    pub fn resolve(&self, rel: &str) -> String {
        match split_curie(rel) {
            Some((ns, short_name)) => match self.namespaces.get(ns) {
                Some(template) => template.expand(&TemplateVars::new().with("rel", short_name)),
                None => rel.to_string(),
            },
            None => rel.to_string(),
        }
    }

    /// Namespace prefixes this resolver knows about.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> &[JsonValue] {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Split `ns:short_name`; both parts must be non-empty and `ns` has no colon.
fn split_curie(rel: &str) -> Option<(&str, &str)> {
    let (ns, short_name) = rel.split_once(':')?;
    if ns.is_empty() || short_name.is_empty() {
        return None;
    }
    Some((ns, short_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> CurieResolver {
        CurieResolver::new(&[
            json!({"name": "ex", "href": "http://example.com/rels/{rel}", "templated": true}),
            json!({"name": "foo", "href": "http://example.com/foo/{rel}", "templated": true}),
        ])
    }

    #[test]
    fn test_resolves_known_namespaces() {
        let r = resolver();
        assert_eq!(r.resolve("ex:thing"), "http://example.com/rels/thing");
        assert_eq!(r.resolve("foo:bar"), "http://example.com/foo/bar");
    }

    #[test]
    fn test_passes_through_non_curies() {
        let r = resolver();
        assert_eq!(r.resolve("self"), "self");
        assert_eq!(r.resolve("unknown:thing"), "unknown:thing");
        assert_eq!(
            r.resolve("http://example.com/rels/thing"),
            "http://example.com/rels/thing"
        );
        assert_eq!(r.resolve("ex:"), "ex:");
    }

    #[test]
    fn test_single_definition_section() {
        let r = CurieResolver::from_section(
            &json!({"name": "ex", "href": "http://example.com/rels/{rel}", "templated": true}),
        );
        assert_eq!(r.resolve("ex:thing"), "http://example.com/rels/thing");
        assert_eq!(r.definitions().len(), 1);
        assert!(r.to_section().is_object());
    }

    #[test]
    fn test_array_section_stays_an_array() {
        let section = json!([{"name": "ex", "href": "http://example.com/rels/{rel}"}]);
        assert_eq!(CurieResolver::from_section(&section).to_section(), section);
    }

    #[test]
    fn test_empty_resolver() {
        let r = CurieResolver::new(&[]);
        assert!(r.is_empty());
        assert_eq!(r.resolve("ex:thing"), "ex:thing");
    }

    #[test]
    fn test_incomplete_definition_ignored() {
        let r = CurieResolver::new(&[json!({"name": "ex"})]);
        assert_eq!(r.resolve("ex:thing"), "ex:thing");
    }
}
