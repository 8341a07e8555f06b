//! HAL document interpretation
//!
//! Turns a parsed JSON document into a [`Representation`]:
//!
//! 1. Every member other than `_links` and `_embedded` becomes a property.
//! 2. `_links` entries (except `curies`) become simple or templated links,
//!    with hrefs resolved against the document's location.
//! 3. `_embedded` entries are interpreted recursively into embedded links.
//!
//! Problems with individual entries are captured as malformed links rather
//! than failing the whole document. Only a non-object document, or `_links`/
//! `_embedded` members that are not objects, are fatal.

use crate::client::HalClient;
use crate::curie::CurieResolver;
use crate::error::{HalError, Result};
use crate::link::Link;
use crate::location::Location;
use crate::representation::Representation;
use crate::uri_template::UriTemplate;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::debug;

/// Reserved members that never become properties
pub const LINKS_KEY: &str = "_links";
pub const EMBEDDED_KEY: &str = "_embedded";
const CURIES_REL: &str = "curies";

/// Where an interpreted document lives
#[derive(Debug, Clone)]
pub struct InterpretOptions {
    /// Base for resolving relative references when the document has no
    /// location of its own
    pub base: Location,
    /// Authoritative location (e.g. the response's `Content-Location`);
    /// takes precedence over the document's `self` link
    pub content_location: Option<String>,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            base: Location::anonymous(),
            content_location: None,
        }
    }
}

/// Interpret `raw` with `base` as the fallback location.
pub fn interpret(raw: &JsonValue, base: &Location, client: &HalClient) -> Result<Representation> {
    let opts = InterpretOptions {
        base: base.clone(),
        content_location: None,
    };
    interpret_with_options(raw, &opts, client)
}

pub fn interpret_with_options(
    raw: &JsonValue,
    opts: &InterpretOptions,
    client: &HalClient,
) -> Result<Representation> {
    interpret_at(raw, opts, client, "")
}

/// Interpret the document found at JSON pointer `pointer`.
fn interpret_at(
    raw: &JsonValue,
    opts: &InterpretOptions,
    client: &HalClient,
    pointer: &str,
) -> Result<Representation> {
    let doc = raw
        .as_object()
        .ok_or_else(|| HalError::invalid(pointer, "document must be a JSON object"))?;

    let links_section = section(doc, LINKS_KEY, pointer)?;
    let embedded_section = section(doc, EMBEDDED_KEY, pointer)?;

    let curies = Arc::new(
        links_section
            .and_then(|links| links.get(CURIES_REL))
            .map(CurieResolver::from_section)
            .unwrap_or_default(),
    );

    let location = match (&opts.content_location, links_section.and_then(self_href)) {
        (Some(content_location), _) => Location::href(opts.base.join(content_location)),
        (None, Some(self_href)) => Location::href(opts.base.join(self_href)),
        (None, None) => Location::anonymous(),
    };
    let link_base = if location.is_anonymous() {
        opts.base.clone()
    } else {
        location.clone()
    };

    let mut links = Vec::new();
    if let Some(links_section) = links_section {
        extract_links(links_section, &link_base, &curies, client, pointer, &mut links);
    }
    if let Some(embedded_section) = embedded_section {
        extract_embedded(embedded_section, &link_base, &curies, client, pointer, &mut links);
    }

    Ok(Representation::from_parts(
        location,
        extract_properties(doc),
        links,
        curies,
        client.clone(),
    ))
}

/// Every member except the reserved sections, in document order.
pub fn extract_properties(doc: &Map<String, JsonValue>) -> Map<String, JsonValue> {
    doc.iter()
        .filter(|(key, _)| key.as_str() != LINKS_KEY && key.as_str() != EMBEDDED_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn section<'a>(
    doc: &'a Map<String, JsonValue>,
    key: &str,
    pointer: &str,
) -> Result<Option<&'a Map<String, JsonValue>>> {
    match doc.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(section)) => Ok(Some(section)),
        Some(_) => Err(HalError::invalid(
            format!("{pointer}/{key}"),
            format!("{key} must be an object"),
        )),
    }
}

fn self_href(links_section: &Map<String, JsonValue>) -> Option<&str> {
    fn href_of(entry: &JsonValue) -> Option<&str> {
        entry.get("href").and_then(JsonValue::as_str)
    }
    match links_section.get("self")? {
        JsonValue::Array(entries) => entries.iter().find_map(href_of),
        entry => href_of(entry),
    }
}

/// Entries of a relation with their JSON pointers; single entries are not
/// indexed.
fn entries<'a>(value: &'a JsonValue, rel_pointer: &str) -> Vec<(String, &'a JsonValue)> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| (format!("{rel_pointer}/{idx}"), item))
            .collect(),
        single => vec![(rel_pointer.to_string(), single)],
    }
}

fn extract_links(
    links_section: &Map<String, JsonValue>,
    base: &Location,
    curies: &Arc<CurieResolver>,
    client: &HalClient,
    pointer: &str,
    out: &mut Vec<Link>,
) {
    for (rel, value) in links_section {
        if rel == CURIES_REL {
            continue;
        }
        let rel_pointer = format!("{pointer}/{LINKS_KEY}/{}", escape_pointer(rel));

        for (entry_pointer, entry) in entries(value, &rel_pointer) {
            let malformed = |message: &str| {
                debug!(rel = %rel, path = %entry_pointer, reason = message, "malformed link");
                Link::malformed(
                    rel.as_str(),
                    entry_pointer.as_str(),
                    message,
                    entry.clone(),
                    false,
                    Arc::clone(curies),
                )
            };

            let Some(obj) = entry.as_object() else {
                out.push(malformed("link entry must be an object"));
                continue;
            };
            let href = match obj.get("href") {
                Some(JsonValue::Null) => continue,
                Some(JsonValue::String(href)) => base.join(href),
                Some(_) => {
                    out.push(malformed("href must be a string"));
                    continue;
                }
                None => {
                    out.push(malformed("link entry has no href"));
                    continue;
                }
            };
            let templated = obj
                .get("templated")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false);
            let attributes: Map<String, JsonValue> = obj
                .iter()
                .filter(|(key, _)| key.as_str() != "href" && key.as_str() != "templated")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            let link = if templated {
                Link::templated(
                    rel.as_str(),
                    UriTemplate::new(href),
                    client.clone(),
                    Arc::clone(curies),
                )
            } else {
                Link::simple(
                    rel.as_str(),
                    Representation::future(href, client.clone()),
                    Arc::clone(curies),
                )
            };
            out.push(link.with_attributes(attributes).with_written(obj.clone()));
        }
    }
}

fn extract_embedded(
    embedded_section: &Map<String, JsonValue>,
    base: &Location,
    curies: &Arc<CurieResolver>,
    client: &HalClient,
    pointer: &str,
    out: &mut Vec<Link>,
) {
    let nested_opts = InterpretOptions {
        base: base.clone(),
        content_location: None,
    };

    for (rel, value) in embedded_section {
        let rel_pointer = format!("{pointer}/{EMBEDDED_KEY}/{}", escape_pointer(rel));

        for (entry_pointer, entry) in entries(value, &rel_pointer) {
            let link = match interpret_at(entry, &nested_opts, client, &entry_pointer) {
                Ok(target) => Link::embedded(rel.as_str(), target, Arc::clone(curies)),
                Err(err) => {
                    debug!(rel = %rel, path = %entry_pointer, error = %err, "malformed embedded resource");
                    Link::malformed(
                        rel.as_str(),
                        entry_pointer.as_str(),
                        err.to_string(),
                        entry.clone(),
                        true,
                        Arc::clone(curies),
                    )
                }
            };
            out.push(link);
        }
    }
}

/// Escape a JSON pointer reference token (RFC 6901).
fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
