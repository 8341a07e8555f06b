//! Representations: the client-side value of one HAL document
//!
//! A [`Representation`] is either loaded (built by the interpreter, fully
//! indexed) or deferred (a [`RepresentationFuture`] that fetches on first
//! content access). Both forms share one API; location accessors, equality,
//! hashing and formatting never trigger a fetch.
//!
//! Clones share state, including the stale flag and any memoized fetches.
//! Use [`Representation::fork`] to get an independent copy for another
//! thread of work.

use crate::client::HalClient;
use crate::collection::Collection;
use crate::curie::CurieResolver;
use crate::error::{HalError, Result};
use crate::form::Form;
use crate::future::RepresentationFuture;
use crate::link::{Link, LinkKind, RawHref};
use crate::location::Location;
use crate::representation_set::RepresentationSet;
use crate::transport::{Headers, Verb};
use crate::uri_template::TemplateVars;
use serde_json::{Map, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Result of a combined property/relation lookup
#[derive(Debug, Clone)]
pub enum Item {
    Property(JsonValue),
    Related(RepresentationSet),
}

impl Item {
    pub fn as_property(&self) -> Option<&JsonValue> {
        match self {
            Item::Property(value) => Some(value),
            Item::Related(_) => None,
        }
    }

    pub fn as_related(&self) -> Option<&RepresentationSet> {
        match self {
            Item::Related(set) => Some(set),
            Item::Property(_) => None,
        }
    }
}

/// Interpreted document content
struct Content {
    properties: Arc<Map<String, JsonValue>>,
    links: Vec<Link>,
    /// Literal and fully qualified relation -> positions in `links`
    by_rel: HashMap<String, Vec<usize>>,
    curies: Arc<CurieResolver>,
}

impl Content {
    fn new(
        properties: Arc<Map<String, JsonValue>>,
        links: Vec<Link>,
        curies: Arc<CurieResolver>,
    ) -> Self {
        let mut by_rel: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, link) in links.iter().enumerate() {
            let literal = link.literal_rel().to_string();
            let qualified = link.fully_qualified_rel();
            if qualified != literal {
                by_rel.entry(qualified).or_default().push(idx);
            }
            by_rel.entry(literal).or_default().push(idx);
        }
        Self {
            properties,
            links,
            by_rel,
            curies,
        }
    }

    fn links_for(&self, rel: &str) -> impl Iterator<Item = &Link> {
        self.by_rel
            .get(rel)
            .into_iter()
            .flatten()
            .map(|&idx| &self.links[idx])
    }

    /// Well-formed links for `rel`. Malformed entries are skipped; if every
    /// match is malformed the first one's error is returned.
    fn usable_links(&self, rel: &str) -> Result<Vec<&Link>> {
        let mut usable = Vec::new();
        let mut first_error = None;
        for link in self.links_for(rel) {
            match link.raw_href() {
                Ok(_) => usable.push(link),
                Err(err) => {
                    debug!(rel = %rel, error = %err, "skipping malformed link");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) if usable.is_empty() => Err(err),
            None if usable.is_empty() => Err(HalError::KeyNotFound(rel.to_string())),
            _ => Ok(usable),
        }
    }

    fn fork(&self) -> Self {
        Self::new(
            Arc::clone(&self.properties),
            self.links.iter().map(Link::fork).collect(),
            Arc::clone(&self.curies),
        )
    }
}

enum Body {
    Loaded(Arc<Content>),
    Deferred(RepresentationFuture),
}

struct Inner {
    location: Location,
    client: HalClient,
    stale: AtomicBool,
    body: Body,
}

/// One HAL document: properties plus indexed links
#[derive(Clone)]
pub struct Representation {
    inner: Arc<Inner>,
}

impl Representation {
    /// Build a loaded representation from interpreted parts.
    pub fn from_parts(
        location: Location,
        properties: Map<String, JsonValue>,
        links: Vec<Link>,
        curies: Arc<CurieResolver>,
        client: HalClient,
    ) -> Self {
        let content = Content::new(Arc::new(properties), links, curies);
        Self::with_body(location, client, Body::Loaded(Arc::new(content)))
    }

    /// A reference to the document at `url` that is fetched on first use.
    pub fn future(url: impl Into<String>, client: HalClient) -> Self {
        let url = url.into();
        let future = RepresentationFuture::new(url.clone(), client.clone());
        Self::with_body(Location::Href(url), client, Body::Deferred(future))
    }

    fn with_body(location: Location, client: HalClient, body: Body) -> Self {
        Self {
            inner: Arc::new(Inner {
                location,
                client,
                stale: AtomicBool::new(false),
                body,
            }),
        }
    }

    pub fn location(&self) -> &Location {
        &self.inner.location
    }

    /// The URL of this representation, `None` if anonymous.
    pub fn href(&self) -> Option<&str> {
        self.inner.location.as_href()
    }

    pub fn client(&self) -> &HalClient {
        &self.inner.client
    }

    /// False only for a future whose fetch has not been attempted.
    pub fn is_reified(&self) -> bool {
        match &self.inner.body {
            Body::Loaded(_) => true,
            Body::Deferred(future) => future.is_reified(),
        }
    }

    /// True after a write through this instance.
    pub fn is_stale(&self) -> bool {
        self.inner.stale.load(Ordering::Acquire)
    }

    fn ensure_fresh(&self) -> Result<()> {
        if self.is_stale() {
            return Err(HalError::Stale {
                location: self.inner.location.to_string(),
            });
        }
        Ok(())
    }

    fn content(&self) -> Result<Arc<Content>> {
        self.ensure_fresh()?;
        match &self.inner.body {
            Body::Loaded(content) => Ok(Arc::clone(content)),
            Body::Deferred(future) => future.resolve()?.content(),
        }
    }

    // ---------------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------------

    /// The property `name`; [`HalError::KeyNotFound`] if absent.
    pub fn property(&self, name: &str) -> Result<JsonValue> {
        self.content()?
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| HalError::KeyNotFound(name.to_string()))
    }

    pub fn property_or(&self, name: &str, default: JsonValue) -> Result<JsonValue> {
        self.property_or_else(name, |_| default)
    }

    pub fn property_or_else<F>(&self, name: &str, default: F) -> Result<JsonValue>
    where
        F: FnOnce(&str) -> JsonValue,
    {
        Ok(self
            .content()?
            .properties
            .get(name)
            .cloned()
            .unwrap_or_else(|| default(name)))
    }

    pub fn has_property(&self, name: &str) -> Result<bool> {
        Ok(self.content()?.properties.contains_key(name))
    }

    /// All properties, in document order.
    pub fn properties(&self) -> Result<Map<String, JsonValue>> {
        Ok(self.content()?.properties.as_ref().clone())
    }

    // ---------------------------------------------------------------------
    // Links and relations
    // ---------------------------------------------------------------------

    /// Every link, in document order (direct links before embeds).
    pub fn links(&self) -> Result<Vec<Link>> {
        Ok(self.content()?.links.clone())
    }

    pub fn all_links(&self) -> Result<HashSet<Link>> {
        Ok(self.content()?.links.iter().cloned().collect())
    }

    /// Links whose relation matches `rel`, literally or fully qualified.
    pub fn links_for(&self, rel: &str) -> Result<Vec<Link>> {
        Ok(self.content()?.links_for(rel).cloned().collect())
    }

    pub fn curie_resolver(&self) -> Result<Arc<CurieResolver>> {
        Ok(Arc::clone(&self.content()?.curies))
    }

    /// True if any link (malformed ones included) has relation `rel`.
    pub fn has_related(&self, rel: &str) -> Result<bool> {
        Ok(self.content()?.links_for(rel).next().is_some())
    }

    /// Targets of every well-formed link with relation `rel`.
    ///
    /// Malformed entries are skipped; the call fails with
    /// [`HalError::InvalidRepresentation`] only when nothing else matches.
    pub fn related(&self, rel: &str) -> Result<RepresentationSet> {
        self.related_with(rel, &TemplateVars::new())
    }

    /// Like [`Representation::related`], expanding templated links with
    /// `vars`.
    pub fn related_with(&self, rel: &str, vars: &TemplateVars) -> Result<RepresentationSet> {
        let content = self.content()?;
        content
            .usable_links(rel)?
            .into_iter()
            .map(|link| link.target(vars))
            .collect::<Result<Vec<_>>>()
            .map(RepresentationSet::new)
    }

    /// Like [`Representation::related_with`], but a missing relation yields
    /// `default(rel)` instead of an error.
    pub fn related_or_else<F>(
        &self,
        rel: &str,
        vars: &TemplateVars,
        default: F,
    ) -> Result<RepresentationSet>
    where
        F: FnOnce(&str) -> RepresentationSet,
    {
        match self.related_with(rel, vars) {
            Err(HalError::KeyNotFound(_)) => Ok(default(rel)),
            other => other,
        }
    }

    /// Target locations of the `rel` links, templates expanded with `vars`.
    pub fn related_hrefs(&self, rel: &str, vars: &TemplateVars) -> Result<Vec<Location>> {
        let content = self.content()?;
        content
            .usable_links(rel)?
            .into_iter()
            .map(|link| link.target_url(vars))
            .collect()
    }

    /// Unexpanded hrefs of the `rel` links.
    pub fn raw_related_hrefs(&self, rel: &str) -> Result<Vec<RawHref>> {
        let content = self.content()?;
        content
            .usable_links(rel)?
            .into_iter()
            .map(Link::raw_href)
            .collect()
    }

    // ---------------------------------------------------------------------
    // Combined lookup
    // ---------------------------------------------------------------------

    /// Property `key`, falling back to the relation `key`.
    pub fn fetch(&self, key: &str) -> Result<Item> {
        self.get(key)?
            .ok_or_else(|| HalError::KeyNotFound(key.to_string()))
    }

    pub fn fetch_or(&self, key: &str, default: Item) -> Result<Item> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Non-raising form of [`Representation::fetch`].
    pub fn get(&self, key: &str) -> Result<Option<Item>> {
        if let Some(value) = self.content()?.properties.get(key) {
            return Ok(Some(Item::Property(value.clone())));
        }
        match self.related(key) {
            Ok(set) => Ok(Some(Item::Related(set))),
            Err(HalError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    // ---------------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------------

    /// Rebuild a HAL document from properties, links and embeds.
    ///
    /// Relations with a single entry serialize as a single object; empty
    /// `_links`/`_embedded` sections are omitted.
    pub fn raw(&self) -> Result<JsonValue> {
        let content = self.content()?;
        let mut doc = content.properties.as_ref().clone();
        let mut links_section = Map::new();
        let mut embedded_section = Map::new();

        if !content.curies.is_empty() {
            links_section.insert("curies".to_string(), content.curies.to_section());
        }

        for link in &content.links {
            let (section, entry) = match link.kind() {
                LinkKind::Simple {
                    target,
                    embedded: true,
                } => (&mut embedded_section, target.raw()?),
                LinkKind::Malformed { raw, embedded, .. } => {
                    let section = if *embedded {
                        &mut embedded_section
                    } else {
                        &mut links_section
                    };
                    (section, raw.clone())
                }
                _ => (&mut links_section, link.to_link_object()?),
            };
            push_entry(section, link.literal_rel(), entry);
        }

        if !links_section.is_empty() {
            doc.insert("_links".to_string(), JsonValue::Object(links_section));
        }
        if !embedded_section.is_empty() {
            doc.insert("_embedded".to_string(), JsonValue::Object(embedded_section));
        }
        Ok(JsonValue::Object(doc))
    }

    /// [`Representation::raw`] as a JSON string.
    pub fn to_hal(&self) -> Result<String> {
        Ok(self.raw()?.to_string())
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    pub fn post(&self, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Post, Some(body), headers)
    }

    pub fn put(&self, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Put, Some(body), headers)
    }

    pub fn patch(&self, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Patch, Some(body), headers)
    }

    pub fn delete(&self, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Delete, None, headers)
    }

    /// Write to this representation's URL and mark this instance stale.
    fn write(
        &self,
        verb: Verb,
        body: Option<&JsonValue>,
        headers: &Headers,
    ) -> Result<Representation> {
        self.ensure_fresh()?;
        let href = self.href().ok_or_else(|| {
            HalError::Argument(format!(
                "cannot {verb} to anonymous representation {}",
                self.inner.location
            ))
        })?;

        let response = self.inner.client.write(verb, href, body, headers)?;
        self.inner.stale.store(true, Ordering::Release);
        debug!(url = %href, verb = %verb, "representation marked stale");
        Ok(response)
    }

    // ---------------------------------------------------------------------
    // Misc
    // ---------------------------------------------------------------------

    /// Independent copy: memoized fetches are duplicated, document data is
    /// shared.
    pub fn fork(&self) -> Representation {
        let body = match &self.inner.body {
            Body::Loaded(content) => Body::Loaded(Arc::new(content.fork())),
            Body::Deferred(future) => Body::Deferred(future.fork()),
        };
        let forked = Self::with_body(self.inner.location.clone(), self.inner.client.clone(), body);
        forked.inner.stale.store(self.is_stale(), Ordering::Release);
        forked
    }

    /// The HAL-FORMS form named `name` from the `_forms` property.
    pub fn form(&self, name: &str) -> Result<Form> {
        let forms = self.property("_forms")?;
        let form = forms
            .get(name)
            .ok_or_else(|| HalError::KeyNotFound(format!("_forms.{name}")))?;
        Form::from_json(form, self.inner.client.clone())
    }

    /// Treat this representation as the first page of a collection.
    pub fn into_collection(self) -> Result<Collection> {
        Collection::new(self)
    }
}

/// Add `entry` under `rel`, promoting a single entry to an array.
fn push_entry(section: &mut Map<String, JsonValue>, rel: &str, entry: JsonValue) {
    match section.get_mut(rel) {
        None => {
            section.insert(rel.to_string(), entry);
        }
        Some(JsonValue::Array(entries)) => entries.push(entry),
        Some(existing) => {
            let first = existing.take();
            *existing = JsonValue::Array(vec![first, entry]);
        }
    }
}

impl PartialEq for Representation {
    fn eq(&self, other: &Self) -> bool {
        self.inner.location == other.inner.location
    }
}

impl Eq for Representation {}

impl Hash for Representation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.location.hash(state);
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Representation: {}>", self.inner.location)?;
        if !self.is_reified() {
            f.write_str(" (unreified)")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Representation");
        dbg.field("location", &self.inner.location);
        match &self.inner.body {
            Body::Loaded(content) => {
                dbg.field("properties", &content.properties.len())
                    .field("links", &content.links.len());
            }
            Body::Deferred(future) => {
                dbg.field("future", future);
            }
        }
        dbg.field("stale", &self.is_stale()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::interpret;
    use crate::transport::MemoryTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn memory() -> Arc<MemoryTransport> {
        Arc::new(
            MemoryTransport::new()
                .with_resource("http://example.com/author", json!({"name": "Bob"})),
        )
    }

    fn doc() -> JsonValue {
        json!({
            "title": "A post",
            "age": 10,
            "_links": {
                "self": {"href": "http://example.com/post"},
                "author": {"href": "http://example.com/author"},
                "search": {"href": "http://example.com/search{?q}", "templated": true}
            },
            "_embedded": {
                "comment": [
                    {"body": "first", "_links": {"self": {"href": "http://example.com/c/1"}}},
                    {"body": "second"}
                ]
            }
        })
    }

    fn repr(transport: &Arc<MemoryTransport>) -> Representation {
        let client = HalClient::from_arc(transport.clone());
        interpret(&doc(), &Location::anonymous(), &client).unwrap()
    }

    #[test]
    fn test_properties() {
        let r = repr(&memory());
        assert_eq!(r.property("title").unwrap(), json!("A post"));
        assert!(r.has_property("age").unwrap());
        assert!(!r.has_property("_links").unwrap());
        assert!(matches!(r.property("nope"), Err(HalError::KeyNotFound(_))));
        assert_eq!(r.property_or("nope", json!(1)).unwrap(), json!(1));
        assert_eq!(
            r.property_or_else("nope", |name| json!(name)).unwrap(),
            json!("nope")
        );
        let keys: Vec<_> = r.properties().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["title", "age"]);
    }

    #[test]
    fn test_location_from_self_link() {
        let r = repr(&memory());
        assert_eq!(r.href(), Some("http://example.com/post"));
    }

    #[test]
    fn test_related_lazy_and_embedded() {
        let transport = memory();
        let r = repr(&transport);

        let authors = r.related("author").unwrap();
        assert_eq!(transport.total_fetches(), 0);
        assert_eq!(
            authors.first().unwrap().property("name").unwrap(),
            json!("Bob")
        );

        let comments = r.related("comment").unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(transport.total_fetches(), 1);
    }

    #[test]
    fn test_related_missing_and_default() {
        let r = repr(&memory());
        assert!(matches!(r.related("nope"), Err(HalError::KeyNotFound(_))));
        assert!(!r.has_related("nope").unwrap());
        let set = r
            .related_or_else("nope", &TemplateVars::new(), |_| RepresentationSet::default())
            .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_related_hrefs() {
        let r = repr(&memory());
        let vars = TemplateVars::new().with("q", "hal");
        assert_eq!(
            r.related_hrefs("search", &vars).unwrap(),
            vec![Location::href("http://example.com/search?q=hal")]
        );
        assert_eq!(
            r.raw_related_hrefs("search").unwrap()[0].to_string(),
            "http://example.com/search{?q}"
        );
        assert!(r.related_hrefs("nope", &vars).is_err());
    }

    #[test]
    fn test_fetch_and_get() {
        let r = repr(&memory());
        assert!(matches!(r.fetch("title").unwrap(), Item::Property(_)));
        assert!(matches!(r.fetch("author").unwrap(), Item::Related(_)));
        assert!(r.get("nope").unwrap().is_none());
        assert!(matches!(r.fetch("nope"), Err(HalError::KeyNotFound(_))));
        let fallback = r.fetch_or("nope", Item::Property(json!(0))).unwrap();
        assert_eq!(fallback.as_property(), Some(&json!(0)));
    }

    #[test]
    fn test_raw_round_trip() {
        let r = repr(&memory());
        assert_eq!(r.raw().unwrap(), doc());
    }

    #[test]
    fn test_write_marks_stale() {
        let transport = memory();
        let r = repr(&transport);

        let fresh = r.put(&json!({"title": "new"}), &Headers::new()).unwrap();
        assert!(r.is_stale());
        assert!(!fresh.is_stale());
        assert!(matches!(r.property("title"), Err(HalError::Stale { .. })));
        assert!(matches!(r.related("author"), Err(HalError::Stale { .. })));
        assert!(matches!(r.properties(), Err(HalError::Stale { .. })));

        let writes = transport.writes();
        assert_eq!(writes[0].verb, Verb::Put);
        assert_eq!(writes[0].url, "http://example.com/post");
    }

    #[test]
    fn test_write_to_anonymous_fails() {
        let client = HalClient::new(MemoryTransport::new());
        let r = interpret(&json!({"a": 1}), &Location::anonymous(), &client).unwrap();
        assert!(matches!(
            r.post(&json!({}), &Headers::new()),
            Err(HalError::Argument(_))
        ));
        assert!(!r.is_stale());
    }

    #[test]
    fn test_display_never_fetches() {
        let transport = memory();
        let client = HalClient::from_arc(transport.clone());
        let r = Representation::future("http://example.com/author", client);

        assert_eq!(
            r.to_string(),
            "#<Representation: http://example.com/author> (unreified)"
        );
        let _ = format!("{r:?}");
        assert_eq!(transport.total_fetches(), 0);

        r.property("name").unwrap();
        assert_eq!(r.to_string(), "#<Representation: http://example.com/author>");
    }

    #[test]
    fn test_equality_by_location() {
        let client = HalClient::new(MemoryTransport::new());
        let a = Representation::future("http://example.com/a", client.clone());
        let b = Representation::future("http://example.com/a", client.clone());
        assert_eq!(a, b);

        let anon_1 = interpret(&json!({}), &Location::anonymous(), &client).unwrap();
        let anon_2 = interpret(&json!({}), &Location::anonymous(), &client).unwrap();
        assert_ne!(anon_1, anon_2);
        assert_eq!(anon_1, anon_1.clone());
    }

    #[test]
    fn test_fork_has_independent_cache() {
        let transport = memory();
        let r = repr(&transport);
        let forked = r.fork();

        r.related("author").unwrap().first().unwrap().property("name").unwrap();
        forked
            .related("author")
            .unwrap()
            .first()
            .unwrap()
            .property("name")
            .unwrap();
        assert_eq!(transport.fetch_count("http://example.com/author"), 2);
    }
}
