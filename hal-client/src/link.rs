//! Links: one navigable relation of a representation
//!
//! A [`Link`] is a tagged variant over [`LinkKind`]:
//! - `Simple`: points at a (possibly not yet fetched) [`Representation`];
//!   `embedded` links carry their target inline.
//! - `Templated`: a URI Template that must be expanded before use.
//! - `Malformed`: an entry that could not be interpreted. Building one never
//!   fails; using it (`target`, `target_url`, `raw_href`) returns
//!   [`HalError::InvalidRepresentation`] with the entry's JSON pointer.
//!
//! Equality and hashing only consider the fully qualified relation, the raw
//! href and the templated flag, never target identity. Links to anonymous
//! targets compare by the target's anonymous identity, so two different
//! anonymous embeds are never equal.

use crate::client::HalClient;
use crate::curie::CurieResolver;
use crate::error::{HalError, Result};
use crate::location::Location;
use crate::representation::Representation;
use crate::uri_template::{TemplateVars, UriTemplate};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The variant-specific part of a link
#[derive(Clone)]
pub enum LinkKind {
    Simple {
        target: Representation,
        embedded: bool,
    },
    Templated {
        template: UriTemplate,
        client: HalClient,
    },
    Malformed {
        /// JSON pointer to the offending entry
        path: String,
        message: String,
        /// The entry as it appeared in the document
        raw: JsonValue,
        embedded: bool,
    },
}

/// Unexpanded href of a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawHref {
    Url(Location),
    Template(UriTemplate),
}

impl fmt::Display for RawHref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawHref::Url(location) => write!(f, "{location}"),
            RawHref::Template(template) => write!(f, "{template}"),
        }
    }
}

/// One relation from a representation to a target
#[derive(Clone)]
pub struct Link {
    literal_rel: String,
    curie_resolver: Arc<CurieResolver>,
    kind: LinkKind,
    /// Extra link-object members (`title`, `name`, `type`, ...)
    attributes: Map<String, JsonValue>,
    /// The link object as written in the document, href unresolved
    written: Option<Map<String, JsonValue>>,
}

impl Link {
    fn with_kind(rel: impl Into<String>, kind: LinkKind, curies: Arc<CurieResolver>) -> Self {
        Self {
            literal_rel: rel.into(),
            curie_resolver: curies,
            kind,
            attributes: Map::new(),
            written: None,
        }
    }

    /// A link to a target referenced by URL.
    pub fn simple(
        rel: impl Into<String>,
        target: Representation,
        curies: Arc<CurieResolver>,
    ) -> Self {
        Self::with_kind(
            rel,
            LinkKind::Simple {
                target,
                embedded: false,
            },
            curies,
        )
    }

    /// A link whose target is inlined in `_embedded`.
    pub fn embedded(
        rel: impl Into<String>,
        target: Representation,
        curies: Arc<CurieResolver>,
    ) -> Self {
        Self::with_kind(
            rel,
            LinkKind::Simple {
                target,
                embedded: true,
            },
            curies,
        )
    }

    pub fn templated(
        rel: impl Into<String>,
        template: UriTemplate,
        client: HalClient,
        curies: Arc<CurieResolver>,
    ) -> Self {
        Self::with_kind(rel, LinkKind::Templated { template, client }, curies)
    }

    pub fn malformed(
        rel: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        raw: JsonValue,
        embedded: bool,
        curies: Arc<CurieResolver>,
    ) -> Self {
        Self::with_kind(
            rel,
            LinkKind::Malformed {
                path: path.into(),
                message: message.into(),
                raw,
                embedded,
            },
            curies,
        )
    }

    pub fn builder(rel: impl Into<String>) -> LinkBuilder {
        LinkBuilder::new(rel)
    }

    pub fn with_attributes(mut self, attributes: Map<String, JsonValue>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Remember the document's own link object so serialization can
    /// reproduce it verbatim.
    pub(crate) fn with_written(mut self, written: Map<String, JsonValue>) -> Self {
        self.written = Some(written);
        self
    }

    pub fn kind(&self) -> &LinkKind {
        &self.kind
    }

    pub fn attributes(&self) -> &Map<String, JsonValue> {
        &self.attributes
    }

    /// The relation as written in the document.
    pub fn literal_rel(&self) -> &str {
        &self.literal_rel
    }

    /// The relation with any curie expanded.
    pub fn fully_qualified_rel(&self) -> String {
        self.curie_resolver.resolve(&self.literal_rel)
    }

    pub fn curie_resolver(&self) -> &Arc<CurieResolver> {
        &self.curie_resolver
    }

    /// True if `candidate` names this link's relation, literally or fully
    /// qualified.
    pub fn has_rel(&self, candidate: &str) -> bool {
        candidate == self.literal_rel || candidate == self.fully_qualified_rel()
    }

    pub fn is_templated(&self) -> bool {
        matches!(self.kind, LinkKind::Templated { .. })
    }

    pub fn is_embedded(&self) -> bool {
        match self.kind {
            LinkKind::Simple { embedded, .. } | LinkKind::Malformed { embedded, .. } => embedded,
            LinkKind::Templated { .. } => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, LinkKind::Malformed { .. })
    }

    /// True when the target has no known location.
    pub fn is_anonymous(&self) -> bool {
        match &self.kind {
            LinkKind::Simple { target, .. } => target.location().is_anonymous(),
            _ => false,
        }
    }

    fn malformed_error(&self) -> Option<HalError> {
        match &self.kind {
            LinkKind::Malformed { path, message, .. } => Some(HalError::invalid(path, message)),
            _ => None,
        }
    }

    /// The href before any template expansion.
    pub fn raw_href(&self) -> Result<RawHref> {
        match &self.kind {
            LinkKind::Simple { target, .. } => Ok(RawHref::Url(target.location().clone())),
            LinkKind::Templated { template, .. } => Ok(RawHref::Template(template.clone())),
            LinkKind::Malformed { path, message, .. } => Err(HalError::invalid(path, message)),
        }
    }

    /// String form of [`Link::raw_href`].
    pub fn href_str(&self) -> Result<String> {
        self.raw_href().map(|href| href.to_string())
    }

    /// Location of the target, expanding templates with `vars`.
    pub fn target_url(&self, vars: &TemplateVars) -> Result<Location> {
        match &self.kind {
            LinkKind::Simple { target, .. } => Ok(target.location().clone()),
            LinkKind::Templated { template, .. } => Ok(Location::href(template.expand(vars))),
            LinkKind::Malformed { path, message, .. } => Err(HalError::invalid(path, message)),
        }
    }

    /// The target representation.
    ///
    /// Simple links hand out their (possibly still lazy) target; templated
    /// links produce a fresh lazily-fetched representation at the expanded
    /// URL. No I/O happens here.
    pub fn target(&self, vars: &TemplateVars) -> Result<Representation> {
        match &self.kind {
            LinkKind::Simple { target, .. } => Ok(target.clone()),
            LinkKind::Templated { template, client } => {
                Ok(Representation::future(template.expand(vars), client.clone()))
            }
            LinkKind::Malformed { path, message, .. } => Err(HalError::invalid(path, message)),
        }
    }

    /// The `_links` object for this link (non-embedded links only).
    pub(crate) fn to_link_object(&self) -> Result<JsonValue> {
        if let Some(err) = self.malformed_error() {
            return Err(err);
        }
        if let Some(written) = &self.written {
            return Ok(JsonValue::Object(written.clone()));
        }
        let mut obj = Map::new();
        obj.insert("href".to_string(), JsonValue::String(self.href_str()?));
        if self.is_templated() {
            obj.insert("templated".to_string(), JsonValue::Bool(true));
        }
        for (key, value) in &self.attributes {
            obj.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Ok(JsonValue::Object(obj))
    }

    /// Copy of this link with independent fetch caches.
    pub(crate) fn fork(&self) -> Self {
        let kind = match &self.kind {
            LinkKind::Simple { target, embedded } => LinkKind::Simple {
                target: target.fork(),
                embedded: *embedded,
            },
            other => other.clone(),
        };
        Self {
            literal_rel: self.literal_rel.clone(),
            curie_resolver: Arc::clone(&self.curie_resolver),
            kind,
            attributes: self.attributes.clone(),
            written: self.written.clone(),
        }
    }

    fn identity(&self) -> (String, String, bool) {
        let href = match &self.kind {
            LinkKind::Malformed { path, .. } => format!("MALFORMED({path})"),
            _ => self.href_str().unwrap_or_default(),
        };
        (self.fully_qualified_rel(), href, self.is_templated())
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Link");
        dbg.field("rel", &self.literal_rel);
        match &self.kind {
            LinkKind::Simple { target, embedded } => {
                dbg.field("target", target).field("embedded", embedded);
            }
            LinkKind::Templated { template, .. } => {
                dbg.field("template", &template.pattern());
            }
            LinkKind::Malformed { path, message, .. } => {
                dbg.field("malformed", &path).field("message", message);
            }
        }
        dbg.finish()
    }
}

/// Validating constructor for links assembled by hand.
#[derive(Debug)]
pub struct LinkBuilder {
    rel: String,
    target: Option<Representation>,
    template: Option<UriTemplate>,
    client: Option<HalClient>,
    embedded: bool,
    curies: Option<Arc<CurieResolver>>,
    attributes: Map<String, JsonValue>,
}

impl LinkBuilder {
    pub fn new(rel: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            target: None,
            template: None,
            client: None,
            embedded: false,
            curies: None,
            attributes: Map::new(),
        }
    }

    pub fn target(mut self, target: Representation) -> Self {
        self.target = Some(target);
        self
    }

    /// Template target; `client` performs fetches of expanded URLs.
    pub fn template(mut self, template: UriTemplate, client: HalClient) -> Self {
        self.template = Some(template);
        self.client = Some(client);
        self
    }

    pub fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn curie_resolver(mut self, curies: Arc<CurieResolver>) -> Self {
        self.curies = Some(curies);
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<Link> {
        if self.rel.is_empty() {
            return Err(HalError::Argument("a rel must be provided".to_string()));
        }
        let curies = self.curies.unwrap_or_default();
        let link = match (self.target, self.template, self.client) {
            (Some(_), Some(_), _) => {
                return Err(HalError::Argument(
                    "cannot provide both a target and a template".to_string(),
                ))
            }
            (None, None, _) => {
                return Err(HalError::Argument(
                    "a target or template must be provided".to_string(),
                ))
            }
            (Some(target), None, _) if self.embedded => Link::embedded(self.rel, target, curies),
            (Some(target), None, _) => Link::simple(self.rel, target, curies),
            (None, Some(template), Some(client)) => {
                Link::templated(self.rel, template, client, curies)
            }
            (None, Some(_), None) => {
                return Err(HalError::Argument(
                    "templated links require a client".to_string(),
                ))
            }
        };
        Ok(link.with_attributes(self.attributes))
    }
}
