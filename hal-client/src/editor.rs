//! Non-destructive editing of representations
//!
//! A [`RepresentationEditor`] never modifies the representation it was
//! created from. Each edit returns a new editor whose `current`
//! representation reflects the change while `original` stays put, so
//! [`RepresentationEditor::is_dirty`] can compare against the starting
//! point at any time.
//!
//! ```ignore
//! let edited = RepresentationEditor::new(post)
//!     .reject_related_where("author", RejectOptions::default(), |author| {
//!         Ok(author.property("name")? == json!("John Plagiarist"))
//!     })?
//!     .set_property("reviewed", json!(true))?;
//! ```

use crate::error::{HalError, Result};
use crate::link::Link;
use crate::representation::Representation;
use crate::uri_template::{TemplateVars, UriTemplate};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;
use tracing::debug;

/// Controls for the `reject_*_where` family
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectOptions {
    /// Reject links whose target cannot be fetched or interpreted instead of
    /// propagating the error
    pub ignore_broken_links: bool,
}

impl RejectOptions {
    pub fn ignoring_broken_links() -> Self {
        Self {
            ignore_broken_links: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Links,
    Embedded,
}

impl Section {
    fn holds(self, link: &Link) -> bool {
        match self {
            Section::Links => !link.is_embedded(),
            Section::Embedded => link.is_embedded(),
        }
    }
}

/// Immutable, chainable edits of a representation
#[derive(Debug, Clone)]
pub struct RepresentationEditor {
    original: Representation,
    current: Representation,
}

impl RepresentationEditor {
    pub fn new(repr: Representation) -> Self {
        Self {
            current: repr.clone(),
            original: repr,
        }
    }

    pub fn original(&self) -> &Representation {
        &self.original
    }

    /// The representation with every edit so far applied.
    pub fn current(&self) -> &Representation {
        &self.current
    }

    /// Remove every non-embedded link with relation `rel`.
    pub fn reject_links(&self, rel: &str) -> Result<Self> {
        self.reject(rel, Section::Links, RejectOptions::default(), None)
    }

    /// Remove the non-embedded `rel` links whose target satisfies
    /// `predicate`.
    pub fn reject_links_where<F>(&self, rel: &str, opts: RejectOptions, mut predicate: F) -> Result<Self>
    where
        F: FnMut(&Representation) -> Result<bool>,
    {
        self.reject(rel, Section::Links, opts, Some(&mut predicate))
    }

    /// Remove every embedded resource with relation `rel`.
    pub fn reject_embedded(&self, rel: &str) -> Result<Self> {
        self.reject(rel, Section::Embedded, RejectOptions::default(), None)
    }

    pub fn reject_embedded_where<F>(
        &self,
        rel: &str,
        opts: RejectOptions,
        mut predicate: F,
    ) -> Result<Self>
    where
        F: FnMut(&Representation) -> Result<bool>,
    {
        self.reject(rel, Section::Embedded, opts, Some(&mut predicate))
    }

    /// Remove `rel` links and embeds alike.
    pub fn reject_related(&self, rel: &str) -> Result<Self> {
        self.reject_links(rel)?.reject_embedded(rel)
    }

    pub fn reject_related_where<F>(
        &self,
        rel: &str,
        opts: RejectOptions,
        mut predicate: F,
    ) -> Result<Self>
    where
        F: FnMut(&Representation) -> Result<bool>,
    {
        self.reject(rel, Section::Links, opts, Some(&mut predicate))?
            .reject(rel, Section::Embedded, opts, Some(&mut predicate))
    }

    fn reject(
        &self,
        rel: &str,
        section: Section,
        opts: RejectOptions,
        mut predicate: Option<&mut dyn FnMut(&Representation) -> Result<bool>>,
    ) -> Result<Self> {
        let no_vars = TemplateVars::new();
        let mut kept = Vec::new();

        for link in self.current.links()? {
            if !(section.holds(&link) && link.has_rel(rel)) {
                kept.push(link);
                continue;
            }
            let Some(predicate) = predicate.as_mut() else {
                continue;
            };
            let verdict = link.target(&no_vars).and_then(|target| predicate(&target));
            let reject = match verdict {
                Ok(reject) => reject,
                Err(err) if opts.ignore_broken_links && is_broken(&err) => {
                    debug!(rel = %rel, error = %err, "rejecting broken link");
                    true
                }
                Err(err) => return Err(err),
            };
            if !reject {
                kept.push(link);
            }
        }

        self.with_current(self.current.properties()?, kept)
    }

    /// Append a link; existing links with the same relation stay.
    pub fn add_link(&self, rel: &str, target_url: &str, templated: bool) -> Result<Self> {
        if target_url.is_empty() {
            return Err(HalError::Argument(format!("a target url is required for '{rel}'")));
        }
        let client = self.current.client().clone();
        let builder = Link::builder(rel).curie_resolver(self.current.curie_resolver()?);
        let builder = if templated {
            builder.template(UriTemplate::new(target_url), client)
        } else {
            builder.target(Representation::future(target_url, client))
        };

        let mut links = self.current.links()?;
        links.push(builder.build()?);
        self.with_current(self.current.properties()?, links)
    }

    pub fn set_property(&self, key: &str, value: JsonValue) -> Result<Self> {
        let mut properties = self.current.properties()?;
        properties.insert(key.to_string(), value);
        self.with_current(properties, self.current.links()?)
    }

    fn with_current(&self, properties: Map<String, JsonValue>, links: Vec<Link>) -> Result<Self> {
        let current = Representation::from_parts(
            self.current.location().clone(),
            properties,
            links,
            self.current.curie_resolver()?,
            self.current.client().clone(),
        );
        Ok(Self {
            original: self.original.clone(),
            current,
        })
    }

    /// True when `current` differs from `original`.
    ///
    /// Links with a location compare as a set; links to anonymous embeds
    /// carry no identity and compare by relation and content.
    pub fn is_dirty(&self) -> Result<bool> {
        if self.current.properties()? != self.original.properties()? {
            return Ok(true);
        }
        let (current_named, current_anonymous) = link_summary(&self.current)?;
        let (original_named, original_anonymous) = link_summary(&self.original)?;
        Ok(current_named != original_named || current_anonymous != original_anonymous)
    }

    pub fn raw(&self) -> Result<JsonValue> {
        self.current.raw()
    }

    pub fn to_hal(&self) -> Result<String> {
        self.current.to_hal()
    }

    pub fn into_representation(self) -> Representation {
        self.current
    }
}

fn is_broken(err: &HalError) -> bool {
    matches!(
        err,
        HalError::Transport(_) | HalError::InvalidRepresentation { .. }
    )
}

/// Identified links as a set; anonymous ones as a sorted list of
/// `(relation, serialized target)`.
fn link_summary(repr: &Representation) -> Result<(HashSet<Link>, Vec<(String, String)>)> {
    let mut named = HashSet::new();
    let mut anonymous = Vec::new();
    for link in repr.links()? {
        if link.is_anonymous() {
            let target = link.target(&TemplateVars::new())?;
            anonymous.push((link.fully_qualified_rel(), target.to_hal()?));
        } else {
            named.insert(link);
        }
    }
    anonymous.sort();
    Ok((named, anonymous))
}

impl From<Representation> for RepresentationEditor {
    fn from(repr: Representation) -> Self {
        Self::new(repr)
    }
}
