//! Ordered, deduplicated sets of representations

use crate::error::{HalError, Result};
use crate::representation::Representation;
use crate::transport::Headers;
use crate::uri_template::TemplateVars;
use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// Representations in first-seen order, without duplicates.
///
/// Membership follows [`Representation`] equality, so two references to the
/// same URL collapse into one while distinct anonymous embeds are all kept.
#[derive(Debug, Clone, Default)]
pub struct RepresentationSet {
    members: Vec<Representation>,
}

impl RepresentationSet {
    pub fn new(reprs: impl IntoIterator<Item = Representation>) -> Self {
        let mut seen = HashSet::new();
        let members = reprs
            .into_iter()
            .filter(|repr| seen.insert(repr.clone()))
            .collect();
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn first(&self) -> Option<&Representation> {
        self.members.first()
    }

    pub fn contains(&self, repr: &Representation) -> bool {
        self.members.contains(repr)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Representation> {
        self.members.iter()
    }

    pub fn as_slice(&self) -> &[Representation] {
        &self.members
    }

    /// Union of every member's `rel` targets.
    ///
    /// Members without the relation contribute nothing; the call fails with
    /// [`HalError::KeyNotFound`] only when no member has it.
    pub fn related(&self, rel: &str) -> Result<RepresentationSet> {
        self.related_with(rel, &TemplateVars::new())
    }

    pub fn related_with(&self, rel: &str, vars: &TemplateVars) -> Result<RepresentationSet> {
        let mut found = false;
        let mut targets = Vec::new();
        for repr in &self.members {
            match repr.related_with(rel, vars) {
                Ok(set) => {
                    found = true;
                    targets.extend(set);
                }
                Err(HalError::KeyNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        if !found {
            return Err(HalError::KeyNotFound(rel.to_string()));
        }
        Ok(RepresentationSet::new(targets))
    }

    pub fn post(&self, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.single("post")?.post(body, headers)
    }

    pub fn put(&self, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.single("put")?.put(body, headers)
    }

    pub fn patch(&self, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.single("patch")?.patch(body, headers)
    }

    pub fn delete(&self, headers: &Headers) -> Result<Representation> {
        self.single("delete")?.delete(headers)
    }

    /// Writes only make sense against exactly one target.
    fn single(&self, op: &str) -> Result<&Representation> {
        match self.members.as_slice() {
            [only] => Ok(only),
            members => Err(HalError::NotImplemented(format!(
                "{op} requires exactly one representation, set has {}",
                members.len()
            ))),
        }
    }
}

impl FromIterator<Representation> for RepresentationSet {
    fn from_iter<I: IntoIterator<Item = Representation>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl IntoIterator for RepresentationSet {
    type Item = Representation;
    type IntoIter = std::vec::IntoIter<Representation>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a RepresentationSet {
    type Item = &'a Representation;
    type IntoIter = std::slice::Iter<'a, Representation>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
