//! Multi-step navigation recipes
//!
//! A [`Navigator`] records a sequence of steps and applies them lazily to
//! some starting representations:
//!
//! ```ignore
//! let dog_posts = Navigator::new()
//!     .follow("https://rels.example.com/posts")
//!     .paged_collection()
//!     .select(|post| post.property("title").map_or(false, |t| t == "dogs"));
//! for post in dog_posts.iter([blog]) {
//!     println!("{}", post?);
//! }
//! ```
//!
//! Nothing is fetched until the returned iterator is advanced.

use crate::collection::Collection;
use crate::error::{HalError, Result};
use crate::representation::Representation;
use std::fmt;
use std::iter;
use std::sync::Arc;

/// Lazy stream of navigation results
pub type Navigation = Box<dyn Iterator<Item = Result<Representation>>>;

type Step = Box<dyn Fn(Navigation) -> Navigation>;

/// Builder of lazy navigation steps
#[derive(Default)]
pub struct Navigator {
    steps: Vec<Step>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    fn step(mut self, step: impl Fn(Navigation) -> Navigation + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Replace each representation with its `rel` targets.
    ///
    /// Representations lacking `rel` contribute nothing. `follow("item")`
    /// is [`Navigator::paged_collection`], so later pages are not missed.
    pub fn follow(self, rel: impl Into<String>) -> Self {
        let rel = rel.into();
        if rel == "item" {
            return self.paged_collection();
        }
        self.step(move |input| {
            let rel = rel.clone();
            Box::new(input.flat_map(move |repr| -> Navigation {
                match repr.and_then(|repr| repr.related(&rel)) {
                    Ok(targets) => Box::new(targets.into_iter().map(Ok)),
                    Err(HalError::KeyNotFound(_)) => Box::new(iter::empty()),
                    Err(err) => Box::new(iter::once(Err(err))),
                }
            }))
        })
    }

    /// Replace each representation with the items of the collection it
    /// starts.
    pub fn paged_collection(self) -> Self {
        self.step(|input| {
            Box::new(input.flat_map(|repr| -> Navigation {
                match repr.and_then(Collection::new) {
                    Ok(collection) => Box::new(collection.iter()),
                    Err(err) => Box::new(iter::once(Err(err))),
                }
            }))
        })
    }

    /// Keep only representations for which `filter` is true. Errors pass
    /// through.
    pub fn select<F>(self, filter: F) -> Self
    where
        F: Fn(&Representation) -> bool + 'static,
    {
        let filter = Arc::new(filter);
        self.step(move |input| {
            let filter = Arc::clone(&filter);
            Box::new(input.filter(move |repr| match repr {
                Ok(repr) => filter(repr),
                Err(_) => true,
            }))
        })
    }

    /// Replace each representation with whatever `mapping` returns for it.
    pub fn flat_map<F>(self, mapping: F) -> Self
    where
        F: Fn(Representation) -> Result<Vec<Representation>> + 'static,
    {
        let mapping = Arc::new(mapping);
        self.step(move |input| {
            let mapping = Arc::clone(&mapping);
            Box::new(input.flat_map(move |repr| -> Navigation {
                match repr.and_then(|repr| mapping(repr)) {
                    Ok(reprs) => Box::new(reprs.into_iter().map(Ok)),
                    Err(err) => Box::new(iter::once(Err(err))),
                }
            }))
        })
    }

    /// Run the recorded steps lazily, starting from `initial`.
    pub fn iter(&self, initial: impl IntoIterator<Item = Representation>) -> Navigation {
        let start: Vec<Representation> = initial.into_iter().collect();
        let start: Navigation = Box::new(start.into_iter().map(Ok));
        self.steps.iter().fold(start, |input, step| step(input))
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("steps", &self.steps.len())
            .finish()
    }
}
