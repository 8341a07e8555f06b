//! Paged collections (RFC 6573 `item`/`next`/`prev`)
//!
//! Pages are fetched lazily: the next page is requested only once every item
//! of the current page has been yielded.

use crate::error::{HalError, Result};
use crate::representation::Representation;
use crate::uri_template::TemplateVars;
use rand::seq::SliceRandom;
use std::vec;

const ITEM_REL: &str = "item";
const NEXT_REL: &str = "next";
const PREV_REL: &str = "prev";

/// The items of a paged collection, starting at its first page
#[derive(Debug, Clone)]
pub struct Collection {
    first_page: Representation,
}

impl Collection {
    /// Fails with [`HalError::NotACollection`] if `first_page` has no `item`
    /// relation and with [`HalError::Argument`] if it is not the first page.
    pub fn new(first_page: Representation) -> Result<Self> {
        if !first_page.has_related(ITEM_REL)? {
            return Err(HalError::NotACollection(first_page.location().to_string()));
        }
        if first_page.has_related(PREV_REL)? {
            return Err(HalError::Argument(format!(
                "{} is not the first page of the collection",
                first_page.location()
            )));
        }
        Ok(Self { first_page })
    }

    pub fn first_page(&self) -> &Representation {
        &self.first_page
    }

    /// Every item of every page, in page order.
    pub fn iter(&self) -> Items {
        Items {
            pages: self.pages(),
            current: Vec::new().into_iter(),
        }
    }

    pub fn pages(&self) -> Pages {
        Pages {
            next: Some(self.first_page.clone()),
        }
    }

    /// Number of items, if every page has already been fetched.
    ///
    /// Fails with [`HalError::NotImplemented`] rather than fetching pages
    /// just to count them.
    pub fn count(&self) -> Result<usize> {
        if !self.all_pages_fetched()? {
            return Err(HalError::NotImplemented(
                "refusing to fetch an arbitrary number of pages to count a collection".to_string(),
            ));
        }
        let mut total = 0;
        for page in self.pages() {
            total += items_of(&page?)?.len();
        }
        Ok(total)
    }

    /// A random item from the first page.
    pub fn sample(&self) -> Result<Option<Representation>> {
        let items = items_of(&self.first_page)?;
        Ok(items.choose(&mut rand::thread_rng()).cloned())
    }

    /// Up to `n` distinct random items from the first page.
    pub fn sample_n(&self, n: usize) -> Result<Vec<Representation>> {
        let items = items_of(&self.first_page)?;
        Ok(items
            .choose_multiple(&mut rand::thread_rng(), n)
            .cloned()
            .collect())
    }

    fn all_pages_fetched(&self) -> Result<bool> {
        let no_vars = TemplateVars::new();
        let mut page = self.first_page.clone();
        loop {
            if !page.is_reified() {
                return Ok(false);
            }
            let links = page.links_for(NEXT_REL)?;
            let Some(next) = links.first() else {
                return Ok(true);
            };
            page = next.target(&no_vars)?;
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = Result<Representation>;
    type IntoIter = Items;

    fn into_iter(self) -> Items {
        self.iter()
    }
}

fn items_of(page: &Representation) -> Result<Vec<Representation>> {
    match page.related(ITEM_REL) {
        Ok(items) => Ok(items.into_iter().collect()),
        Err(HalError::KeyNotFound(_)) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

fn next_page(page: &Representation) -> Result<Option<Representation>> {
    match page.related(NEXT_REL) {
        Ok(next) => Ok(next.first().cloned()),
        Err(HalError::KeyNotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Iterator over the pages of a collection
#[derive(Debug)]
pub struct Pages {
    next: Option<Representation>,
}

impl Iterator for Pages {
    type Item = Result<Representation>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.next.take()?;
        match next_page(&page) {
            Ok(next) => {
                self.next = next;
                Some(Ok(page))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Iterator over the items of a collection
#[derive(Debug)]
pub struct Items {
    pages: Pages,
    current: vec::IntoIter<Representation>,
}

impl Iterator for Items {
    type Item = Result<Representation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(Ok(item));
            }
            match self.pages.next()?.and_then(|page| items_of(&page)) {
                Ok(items) => self.current = items.into_iter(),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HalClient;
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: &Arc<MemoryTransport>) -> HalClient {
        HalClient::from_arc(transport.clone())
    }

    #[test]
    fn test_requires_item_relation() {
        let transport = Arc::new(
            MemoryTransport::new().with_resource("http://example.com/c", json!({"a": 1})),
        );
        let page = client(&transport).get("http://example.com/c").unwrap();
        assert!(matches!(
            Collection::new(page),
            Err(HalError::NotACollection(_))
        ));
    }

    #[test]
    fn test_rejects_non_first_page() {
        let transport = Arc::new(MemoryTransport::new().with_resource(
            "http://example.com/c?p=2",
            json!({"_links": {
                "item": [{"href": "/i/3"}],
                "prev": {"href": "/c"}
            }}),
        ));
        let page = client(&transport).get("http://example.com/c?p=2").unwrap();
        assert!(matches!(Collection::new(page), Err(HalError::Argument(_))));
    }

    #[test]
    fn test_sample_draws_from_first_page() {
        let transport = Arc::new(MemoryTransport::new().with_resource(
            "http://example.com/c",
            json!({"_links": {
                "item": [{"href": "/i/1"}, {"href": "/i/2"}],
                "next": {"href": "/c?p=2"}
            }}),
        ));
        let collection = client(&transport)
            .get("http://example.com/c")
            .unwrap()
            .into_collection()
            .unwrap();

        let one = collection.sample().unwrap().unwrap();
        assert!(one.href().unwrap().starts_with("http://example.com/i/"));
        assert_eq!(collection.sample_n(5).unwrap().len(), 2);
        assert_eq!(transport.total_fetches(), 1);
    }
}
