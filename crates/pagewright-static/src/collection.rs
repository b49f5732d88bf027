//! Ordered, id-keyed page registry.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::page::Page;

/// Errors raised by strict collection operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Page id already exists: {0}")]
    Collision(String),

    #[error("Page id not found: {0}")]
    Missing(String),
}

/// Pages in insertion order, unique by id.
#[derive(Debug, Clone, Default)]
pub struct PageCollection {
    pages: Vec<Page>,
    index: HashMap<String, usize>,
}

impl PageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn has(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Page> {
        self.index.get(id).map(|&i| &self.pages[i])
    }

    /// Insert a new page. Fails if its id is already present.
    pub fn add(&mut self, page: Page) -> Result<(), CollectionError> {
        if self.has(page.id()) {
            return Err(CollectionError::Collision(page.id().to_string()));
        }
        self.index.insert(page.id().to_string(), self.pages.len());
        self.pages.push(page);
        Ok(())
    }

    /// Swap in a page for an existing id, keeping its position.
    ///
    /// Returns the page that was replaced.
    pub fn replace(&mut self, page: Page) -> Result<Page, CollectionError> {
        let Some(&i) = self.index.get(page.id()) else {
            return Err(CollectionError::Missing(page.id().to_string()));
        };
        Ok(std::mem::replace(&mut self.pages[i], page))
    }

    pub fn remove(&mut self, id: &str) -> Option<Page> {
        let i = self.index.remove(id)?;
        let page = self.pages.remove(i);
        for later in &self.pages[i..] {
            if let Some(pos) = self.index.get_mut(later.id()) {
                *pos -= 1;
            }
        }
        Some(page)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    /// Mutable access for in-place updates. Ids must not change through it.
    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Page> {
        self.pages.iter_mut()
    }

    pub fn ids(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.id().to_string()).collect()
    }

    /// New collection holding clones of the matching pages, in order.
    pub fn filter(&self, predicate: impl Fn(&Page) -> bool) -> Self {
        let mut filtered = Self::new();
        for page in self.pages.iter().filter(|p| predicate(p)) {
            filtered.index.insert(page.id().to_string(), filtered.pages.len());
            filtered.pages.push(page.clone());
        }
        filtered
    }

    /// New collection sorted most recent first. See [`compare_dates`].
    pub fn sort_by_date(&self) -> Self {
        let mut pages = self.pages.clone();
        pages.sort_by(|a, b| compare_dates(a.date(), b.date()));

        let index = pages
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id().to_string(), i))
            .collect();
        Self { pages, index }
    }

    /// Group page ids by the keys each page yields, in order of first discovery.
    ///
    /// A page yielding several keys lands in several groups; repeated keys
    /// from one page count once.
    pub fn group_by(&self, mut keys: impl FnMut(&Page) -> Vec<String>) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for page in &self.pages {
            for key in keys(page) {
                let pos = *positions.entry(key.clone()).or_insert_with(|| {
                    groups.push((key, Vec::new()));
                    groups.len() - 1
                });
                let members = &mut groups[pos].1;
                if members.last().map(String::as_str) != Some(page.id()) {
                    members.push(page.id().to_string());
                }
            }
        }

        groups
    }

    /// Clones of the given pages, in the order of `ids`. Unknown ids are skipped.
    pub fn subset(&self, ids: &[String]) -> Self {
        let mut subset = Self::new();
        for page in ids.iter().filter_map(|id| self.get(id)) {
            if !subset.has(page.id()) {
                subset.index.insert(page.id().to_string(), subset.pages.len());
                subset.pages.push(page.clone());
            }
        }
        subset
    }
}

impl<'a> IntoIterator for &'a PageCollection {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Date ordering for listings: most recent first, undated pages before all
/// dated ones. Equal keys compare equal so stable sorts keep input order.
pub fn compare_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b.cmp(&a),
    }
}
