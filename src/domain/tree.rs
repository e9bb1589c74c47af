//! Resolved category tree.

use std::collections::HashMap;

use crate::domain::entities::Category;
use crate::domain::error::{DomainError, DomainResult};

/// Mapping from category id to its resolved [`Category`].
///
/// Built once per feed by [`crate::domain::CategoryTreeBuilder`] and never
/// mutated afterwards, so it can be shared freely between classifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    categories: HashMap<String, Category>,
}

impl CategoryTree {
    pub(crate) fn from_map(categories: HashMap<String, Category>) -> Self {
        Self { categories }
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Like [`get`](Self::get), but unknown ids are an error.
    pub fn lookup(&self, id: &str) -> DomainResult<&Category> {
        self.get(id)
            .ok_or_else(|| DomainError::UnknownCategory(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Categories whose parent is empty or not part of the tree.
    pub fn roots(&self) -> Vec<&Category> {
        let mut roots: Vec<&Category> = self
            .categories
            .values()
            .filter(|c| !self.categories.contains_key(&c.parent_id))
            .collect();
        sort_categories(&mut roots);
        roots
    }

    /// Direct children of `id`, sorted by name then id.
    pub fn children(&self, id: &str) -> Vec<&Category> {
        let mut children: Vec<&Category> = self
            .categories
            .values()
            .filter(|c| c.parent_id == id && c.id != id)
            .collect();
        sort_categories(&mut children);
        children
    }

    /// Number of names in the path of `id`.
    pub fn depth(&self, id: &str) -> DomainResult<usize> {
        self.lookup(id).map(Category::depth)
    }

    /// All categories ordered by path, then id.
    pub fn sorted_by_path(&self) -> Vec<&Category> {
        let mut all: Vec<&Category> = self.categories.values().collect();
        all.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));
        all
    }
}

fn sort_categories(categories: &mut [&Category]) {
    categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}
