//! Tree builder resolving flat parent-pointer categories into full paths.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::entities::{Category, RawCategory, CATEGORY_PATH_SEP};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::tree::CategoryTree;

/// Collects raw categories and resolves them into a [`CategoryTree`].
///
/// Categories may be added in any order; parents do not need to precede
/// their children. Adding an id twice keeps the last record.
#[derive(Debug, Clone, Default)]
pub struct CategoryTreeBuilder {
    raw: HashMap<String, RawCategory>,
}

impl CategoryTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: RawCategory) -> &mut Self {
        self.raw.insert(category.id.clone(), category);
        self
    }

    /// Resolve the path of every collected category.
    ///
    /// Each path is found by walking the parent chain upward through the
    /// input, stopping at an empty or unknown parent id. Paths of ancestors
    /// already resolved are reused instead of walked again.
    ///
    /// # Errors
    ///
    /// [`DomainError::CycleDetected`] if a chain revisits one of its ids,
    /// including a category that is its own parent.
    #[instrument(level = "debug", skip(self), fields(categories = self.raw.len()))]
    pub fn build(&self) -> DomainResult<CategoryTree> {
        let mut resolved: HashMap<&str, String> = HashMap::with_capacity(self.raw.len());

        // Sorted so that the reported cycle does not depend on hash order
        let mut ids: Vec<&str> = self.raw.keys().map(String::as_str).collect();
        ids.sort_unstable();

        for id in ids {
            self.resolve(id, &mut resolved)?;
        }

        let categories = self
            .raw
            .iter()
            .map(|(id, raw)| {
                let path = resolved.remove(id.as_str()).unwrap_or_else(|| raw.name.clone());
                let category = Category {
                    id: id.clone(),
                    parent_id: raw.parent_id.clone(),
                    name: raw.name.clone(),
                    path,
                };
                (id.clone(), category)
            })
            .collect::<HashMap<_, _>>();

        debug!("build: resolved {} categories", categories.len());
        Ok(CategoryTree::from_map(categories))
    }

    fn resolve<'a>(
        &'a self,
        id: &'a str,
        resolved: &mut HashMap<&'a str, String>,
    ) -> DomainResult<()> {
        if resolved.contains_key(id) {
            return Ok(());
        }

        let mut chain: Vec<(&'a str, &'a RawCategory)> = Vec::new();
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut prefix: Option<String> = None;
        let mut current = self.raw.get_key_value(id);

        while let Some((current_id, category)) = current {
            if !visited.insert(current_id.as_str()) {
                return Err(DomainError::CycleDetected {
                    id: id.to_string(),
                    repeated: current_id.clone(),
                });
            }
            chain.push((current_id.as_str(), category));

            if category.parent_id.is_empty() {
                break;
            }
            if let Some(path) = resolved.get(category.parent_id.as_str()) {
                prefix = Some(path.clone());
                break;
            }
            current = self.raw.get_key_value(&category.parent_id);
        }

        // Materialize root-to-leaf so every ancestor on the chain is memoized too
        for (chain_id, category) in chain.into_iter().rev() {
            let path = match prefix {
                Some(parent_path) => {
                    format!("{}{}{}", parent_path, CATEGORY_PATH_SEP, category.name)
                }
                None => category.name.clone(),
            };
            resolved.insert(chain_id, path.clone());
            prefix = Some(path);
        }
        Ok(())
    }
}

impl FromIterator<RawCategory> for CategoryTreeBuilder {
    fn from_iter<I: IntoIterator<Item = RawCategory>>(iter: I) -> Self {
        let mut builder = Self::new();
        for category in iter {
            builder.add(category);
        }
        builder
    }
}

/// Resolve a mapping of id to raw category into a [`CategoryTree`].
///
/// Map keys are authoritative: a record stored under key `k` becomes
/// category `k` even if its own `id` field differs.
pub fn build_category_tree(raw: &HashMap<String, RawCategory>) -> DomainResult<CategoryTree> {
    let builder = CategoryTreeBuilder {
        raw: raw.clone(),
    };
    builder.build()
}
