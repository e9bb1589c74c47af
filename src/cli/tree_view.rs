//! Rendering of a resolved category tree with termtree.

use termtree::Tree;
use tracing::instrument;

use crate::domain::{Category, CategoryTree};

pub trait CategoryTreeConvert {
    /// One termtree per root category.
    fn to_tree_strings(&self) -> Vec<Tree<String>>;
}

impl CategoryTreeConvert for CategoryTree {
    #[instrument(level = "debug", skip(self), fields(categories = self.len()))]
    fn to_tree_strings(&self) -> Vec<Tree<String>> {
        fn build(tree: &CategoryTree, category: &Category) -> Tree<String> {
            let leaves: Vec<_> = tree
                .children(&category.id)
                .into_iter()
                .map(|child| build(tree, child))
                .collect();
            Tree::new(format!("{} [{}]", category.name, category.id)).with_leaves(leaves)
        }

        self.roots().into_iter().map(|root| build(self, root)).collect()
    }
}
