//! Block catalog: the read-only set of templates a project's blocks refer to.

pub mod definition;
mod loader;

pub use definition::*;

use ahash::AHashMap;

/// Read access to block templates by id.
///
/// The compiler only ever needs this lookup, so any keyed store can stand in for a
/// full [`Catalog`] (tests use a plain map).
pub trait BlockCatalog {
    fn get_definition(&self, template_id: &str) -> Option<&BlockDefinition>;
}

impl BlockCatalog for AHashMap<String, BlockDefinition> {
    fn get_definition(&self, template_id: &str) -> Option<&BlockDefinition> {
        self.get(template_id)
    }
}

/// An ordered collection of categories with an id index over their blocks.
///
/// When two categories define the same block id, the one loaded first wins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: Vec<Category>,
    index: AHashMap<String, (usize, usize)>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        let mut catalog = Self {
            categories: Vec::new(),
            index: AHashMap::new(),
        };
        catalog.extend(categories);
        catalog
    }

    /// Appends categories, indexing any block ids not seen before.
    pub fn extend(&mut self, categories: impl IntoIterator<Item = Category>) {
        for category in categories {
            let category_idx = self.categories.len();
            for (block_idx, block) in category.blocks.iter().enumerate() {
                self.index
                    .entry(block.id.clone())
                    .or_insert((category_idx, block_idx));
            }
            self.categories.push(category);
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Iterates every block together with the category that holds it, in load order.
    pub fn blocks(&self) -> impl Iterator<Item = (&Category, &BlockDefinition)> {
        self.categories
            .iter()
            .flat_map(|c| c.blocks.iter().map(move |b| (c, b)))
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.blocks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockCatalog for Catalog {
    fn get_definition(&self, template_id: &str) -> Option<&BlockDefinition> {
        let (category_idx, block_idx) = *self.index.get(template_id)?;
        self.categories
            .get(category_idx)
            .and_then(|c| c.blocks.get(block_idx))
    }
}
