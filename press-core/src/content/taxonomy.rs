//! Taxonomy terms and authors

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Built-in hierarchical taxonomy
pub const CATEGORY: &str = "category";

/// Built-in flat taxonomy (archives use the `tag` prefix)
pub const POST_TAG: &str = "post_tag";

/// A single value within a taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    /// Owning taxonomy name (e.g. "category", "post_tag", "genre")
    pub taxonomy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    /// Entities classified under this term
    #[serde(default)]
    pub entity_ids: BTreeSet<u64>,
}

impl TaxonomyTerm {
    pub fn new(id: u64, taxonomy: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            name: String::new(),
            taxonomy: taxonomy.into(),
            parent: None,
            entity_ids: BTreeSet::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_entities(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.entity_ids.extend(ids);
        self
    }

    pub fn contains(&self, entity_id: u64) -> bool {
        self.entity_ids.contains(&entity_id)
    }
}

/// Content author, addressed in URLs by nicename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub nicename: String,
    #[serde(default)]
    pub display_name: String,
}

impl Author {
    pub fn new(id: u64, nicename: impl Into<String>) -> Self {
        Self {
            id,
            nicename: nicename.into(),
            display_name: String::new(),
        }
    }
}
