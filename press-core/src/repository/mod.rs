//! Content Repository: the read-only persistence seam
//!
//! The core never stores content itself. It reads through the
//! [`ContentRepository`] trait, which a host application implements over its
//! database. [`InMemoryRepository`] is the bundled implementation used by the
//! CLI, tests, and small static sites.
//!
//! Lookups return `Ok(None)` when nothing matches; an `Err` means the backend
//! itself failed and is terminal for the request.
//!
//! # Example
//!
//! ```rust
//! use press_core::content::ContentEntity;
//! use press_core::repository::{ContentRepository, EntityFilter, InMemoryRepository};
//!
//! let repo = InMemoryRepository::new();
//! repo.insert_entity(ContentEntity::new(1, "page", "about")).unwrap();
//!
//! let found = repo
//!     .find_entity(&"page".into(), &EntityFilter::slug("about").root())
//!     .unwrap();
//! assert_eq!(found.map(|e| e.id), Some(1));
//! ```

mod memory;

pub use memory::{InMemoryRepository, SiteFixture};

use crate::content::{Author, ContentEntity, PostType, Revision, TaxonomyTerm};
use crate::error::Result;

/// Parent constraint for entity lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParentFilter {
    /// Any parent (or none)
    #[default]
    Any,
    /// Top-level entities only
    Root,
    /// Direct children of the given entity
    ChildOf(u64),
}

/// Filter for [`ContentRepository::find_entity`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    pub id: Option<u64>,
    pub slug: Option<String>,
    pub parent: ParentFilter,
}

impl EntityFilter {
    /// Match by slug
    pub fn slug(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Match by identifier
    pub fn id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Restrict to top-level entities
    pub fn root(mut self) -> Self {
        self.parent = ParentFilter::Root;
        self
    }

    /// Restrict to direct children of `parent`
    pub fn child_of(mut self, parent: u64) -> Self {
        self.parent = ParentFilter::ChildOf(parent);
        self
    }

    /// Whether `entity` satisfies this filter
    pub fn matches(&self, entity: &ContentEntity) -> bool {
        self.id.map_or(true, |id| entity.id == id)
            && self.slug.as_deref().map_or(true, |slug| entity.slug == slug)
            && match self.parent {
                ParentFilter::Any => true,
                ParentFilter::Root => entity.parent.is_none(),
                ParentFilter::ChildOf(parent) => entity.parent == Some(parent),
            }
    }
}

/// Read-only access to content owned by the host application
///
/// Implementations must be safe to call from many requests at once.
pub trait ContentRepository: Send + Sync {
    /// First entity of `post_type` matching `filter`
    fn find_entity(&self, post_type: &PostType, filter: &EntityFilter) -> Result<Option<ContentEntity>>;

    /// Entity by identifier, whatever its type
    fn find_by_id(&self, id: u64) -> Result<Option<ContentEntity>>;

    /// Ancestors of `entity`, root first, excluding `entity` itself
    fn find_ancestors(&self, entity: &ContentEntity) -> Result<Vec<ContentEntity>>;

    /// Translation of `entity` in `locale`
    fn find_siblings_by_locale(&self, entity: &ContentEntity, locale: &str) -> Result<Option<ContentEntity>>;

    /// Revision `revision_id` of entity `entity_id`
    fn find_revision(&self, entity_id: u64, revision_id: u64) -> Result<Option<Revision>>;

    /// Term of `taxonomy` with `slug`
    fn find_term(&self, taxonomy: &str, slug: &str) -> Result<Option<TaxonomyTerm>>;

    /// Author by nicename
    fn find_author(&self, nicename: &str) -> Result<Option<Author>>;

    /// Backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}
