//! Content model: entities, revisions, taxonomy terms, and the registry
//!
//! Every content item is one [`ContentEntity`] tagged with a [`PostType`].
//! Type-specific behaviour (hierarchy, archives, rewrite slugs) comes from
//! the [`PostTypeDescriptor`] looked up in the [`ContentRegistry`], never
//! from distinct implementation types.
//!
//! ```text
//!   RegistryManifest (JSON)        builtins (post, page, attachment,
//!            │                               category, post_tag)
//!            ▼                                      │
//!    ┌───────────────────────────────────────────────┐
//!    │        RegistryBuilder::build()               │
//!    │  validate names → reject duplicates → index   │
//!    └───────────────────────────────────────────────┘
//!                         │
//!                         ▼
//!            ContentRegistry (immutable)
//! ```

mod entity;
mod registry;
mod taxonomy;

pub use entity::{ContentEntity, Metadata, PostStatus, PostType, Revision, PAGE_TEMPLATE_META};
pub use registry::{
    ContentRegistry, PostTypeDescriptor, RegistryBuilder, RegistryManifest, Support,
    TaxonomyDescriptor,
};
pub use taxonomy::{Author, TaxonomyTerm, CATEGORY, POST_TAG};
