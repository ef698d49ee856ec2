//! # Press Core - content routing for WordPress-style sites
//!
//! Press decides what a request is about and which view renders it:
//!
//! - **Query resolution**: classifies a permalink or query string into one
//!   content identity state (single post, page, category archive, ...)
//! - **Template hierarchy**: lists candidate views from most to least specific
//! - **View resolution**: renders the first candidate that exists, falling
//!   back to the default view
//! - **Variants**: redirects to translations and shows token-authorized
//!   revision previews
//!
//! Content is read through the [`ContentRepository`] trait; views are
//! checked through [`ViewOracle`] or a render closure. Press never writes.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use press_core::{
//!     ContentEntity, ContentRegistry, Dispatcher, InMemoryRepository, RenderOutcome,
//!     Session, SiteConfig, StaticViews,
//! };
//!
//! let repo = InMemoryRepository::new();
//! repo.insert_entity(ContentEntity::new(1, "post", "hello-world")).unwrap();
//!
//! let views: StaticViews = ["index", "single"].into_iter().collect();
//! let dispatcher = Dispatcher::new(
//!     Arc::new(SiteConfig::default()),
//!     Arc::new(ContentRegistry::with_builtins().unwrap()),
//!     Arc::new(repo),
//!     Arc::new(views),
//! );
//!
//! let request = dispatcher.parse::<&str, &str>("/hello-world/", &[]).unwrap();
//! match dispatcher.respond(&request, &Session::anonymous()) {
//!     RenderOutcome::Render(render) => {
//!         assert_eq!(render.candidates[0], "single-post-hello-world");
//!         assert_eq!(render.view, "single");
//!     }
//!     other => panic!("unexpected outcome: {:?}", other),
//! }
//! ```

pub mod config;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod hierarchy;
pub mod hooks;
pub mod permalink;
pub mod query;
pub mod repository;
pub mod variant;
pub mod view;

// Re-export main types
pub use config::{MessageCatalog, MultilangConfig, PermalinkConfig, ShowOnFront, SiteConfig};
pub use content::{
    Author, ContentEntity, ContentRegistry, PostStatus, PostType, PostTypeDescriptor,
    RegistryBuilder, Revision, TaxonomyDescriptor, TaxonomyTerm,
};
pub use dispatch::{Breadcrumb, Dispatcher, MessagePage, RedirectInstruction, RenderInstruction, RenderOutcome};
pub use error::{ErrorCategory, ErrorDetail, ErrorResponse, PressError, Result};
pub use hierarchy::{Candidates, TemplateHierarchy};
pub use hooks::{AuthorizationHook, BeforeShowHook, HookDecision, HookRegistry, Session};
pub use query::{
    ContentIdentityState, QueriedObject, QueryFlags, QueryRequest, QueryResolver, RequestParser,
    ResolvedQuery,
};
pub use repository::{ContentRepository, EntityFilter, InMemoryRepository, SiteFixture};
pub use variant::{RevisionTokenSigner, VariantOutcome, VariantResolver};
pub use view::{DirectoryViews, Rendered, StaticViews, ViewOracle, ViewResolver};

/// Crate version, reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
