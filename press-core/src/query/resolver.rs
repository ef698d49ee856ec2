//! Query resolution
//!
//! Classifies a [`QueryRequest`] into exactly one [`ContentIdentityState`]
//! and loads the object it is about. Classification runs in precedence
//! order:
//!
//! 1. Taxonomy term (`taxonomy` + `slug`)
//! 2. Page path (`pagename`)
//! 3. Named single entity (`name`, optionally with `post_type` and a date)
//! 4. Author archive
//! 5. Post type archive
//! 6. Date archive
//! 7. Ambiguous slug: post type archive, term, attachment, post, page path
//! 8. Site root: static front page or posts home
//!
//! Special pages (front page, posts page, privacy policy) are recognized by
//! identifier wherever they are reached from.

use super::request::QueryRequest;
use super::state::{DateArchive, QueriedObject, QueryFlags, ResolvedQuery};
use crate::config::{ShowOnFront, SiteConfig};
use crate::content::{ContentEntity, ContentRegistry, PostType, CATEGORY, POST_TAG};
use crate::error::{PressError, Result};
use crate::repository::{ContentRepository, EntityFilter};

/// Resolves requests against a repository
pub struct QueryResolver<'a> {
    repo: &'a dyn ContentRepository,
    registry: &'a ContentRegistry,
    config: &'a SiteConfig,
}

impl<'a> QueryResolver<'a> {
    pub fn new(
        repo: &'a dyn ContentRepository,
        registry: &'a ContentRegistry,
        config: &'a SiteConfig,
    ) -> Self {
        Self { repo, registry, config }
    }

    /// Classify `request` and load its queried object
    ///
    /// Fails with a not-found error when the request names content that does
    /// not exist, and with `InvalidDateRange` for impossible dates.
    pub fn resolve(&self, request: &QueryRequest) -> Result<ResolvedQuery> {
        let date = request.date_archive()?;

        let resolved = if let Some(taxonomy) = request.taxonomy.as_deref() {
            let slug = request.slug.as_deref().ok_or_else(|| PressError::InvalidRequest {
                reason: format!("taxonomy '{}' requires a term slug", taxonomy),
            })?;
            self.resolve_term(taxonomy, slug)?
        } else if let Some(path) = request.pagename.as_deref() {
            let page = self
                .walk_path(&PostType::Page, path)?
                .ok_or_else(|| PressError::not_found(format!("page '{}'", path)))?;
            self.classify_entity(page)
        } else if let Some(name) = request.name.as_deref() {
            self.resolve_named(request.post_type.as_deref(), name, &date)?
        } else if let Some(nicename) = request.author_name.as_deref() {
            self.resolve_author(nicename)?
        } else if let Some(post_type) = request.post_type.as_deref() {
            self.resolve_post_type_archive(post_type)?
        } else if !date.is_empty() {
            ResolvedQuery::new(
                QueryFlags {
                    date: true,
                    archive: true,
                    ..Default::default()
                },
                QueriedObject::Date(date),
            )
        } else if let Some(slug) = request.slug.as_deref() {
            self.resolve_slug(slug)?
        } else {
            self.resolve_root()?
        };

        tracing::debug!("Resolved request to state '{}'", resolved.state);
        Ok(resolved)
    }

    /// Flags for a single entity, including the special-page ones
    pub fn classify_entity(&self, entity: ContentEntity) -> ResolvedQuery {
        let mut flags = QueryFlags {
            singular: true,
            ..Default::default()
        };

        match entity.post_type {
            PostType::Page => {
                flags.page = true;
                if self.config.is_static_front(entity.id) {
                    flags.front_page = true;
                }
                if self.config.is_posts_page(entity.id) {
                    flags.home = true;
                    flags.page = false;
                    flags.singular = false;
                }
                if self.config.page_for_privacy_policy == Some(entity.id) {
                    flags.privacy_policy = true;
                }
            }
            PostType::Attachment => {
                flags.attachment = true;
                flags.single = true;
            }
            PostType::Post | PostType::Custom(_) => flags.single = true,
        }

        ResolvedQuery::new(flags, QueriedObject::Entity(entity))
    }

    fn resolve_term(&self, taxonomy: &str, slug: &str) -> Result<ResolvedQuery> {
        if self.registry.taxonomy(taxonomy).is_none() {
            return Err(PressError::UnknownTaxonomy {
                taxonomy: taxonomy.to_string(),
            });
        }

        let term = self
            .repo
            .find_term(taxonomy, slug)?
            .ok_or_else(|| PressError::TermNotFound {
                taxonomy: taxonomy.to_string(),
                slug: slug.to_string(),
            })?;

        let mut flags = QueryFlags {
            archive: true,
            ..Default::default()
        };
        match taxonomy {
            CATEGORY => flags.category = true,
            POST_TAG => flags.tag = true,
            _ => flags.tax = true,
        }
        Ok(ResolvedQuery::new(flags, QueriedObject::Term(term)))
    }

    fn resolve_named(&self, post_type: Option<&str>, name: &str, date: &DateArchive) -> Result<ResolvedQuery> {
        let post_type = post_type.map(PostType::from).unwrap_or(PostType::Post);
        let descriptor = self.registry.resolve_post_type(&post_type);

        let entity = if descriptor.hierarchical {
            self.walk_path(&post_type, name)?
        } else {
            self.repo.find_entity(&post_type, &EntityFilter::slug(name))?
        };

        let entity = entity
            .filter(|e| e.published_on(date.year, date.month, date.day))
            .ok_or_else(|| PressError::not_found(format!("{} '{}'", post_type, name)))?;

        Ok(self.classify_entity(entity))
    }

    fn resolve_author(&self, nicename: &str) -> Result<ResolvedQuery> {
        let author = self
            .repo
            .find_author(nicename)?
            .ok_or_else(|| PressError::AuthorNotFound {
                nicename: nicename.to_string(),
            })?;
        Ok(ResolvedQuery::new(
            QueryFlags {
                author: true,
                archive: true,
                ..Default::default()
            },
            QueriedObject::Author(author),
        ))
    }

    fn resolve_post_type_archive(&self, name: &str) -> Result<ResolvedQuery> {
        let descriptor = self
            .registry
            .post_type(name)
            .filter(|d| d.public)
            .ok_or_else(|| PressError::not_found(format!("post type '{}'", name)))?;

        let mut flags = QueryFlags::default();
        if descriptor.name == "post" {
            flags.home = true;
        } else {
            flags.archive = true;
            flags.post_type_archive = descriptor.has_archive;
        }
        Ok(ResolvedQuery::new(flags, QueriedObject::PostType(descriptor.clone())))
    }

    /// Disambiguate a bare permalink path
    fn resolve_slug(&self, path: &str) -> Result<ResolvedQuery> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if let [slug] = segments.as_slice() {
            if let Some(descriptor) = self
                .registry
                .post_type_for_rewrite(slug)
                .filter(|d| d.has_archive)
            {
                return Ok(ResolvedQuery::new(
                    QueryFlags {
                        post_type_archive: true,
                        archive: true,
                        ..Default::default()
                    },
                    QueriedObject::PostType(descriptor.clone()),
                ));
            }

            for taxonomy in self.registry.taxonomies().filter(|t| t.public) {
                if self.repo.find_term(&taxonomy.name, slug)?.is_some() {
                    tracing::debug!("Slug '{}' matched a term of '{}'", slug, taxonomy.name);
                    return self.resolve_term(&taxonomy.name, slug);
                }
            }

            for post_type in [PostType::Attachment, PostType::Post] {
                if let Some(entity) = self.repo.find_entity(&post_type, &EntityFilter::slug(*slug))? {
                    return Ok(self.classify_entity(entity));
                }
            }
        }

        match self.walk_path(&PostType::Page, path)? {
            Some(page) => Ok(self.classify_entity(page)),
            None => Err(PressError::not_found(format!("'{}'", path))),
        }
    }

    fn resolve_root(&self) -> Result<ResolvedQuery> {
        if self.config.show_on_front == ShowOnFront::Page {
            if let Some(page_id) = self.config.page_on_front {
                match self.repo.find_by_id(page_id)? {
                    Some(page) if page.post_type == PostType::Page => {
                        return Ok(self.classify_entity(page));
                    }
                    _ => tracing::warn!(
                        "Static front page {} does not exist; showing the posts home",
                        page_id
                    ),
                }
            }
        }

        Ok(ResolvedQuery::new(
            QueryFlags {
                front_page: true,
                home: true,
                ..Default::default()
            },
            QueriedObject::Nothing,
        ))
    }

    /// Follow a `/`-separated slug path down the parent chain
    ///
    /// The first segment must be a top-level entity and each following one a
    /// direct child of the previous.
    fn walk_path(&self, post_type: &PostType, path: &str) -> Result<Option<ContentEntity>> {
        let mut current: Option<ContentEntity> = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let filter = match &current {
                None => EntityFilter::slug(segment).root(),
                Some(parent) => EntityFilter::slug(segment).child_of(parent.id),
            };
            match self.repo.find_entity(post_type, &filter)? {
                Some(entity) => current = Some(entity),
                None => return Ok(None),
            }
        }
        Ok(current)
    }
}
