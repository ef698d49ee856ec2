//! Permalinks for entities
//!
//! The inverse of [`RequestParser`]. A pretty path like `/news/` can belong to
//! a term, an attachment, or an archive as well as a post, so
//! [`PermalinkBuilder::canonical_path`] only hands out a pretty path after it
//! resolves back to the same entity, and otherwise falls back to the query form.

use crate::config::SiteConfig;
use crate::content::{ContentEntity, ContentRegistry, PostType};
use crate::error::Result;
use crate::query::{QueryResolver, RequestParser};
use crate::repository::ContentRepository;

pub struct PermalinkBuilder<'a> {
    registry: &'a ContentRegistry,
    config: &'a SiteConfig,
}

impl<'a> PermalinkBuilder<'a> {
    pub fn new(registry: &'a ContentRegistry, config: &'a SiteConfig) -> Self {
        Self { registry, config }
    }

    /// Path that resolves back to `entity`, given its ancestors (root first)
    pub fn canonical_path(
        &self,
        entity: &ContentEntity,
        ancestors: &[ContentEntity],
        repo: &dyn ContentRepository,
    ) -> Result<String> {
        let pretty = self.entity_path(entity, ancestors);
        let resolved = RequestParser::new(self.registry, self.config)
            .parse::<&str, &str>(&pretty, &[])
            .and_then(|request| QueryResolver::new(repo, self.registry, self.config).resolve(&request));

        match resolved {
            Ok(r) if r.entity().map(|e| e.id) == Some(entity.id) => return Ok(pretty),
            Ok(r) => tracing::debug!(
                "'{}' resolves to '{}', not entity {}; linking by query",
                pretty,
                r.state,
                entity.id
            ),
            Err(e) if e.is_server_error() => return Err(e),
            Err(e) => tracing::debug!("'{}' does not resolve to entity {}: {}", pretty, entity.id, e),
        }
        Ok(self.query_path(entity, ancestors))
    }

    /// Query-string path naming `entity` by type and slug path
    pub fn query_path(&self, entity: &ContentEntity, ancestors: &[ContentEntity]) -> String {
        let mut segments: Vec<&str> = Vec::new();
        if self.registry.resolve_post_type(&entity.post_type).hierarchical {
            segments.extend(ancestors.iter().map(|a| a.slug.as_str()));
        }
        segments.push(&entity.slug);
        let path = segments.join("/");

        match &entity.post_type {
            PostType::Post => format!("/?name={}", path),
            PostType::Page => format!("/?pagename={}", path),
            other => format!("/?post_type={}&name={}", other.name(), path),
        }
    }

    /// Pretty path of `entity`, given its ancestors (root first)
    pub fn entity_path(&self, entity: &ContentEntity, ancestors: &[ContentEntity]) -> String {
        if entity.post_type == PostType::Page && self.config.is_static_front(entity.id) {
            return "/".to_string();
        }

        let mut segments: Vec<&str> = Vec::new();
        let descriptor = self.registry.resolve_post_type(&entity.post_type);
        let is_custom = matches!(entity.post_type, PostType::Custom(_))
            && self.registry.is_registered(entity.post_type.name());
        if is_custom {
            segments.push(descriptor.rewrite_base());
        }
        if descriptor.hierarchical {
            segments.extend(ancestors.iter().map(|a| a.slug.as_str()));
        }
        segments.push(&entity.slug);

        format!("/{}/", segments.join("/"))
    }

    /// `path` with the locale query parameter appended
    pub fn localized(&self, path: &str, locale: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{}{}{}={}", path, separator, self.config.multilang.locale_param, locale)
    }
}
