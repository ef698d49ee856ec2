//! Post type and taxonomy registry
//!
//! The registry is assembled once at startup from the built-in types plus an
//! optional JSON manifest, validated, and then never mutated. Consumers hold
//! it by reference (or behind an `Arc`).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::entity::PostType;
use super::taxonomy::{CATEGORY, POST_TAG};
use crate::error::{PressError, Result};

/// Post type names: lowercase, digits, dash, underscore, at most 20 chars
const POST_TYPE_NAME_PATTERN: &str = r"^[a-z0-9_-]{1,20}$";

/// Taxonomy names: same alphabet, at most 32 chars
const TAXONOMY_NAME_PATTERN: &str = r"^[a-z0-9_-]{1,32}$";

/// Rewrite slugs are a single URL segment
const REWRITE_SLUG_PATTERN: &str = r"^[a-z0-9_-]+$";

fn default_true() -> bool {
    true
}

/// Feature a post type supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Support {
    Title,
    Editor,
    Excerpt,
    Author,
    Thumbnail,
    Comments,
    Revisions,
    PageAttributes,
}

/// Static capability descriptor for a post type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTypeDescriptor {
    /// Registered name (e.g. "post", "book")
    pub name: String,

    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Whether entities of this type are routable
    #[serde(default = "default_true")]
    pub public: bool,

    /// Whether entities nest under parents (resolved by slug path)
    #[serde(default)]
    pub hierarchical: bool,

    /// Whether the type has its own archive listing
    #[serde(default)]
    pub has_archive: bool,

    /// URL prefix; defaults to the type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_slug: Option<String>,

    /// Supported editing features
    #[serde(default)]
    pub supports: Vec<Support>,
}

impl PostTypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            public: true,
            hierarchical: false,
            has_archive: false,
            rewrite_slug: None,
            supports: vec![Support::Title, Support::Editor],
        }
    }

    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }

    pub fn with_archive(mut self) -> Self {
        self.has_archive = true;
        self
    }

    pub fn with_rewrite(mut self, slug: impl Into<String>) -> Self {
        self.rewrite_slug = Some(slug.into());
        self
    }

    pub fn with_supports(mut self, supports: Vec<Support>) -> Self {
        self.supports = supports;
        self
    }

    /// URL prefix used in permalinks
    pub fn rewrite_base(&self) -> &str {
        self.rewrite_slug.as_deref().unwrap_or(&self.name)
    }

    pub fn supports(&self, feature: Support) -> bool {
        self.supports.contains(&feature)
    }
}

/// Static descriptor for a taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDescriptor {
    /// Registered name (e.g. "category", "genre")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default = "default_true")]
    pub public: bool,

    #[serde(default)]
    pub hierarchical: bool,

    /// URL prefix; defaults to the taxonomy name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_slug: Option<String>,

    /// Post types this taxonomy classifies
    #[serde(default)]
    pub object_types: Vec<String>,
}

impl TaxonomyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            public: true,
            hierarchical: false,
            rewrite_slug: None,
            object_types: vec![],
        }
    }

    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }

    pub fn with_rewrite(mut self, slug: impl Into<String>) -> Self {
        self.rewrite_slug = Some(slug.into());
        self
    }

    pub fn for_types(mut self, types: &[&str]) -> Self {
        self.object_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn rewrite_base(&self) -> &str {
        self.rewrite_slug.as_deref().unwrap_or(&self.name)
    }
}

/// Registration manifest as loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    #[serde(default)]
    pub post_types: Vec<PostTypeDescriptor>,

    #[serde(default)]
    pub taxonomies: Vec<TaxonomyDescriptor>,
}

/// Builder collecting registrations before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    post_types: Vec<PostTypeDescriptor>,
    taxonomies: Vec<TaxonomyDescriptor>,
}

impl RegistryBuilder {
    /// Builder pre-seeded with the built-in post types and taxonomies
    pub fn new() -> Self {
        Self {
            post_types: builtin_post_types(),
            taxonomies: builtin_taxonomies(),
        }
    }

    pub fn post_type(mut self, descriptor: PostTypeDescriptor) -> Self {
        self.post_types.push(descriptor);
        self
    }

    pub fn taxonomy(mut self, descriptor: TaxonomyDescriptor) -> Self {
        self.taxonomies.push(descriptor);
        self
    }

    /// Add every registration from a manifest
    pub fn manifest(mut self, manifest: RegistryManifest) -> Self {
        self.post_types.extend(manifest.post_types);
        self.taxonomies.extend(manifest.taxonomies);
        self
    }

    /// Validate and freeze
    pub fn build(self) -> Result<ContentRegistry> {
        let post_type_name = compile(POST_TYPE_NAME_PATTERN)?;
        let taxonomy_name = compile(TAXONOMY_NAME_PATTERN)?;
        let rewrite_slug = compile(REWRITE_SLUG_PATTERN)?;

        let mut by_post_type = HashMap::new();
        for (idx, descriptor) in self.post_types.iter().enumerate() {
            if !post_type_name.is_match(&descriptor.name) {
                return Err(PressError::InvalidRegistry {
                    reason: format!("invalid post type name '{}'", descriptor.name),
                });
            }
            check_rewrite(&rewrite_slug, &descriptor.name, descriptor.rewrite_slug.as_deref())?;
            if by_post_type.insert(descriptor.name.clone(), idx).is_some() {
                return Err(PressError::AlreadyRegistered {
                    name: descriptor.name.clone(),
                });
            }
        }

        let mut by_taxonomy = HashMap::new();
        for (idx, descriptor) in self.taxonomies.iter().enumerate() {
            if !taxonomy_name.is_match(&descriptor.name) {
                return Err(PressError::InvalidRegistry {
                    reason: format!("invalid taxonomy name '{}'", descriptor.name),
                });
            }
            check_rewrite(&rewrite_slug, &descriptor.name, descriptor.rewrite_slug.as_deref())?;
            for object_type in &descriptor.object_types {
                if !by_post_type.contains_key(object_type) {
                    return Err(PressError::InvalidRegistry {
                        reason: format!(
                            "taxonomy '{}' references unregistered post type '{}'",
                            descriptor.name, object_type
                        ),
                    });
                }
            }
            if by_taxonomy.insert(descriptor.name.clone(), idx).is_some() {
                return Err(PressError::AlreadyRegistered {
                    name: descriptor.name.clone(),
                });
            }
        }

        let mut by_post_type_rewrite = HashMap::new();
        for (idx, descriptor) in self.post_types.iter().enumerate() {
            if descriptor.public && !is_builtin_post_type(&descriptor.name) {
                by_post_type_rewrite
                    .entry(descriptor.rewrite_base().to_string())
                    .or_insert(idx);
            }
        }

        let mut by_taxonomy_rewrite = HashMap::new();
        for (idx, descriptor) in self.taxonomies.iter().enumerate() {
            if descriptor.public {
                by_taxonomy_rewrite
                    .entry(descriptor.rewrite_base().to_string())
                    .or_insert(idx);
            }
        }

        let fallback = by_post_type
            .get("post")
            .map(|idx| self.post_types[*idx].clone())
            .ok_or_else(|| PressError::InvalidRegistry {
                reason: "the 'post' type must stay registered".to_string(),
            })?;

        Ok(ContentRegistry {
            post_types: self.post_types,
            by_post_type,
            taxonomies: self.taxonomies,
            by_taxonomy,
            by_post_type_rewrite,
            by_taxonomy_rewrite,
            fallback,
        })
    }
}

fn is_builtin_post_type(name: &str) -> bool {
    matches!(name, "post" | "page" | "attachment")
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PressError::InternalError {
        reason: e.to_string(),
    })
}

fn check_rewrite(pattern: &Regex, owner: &str, slug: Option<&str>) -> Result<()> {
    match slug {
        Some(slug) if !pattern.is_match(slug) => Err(PressError::InvalidRegistry {
            reason: format!("invalid rewrite slug '{}' for '{}'", slug, owner),
        }),
        _ => Ok(()),
    }
}

fn builtin_post_types() -> Vec<PostTypeDescriptor> {
    vec![
        PostTypeDescriptor::new("post").with_supports(vec![
            Support::Title,
            Support::Editor,
            Support::Excerpt,
            Support::Author,
            Support::Thumbnail,
            Support::Comments,
            Support::Revisions,
        ]),
        PostTypeDescriptor::new("page").hierarchical().with_supports(vec![
            Support::Title,
            Support::Editor,
            Support::Author,
            Support::Thumbnail,
            Support::Revisions,
            Support::PageAttributes,
        ]),
        PostTypeDescriptor::new("attachment").with_supports(vec![Support::Title, Support::Author]),
    ]
}

fn builtin_taxonomies() -> Vec<TaxonomyDescriptor> {
    vec![
        TaxonomyDescriptor::new(CATEGORY)
            .hierarchical()
            .with_rewrite("category")
            .for_types(&["post"]),
        TaxonomyDescriptor::new(POST_TAG)
            .with_rewrite("tag")
            .for_types(&["post"]),
    ]
}

/// Immutable lookup table of post types and taxonomies
#[derive(Debug, Clone)]
pub struct ContentRegistry {
    /// Post types in registration order
    post_types: Vec<PostTypeDescriptor>,

    /// Index by post type name
    by_post_type: HashMap<String, usize>,

    /// Taxonomies in registration order
    taxonomies: Vec<TaxonomyDescriptor>,

    /// Index by taxonomy name
    by_taxonomy: HashMap<String, usize>,

    /// Public custom post types by URL prefix, first registration wins
    by_post_type_rewrite: HashMap<String, usize>,

    /// Public taxonomies by URL prefix, first registration wins
    by_taxonomy_rewrite: HashMap<String, usize>,

    /// Descriptor used for unregistered post types
    fallback: PostTypeDescriptor,
}

impl ContentRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding only the built-in types
    pub fn with_builtins() -> Result<Self> {
        RegistryBuilder::new().build()
    }

    /// Built-ins plus the registrations of a JSON manifest
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: RegistryManifest =
            serde_json::from_str(json).map_err(|e| PressError::InvalidRegistry {
                reason: e.to_string(),
            })?;
        RegistryBuilder::new().manifest(manifest).build()
    }

    /// Built-ins plus the registrations of a JSON manifest file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PressError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Registered descriptor for `name`
    pub fn post_type(&self, name: &str) -> Option<&PostTypeDescriptor> {
        self.by_post_type.get(name).map(|idx| &self.post_types[*idx])
    }

    /// Descriptor driving behaviour for `post_type`
    ///
    /// Unregistered custom types get the `post` descriptor.
    pub fn resolve_post_type(&self, post_type: &PostType) -> &PostTypeDescriptor {
        self.post_type(post_type.name()).unwrap_or(&self.fallback)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.by_post_type.contains_key(name)
    }

    pub fn taxonomy(&self, name: &str) -> Option<&TaxonomyDescriptor> {
        self.by_taxonomy.get(name).map(|idx| &self.taxonomies[*idx])
    }

    /// Post types in registration order
    pub fn post_types(&self) -> impl Iterator<Item = &PostTypeDescriptor> {
        self.post_types.iter()
    }

    /// Taxonomies in registration order
    pub fn taxonomies(&self) -> impl Iterator<Item = &TaxonomyDescriptor> {
        self.taxonomies.iter()
    }

    /// Public custom post type whose URL prefix is `segment`
    pub fn post_type_for_rewrite(&self, segment: &str) -> Option<&PostTypeDescriptor> {
        self.by_post_type_rewrite.get(segment).map(|idx| &self.post_types[*idx])
    }

    /// Public taxonomy whose URL prefix is `segment`
    pub fn taxonomy_for_rewrite(&self, segment: &str) -> Option<&TaxonomyDescriptor> {
        self.by_taxonomy_rewrite.get(segment).map(|idx| &self.taxonomies[*idx])
    }
}
