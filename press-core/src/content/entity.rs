//! Content entity and revision types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Meta key holding a page template assignment
pub const PAGE_TEMPLATE_META: &str = "_wp_page_template";

/// Post type tag carried by every entity
///
/// Serialized as its plain name (`"post"`, `"page"`, `"attachment"`, or the
/// custom type name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostType {
    Post,
    Page,
    Attachment,
    Custom(String),
}

impl PostType {
    /// The registered name of this type
    pub fn name(&self) -> &str {
        match self {
            PostType::Post => "post",
            PostType::Page => "page",
            PostType::Attachment => "attachment",
            PostType::Custom(name) => name,
        }
    }

    /// Whether this is one of the types every site has
    pub fn is_builtin(&self) -> bool {
        !matches!(self, PostType::Custom(_))
    }
}

impl From<&str> for PostType {
    fn from(name: &str) -> Self {
        match name {
            "post" => PostType::Post,
            "page" => PostType::Page,
            "attachment" => PostType::Attachment,
            other => PostType::Custom(other.to_string()),
        }
    }
}

impl From<String> for PostType {
    fn from(name: String) -> Self {
        PostType::from(name.as_str())
    }
}

impl From<PostType> for String {
    fn from(post_type: PostType) -> Self {
        post_type.name().to_string()
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Publication status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Publish,
    Private,
    Draft,
}

/// Multi-valued string metadata (`meta_key` → values)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Vec<String>>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(|s| s.as_str())
    }

    /// All values stored under `key`
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = Metadata::new();
        for (key, value) in iter {
            meta.add(key, value);
        }
        meta
    }
}

/// A content item: post, page, attachment, or custom post type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    /// Unique identifier
    pub id: u64,

    /// Post type tag
    pub post_type: PostType,

    /// Publication status
    #[serde(default)]
    pub status: PostStatus,

    /// URL slug (single path segment)
    pub slug: String,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Display body
    #[serde(default)]
    pub content: String,

    /// Display excerpt
    #[serde(default)]
    pub excerpt: String,

    /// Parent entity for hierarchical types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,

    /// Publish timestamp
    pub published_at: DateTime<Utc>,

    /// Locale of this variant (e.g. "en", "fr")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Source entity this one translates; translations share a group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_of: Option<u64>,

    /// MIME type, attachments only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Arbitrary key-value metadata
    #[serde(default)]
    pub meta: Metadata,

    /// Owning author
    #[serde(default)]
    pub author_id: u64,
}

impl ContentEntity {
    /// Create a published entity with empty display fields
    pub fn new(id: u64, post_type: impl Into<PostType>, slug: impl Into<String>) -> Self {
        Self {
            id,
            post_type: post_type.into(),
            status: PostStatus::Publish,
            slug: slug.into(),
            title: String::new(),
            content: String::new(),
            excerpt: String::new(),
            parent: None,
            published_at: Utc::now(),
            locale: None,
            translation_of: None,
            mime_type: None,
            meta: Metadata::new(),
            author_id: 0,
        }
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Mark this entity as a translation of `source_id`
    pub fn translation_of(mut self, source_id: u64) -> Self {
        self.translation_of = Some(source_id);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.add(key, value);
        self
    }

    pub fn with_author(mut self, author_id: u64) -> Self {
        self.author_id = author_id;
        self
    }

    /// Identifier shared by every translation of the same content
    pub fn translation_group(&self) -> u64 {
        self.translation_of.unwrap_or(self.id)
    }

    pub fn is_private(&self) -> bool {
        self.status == PostStatus::Private
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Publish
    }

    /// Assigned page template, if any
    ///
    /// The placeholder value `default` and empty values mean "no override".
    pub fn page_template(&self) -> Option<&str> {
        self.meta
            .get(PAGE_TEMPLATE_META)
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "default")
    }

    /// Whether the publish date matches every given component
    pub fn published_on(&self, year: Option<i32>, month: Option<u32>, day: Option<u32>) -> bool {
        let date = self.published_at.date_naive();
        year.map_or(true, |y| date.year() == y)
            && month.map_or(true, |m| date.month() == m)
            && day.map_or(true, |d| date.day() == d)
    }
}

/// Immutable snapshot of an entity's display fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision identifier (the value carried by preview URLs)
    pub id: u64,

    /// Entity this revision was taken from
    pub parent_id: u64,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub excerpt: String,

    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
}

impl Revision {
    pub fn new(id: u64, parent_id: u64) -> Self {
        Self {
            id,
            parent_id,
            title: String::new(),
            content: String::new(),
            excerpt: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn belongs_to(&self, entity: &ContentEntity) -> bool {
        self.parent_id == entity.id
    }

    /// Copy of `entity` showing this revision's display fields
    ///
    /// Identity, hierarchy, and routing fields stay those of `entity`.
    pub fn apply_to(&self, entity: &ContentEntity) -> ContentEntity {
        ContentEntity {
            title: self.title.clone(),
            content: self.content.clone(),
            excerpt: self.excerpt.clone(),
            ..entity.clone()
        }
    }
}
