//! Site configuration
//!
//! A [`SiteConfig`] is loaded once at startup (JSON file or string), validated,
//! and then shared read-only as `Arc<SiteConfig>` with every resolver.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PressError, Result};

/// What the site root shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowOnFront {
    /// Latest posts listing
    #[default]
    Posts,
    /// A static page (`page_on_front`)
    Page,
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// What the site root shows
    #[serde(default)]
    pub show_on_front: ShowOnFront,

    /// Static front page, used when `show_on_front` is `page`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_on_front: Option<u64>,

    /// Page that hosts the posts listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_for_posts: Option<u64>,

    /// Privacy policy page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_for_privacy_policy: Option<u64>,

    /// Multi-language settings
    #[serde(default)]
    pub multilang: MultilangConfig,

    /// Permalink prefixes
    #[serde(default)]
    pub permalinks: PermalinkConfig,

    /// Secret used to sign revision preview tokens
    #[serde(default)]
    pub revision_key: String,

    /// View rendered when every candidate is missing
    #[serde(default = "default_view")]
    pub default_view: String,

    /// Where denied requests are sent
    #[serde(default = "default_safe_redirect")]
    pub safe_redirect: String,

    /// User-facing messages by locale
    #[serde(default)]
    pub messages: BTreeMap<String, MessageCatalog>,
}

fn default_view() -> String {
    "index".to_string()
}

fn default_safe_redirect() -> String {
    "/".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            show_on_front: ShowOnFront::Posts,
            page_on_front: None,
            page_for_posts: None,
            page_for_privacy_policy: None,
            multilang: MultilangConfig::default(),
            permalinks: PermalinkConfig::default(),
            revision_key: String::new(),
            default_view: default_view(),
            safe_redirect: default_safe_redirect(),
            messages: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Create a new configuration builder
    pub fn builder() -> SiteConfigBuilder {
        SiteConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SiteConfig = serde_json::from_str(json).map_err(|e| PressError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate().map_err(|errors| PressError::InvalidConfig {
            reason: errors.join("; "),
        })?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PressError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Check cross-field consistency, collecting every problem
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.show_on_front == ShowOnFront::Page && self.page_on_front.is_none() {
            errors.push("show_on_front is 'page' but page_on_front is not set".to_string());
        }
        if self.page_on_front.is_some() && self.page_on_front == self.page_for_posts {
            errors.push("page_on_front and page_for_posts must differ".to_string());
        }
        if self.default_view.trim().is_empty() {
            errors.push("default_view cannot be empty".to_string());
        }
        if !self.safe_redirect.starts_with('/') {
            errors.push("safe_redirect must be a site-relative path".to_string());
        }
        if self.multilang.enabled {
            if self.multilang.locales.is_empty() {
                errors.push("multilang is enabled but no locales are listed".to_string());
            }
            if !self.multilang.locales.contains(&self.multilang.default_locale) {
                errors.push(format!(
                    "default locale '{}' is not among the configured locales",
                    self.multilang.default_locale
                ));
            }
        }
        for (name, base) in [
            ("category_base", &self.permalinks.category_base),
            ("tag_base", &self.permalinks.tag_base),
            ("author_base", &self.permalinks.author_base),
        ] {
            if base.is_empty() || base.contains('/') {
                errors.push(format!("{} must be a single non-empty path segment", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Whether `page_id` is the static front page currently in effect
    pub fn is_static_front(&self, page_id: u64) -> bool {
        self.show_on_front == ShowOnFront::Page && self.page_on_front == Some(page_id)
    }

    /// Whether `page_id` hosts the posts listing
    ///
    /// Only meaningful while a static page holds the site root.
    pub fn is_posts_page(&self, page_id: u64) -> bool {
        self.show_on_front == ShowOnFront::Page && self.page_for_posts == Some(page_id)
    }

    /// Messages for `locale`, falling back to the default locale, then English
    pub fn messages_for(&self, locale: Option<&str>) -> MessageCatalog {
        locale
            .and_then(|l| self.messages.get(l))
            .or_else(|| self.messages.get(&self.multilang.default_locale))
            .cloned()
            .unwrap_or_default()
    }
}

/// Multi-language settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultilangConfig {
    /// Whether translated siblings are routed by locale
    #[serde(default)]
    pub enabled: bool,

    /// Locale of untagged content
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Locales the site serves
    #[serde(default)]
    pub locales: Vec<String>,

    /// Query parameter carrying the locale on redirects
    #[serde(default = "default_locale_param")]
    pub locale_param: String,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_locale_param() -> String {
    "lang".to_string()
}

impl Default for MultilangConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_locale: default_locale(),
            locales: vec![],
            locale_param: default_locale_param(),
        }
    }
}

/// Permalink prefixes for built-in archives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermalinkConfig {
    #[serde(default = "default_category_base")]
    pub category_base: String,

    #[serde(default = "default_tag_base")]
    pub tag_base: String,

    #[serde(default = "default_author_base")]
    pub author_base: String,
}

fn default_category_base() -> String {
    "category".to_string()
}

fn default_tag_base() -> String {
    "tag".to_string()
}

fn default_author_base() -> String {
    "author".to_string()
}

impl Default for PermalinkConfig {
    fn default() -> Self {
        Self {
            category_base: default_category_base(),
            tag_base: default_tag_base(),
            author_base: default_author_base(),
        }
    }
}

/// User-facing messages for one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCatalog {
    #[serde(default = "default_not_found")]
    pub not_found: String,

    #[serde(default = "default_unauthorized")]
    pub unauthorized: String,

    #[serde(default = "default_invalid_date")]
    pub invalid_date: String,
}

fn default_not_found() -> String {
    "Sorry, the page you were looking for could not be found.".to_string()
}

fn default_unauthorized() -> String {
    "You are not allowed to view this content.".to_string()
}

fn default_invalid_date() -> String {
    "The requested date is not valid.".to_string()
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            not_found: default_not_found(),
            unauthorized: default_unauthorized(),
            invalid_date: default_invalid_date(),
        }
    }
}

/// Builder for SiteConfig
#[derive(Debug, Default)]
pub struct SiteConfigBuilder {
    config: SiteConfig,
}

impl SiteConfigBuilder {
    /// Show a static page at the site root
    pub fn static_front_page(mut self, page_id: u64) -> Self {
        self.config.show_on_front = ShowOnFront::Page;
        self.config.page_on_front = Some(page_id);
        self
    }

    /// Host the posts listing on a page
    pub fn posts_page(mut self, page_id: u64) -> Self {
        self.config.page_for_posts = Some(page_id);
        self
    }

    pub fn privacy_policy_page(mut self, page_id: u64) -> Self {
        self.config.page_for_privacy_policy = Some(page_id);
        self
    }

    /// Enable multi-language routing for the given locales
    pub fn multilang(mut self, default_locale: &str, locales: &[&str]) -> Self {
        self.config.multilang.enabled = true;
        self.config.multilang.default_locale = default_locale.to_string();
        self.config.multilang.locales = locales.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn revision_key(mut self, key: impl Into<String>) -> Self {
        self.config.revision_key = key.into();
        self
    }

    pub fn default_view(mut self, view: impl Into<String>) -> Self {
        self.config.default_view = view.into();
        self
    }

    pub fn category_base(mut self, base: impl Into<String>) -> Self {
        self.config.permalinks.category_base = base.into();
        self
    }

    pub fn messages(mut self, locale: impl Into<String>, catalog: MessageCatalog) -> Self {
        self.config.messages.insert(locale.into(), catalog);
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<SiteConfig> {
        self.config
            .validate()
            .map_err(|errors| PressError::InvalidConfig {
                reason: errors.join("; "),
            })?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.show_on_front, ShowOnFront::Posts);
        assert_eq!(config.default_view, "index");
        assert_eq!(config.permalinks.tag_base, "tag");
        assert!(!config.multilang.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SiteConfig::from_json(
            r#"{
                "show_on_front": "page",
                "page_on_front": 2,
                "multilang": {"enabled": true, "locales": ["en", "fr"]}
            }"#,
        )
        .unwrap();

        assert!(config.is_static_front(2));
        assert!(!config.is_static_front(3));
        assert_eq!(config.multilang.default_locale, "en");
        assert_eq!(config.multilang.locale_param, "lang");
        assert_eq!(config.permalinks.category_base, "category");
    }

    #[test]
    fn test_validation_collects_errors() {
        let err = SiteConfig::from_json(
            r#"{"show_on_front": "page", "default_view": "", "safe_redirect": "https://evil"}"#,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("page_on_front"));
        assert!(msg.contains("default_view"));
        assert!(msg.contains("safe_redirect"));
    }

    #[test]
    fn test_builder_rejects_missing_default_locale() {
        let err = SiteConfig::builder().multilang("de", &["en", "fr"]).build().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_special_pages_follow_show_on_front() {
        let posts = SiteConfig::builder().posts_page(5).build().unwrap();
        assert!(!posts.is_posts_page(5));

        let static_front = SiteConfig::builder().static_front_page(4).posts_page(5).build().unwrap();
        assert!(static_front.is_static_front(4));
        assert!(static_front.is_posts_page(5));
        assert!(!static_front.is_posts_page(4));
    }

    #[test]
    fn test_messages_fall_back() {
        let french = MessageCatalog {
            not_found: "Page introuvable.".to_string(),
            ..MessageCatalog::default()
        };
        let config = SiteConfig::builder()
            .multilang("en", &["en", "fr"])
            .messages("fr", french.clone())
            .build()
            .unwrap();

        assert_eq!(config.messages_for(Some("fr")), french);
        assert_eq!(config.messages_for(Some("de")), MessageCatalog::default());
        assert_eq!(config.messages_for(None), MessageCatalog::default());
    }
}
