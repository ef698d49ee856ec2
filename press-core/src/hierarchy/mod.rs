//! Template Hierarchy Engine
//!
//! Produces the ordered list of candidate view names for a resolved query,
//! most specific first. Every list ends with a generic view, so a theme that
//! ships only the generic views still renders everything.
//!
//! | State              | Candidates                                                       |
//! |--------------------|------------------------------------------------------------------|
//! | front page (posts) | `front-page`, `home`, `index`                                    |
//! | front page (page)  | `front-page`, page chain, `index`                                |
//! | home               | `home`, `index`                                                  |
//! | privacy policy     | `privacy-policy`, page chain                                     |
//! | post type archive  | `archive-{type}`, `archive`                                      |
//! | taxonomy           | `{taxonomy}-{slug}`, `{taxonomy}-{id}`, `{taxonomy}`, `taxonomy`, `archive` |
//! | category / tag     | `category-{slug}`, `category-{id}`, `category`, `taxonomy`, `archive` |
//! | attachment         | `{type}-{subtype}`, `{subtype}`, `{type}`, `attachment`          |
//! | single             | `single-{type}-{slug}`, `single-{type}`, `single`                |
//! | page               | page chain: `{template}`, `page-{slug}`, `page-{id}`, `page`     |
//! | author             | `author-{nicename}`, `author-{id}`, `author`                     |
//! | date               | `date`                                                           |
//! | singular / archive | `singular` / `archive`                                           |
//! | none               | `index`                                                          |

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::content::{ContentEntity, ContentRegistry};
use crate::query::{ContentIdentityState, QueriedObject, ResolvedQuery};

/// Ordered, duplicate-free candidate view names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidates(Vec<String>);

impl Candidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `view` unless it is already listed
    pub fn push(&mut self, view: impl Into<String>) {
        let view = view.into();
        if !view.is_empty() && !self.0.contains(&view) {
            self.0.push(view);
        }
    }

    pub fn extend<I, S>(&mut self, views: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for view in views {
            self.push(view);
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Candidates {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Candidates {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Candidates {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Builds candidate lists
///
/// Pure: the same state and queried object always give the same list.
pub struct TemplateHierarchy<'a> {
    registry: &'a ContentRegistry,
}

impl<'a> TemplateHierarchy<'a> {
    pub fn new(registry: &'a ContentRegistry) -> Self {
        Self { registry }
    }

    /// Candidates for a resolved query
    pub fn for_query(&self, resolved: &ResolvedQuery) -> Candidates {
        self.candidates(resolved.state, &resolved.queried)
    }

    /// Candidates for `state` about `queried`
    pub fn candidates(&self, state: ContentIdentityState, queried: &QueriedObject) -> Candidates {
        let mut list = Candidates::new();
        let entity = match queried {
            QueriedObject::Entity(entity) => Some(entity),
            _ => None,
        };

        match state {
            ContentIdentityState::FrontPage => {
                list.push("front-page");
                match entity {
                    Some(page) => list.extend(self.page_chain(page)),
                    None => list.push("home"),
                }
                list.push("index");
            }
            ContentIdentityState::Home => list.extend(["home", "index"]),
            ContentIdentityState::PrivacyPolicy => {
                list.push("privacy-policy");
                match entity {
                    Some(page) => list.extend(self.page_chain(page)),
                    None => list.push("page"),
                }
            }
            ContentIdentityState::PostTypeArchive => {
                if let QueriedObject::PostType(descriptor) = queried {
                    list.push(format!("archive-{}", descriptor.name));
                }
                list.push("archive");
            }
            ContentIdentityState::TaxonomyArchive
            | ContentIdentityState::Category
            | ContentIdentityState::Tag => {
                let prefix = match state {
                    ContentIdentityState::Category => Some("category"),
                    ContentIdentityState::Tag => Some("tag"),
                    _ => None,
                };
                if let QueriedObject::Term(term) = queried {
                    let prefix = prefix.unwrap_or(term.taxonomy.as_str());
                    list.push(format!("{}-{}", prefix, term.slug));
                    list.push(format!("{}-{}", prefix, term.id));
                    list.push(prefix);
                } else if let Some(prefix) = prefix {
                    list.push(prefix);
                }
                list.extend(["taxonomy", "archive"]);
            }
            ContentIdentityState::Attachment => {
                if let Some(mime) = entity.and_then(|e| e.mime_type.as_deref()) {
                    match mime.split_once('/') {
                        Some((kind, subtype)) => {
                            list.push(format!("{}-{}", kind, subtype));
                            list.push(subtype);
                            list.push(kind);
                        }
                        None => list.push(mime),
                    }
                }
                list.push("attachment");
            }
            ContentIdentityState::Single => {
                if let Some(entity) = entity {
                    let post_type = &self.registry.resolve_post_type(&entity.post_type).name;
                    list.push(format!("single-{}-{}", post_type, entity.slug));
                    list.push(format!("single-{}", post_type));
                }
                list.push("single");
            }
            ContentIdentityState::Page => match entity {
                Some(page) => list.extend(self.page_chain(page)),
                None => list.push("page"),
            },
            ContentIdentityState::Singular => list.push("singular"),
            ContentIdentityState::Author => {
                if let QueriedObject::Author(author) = queried {
                    list.push(format!("author-{}", author.nicename));
                    list.push(format!("author-{}", author.id));
                }
                list.push("author");
            }
            ContentIdentityState::Date => list.push("date"),
            ContentIdentityState::Archive => list.push("archive"),
            ContentIdentityState::None => list.push("index"),
        }

        tracing::trace!("Hierarchy for '{}': {:?}", state, list);
        list
    }

    /// Template override, then slug, id, and the generic page view
    fn page_chain(&self, page: &ContentEntity) -> Vec<String> {
        let mut chain = Vec::with_capacity(4);
        if let Some(template) = page.page_template() {
            chain.push(template_view_name(template));
        }
        chain.push(format!("page-{}", page.slug));
        chain.push(format!("page-{}", page.id));
        chain.push("page".to_string());
        chain
    }
}

/// `templates/full-width.php` becomes `templates/full-width`
fn template_view_name(template: &str) -> String {
    match template.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem.to_string(),
        _ => template.to_string(),
    }
}
