//! Content identity states and the flags they are derived from

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::{Author, ContentEntity, PostTypeDescriptor, TaxonomyTerm};

/// The single classification a request resolves to
///
/// Variants are declared in precedence order: when several conditions hold
/// for one request, the earliest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentIdentityState {
    FrontPage,
    Home,
    PrivacyPolicy,
    PostTypeArchive,
    TaxonomyArchive,
    Attachment,
    Single,
    Page,
    Singular,
    Category,
    Tag,
    Author,
    Date,
    Archive,
    None,
}

impl ContentIdentityState {
    /// Every state, highest precedence first
    pub const PRECEDENCE: [ContentIdentityState; 15] = [
        ContentIdentityState::FrontPage,
        ContentIdentityState::Home,
        ContentIdentityState::PrivacyPolicy,
        ContentIdentityState::PostTypeArchive,
        ContentIdentityState::TaxonomyArchive,
        ContentIdentityState::Attachment,
        ContentIdentityState::Single,
        ContentIdentityState::Page,
        ContentIdentityState::Singular,
        ContentIdentityState::Category,
        ContentIdentityState::Tag,
        ContentIdentityState::Author,
        ContentIdentityState::Date,
        ContentIdentityState::Archive,
        ContentIdentityState::None,
    ];

    /// First state whose flag is set, or `None` when no flag is
    pub fn from_flags(flags: &QueryFlags) -> Self {
        Self::PRECEDENCE
            .into_iter()
            .find(|state| flags.is(*state))
            .unwrap_or(ContentIdentityState::None)
    }

    /// Least specific view name a hierarchy for this state ends with
    pub fn generic_view(self) -> &'static str {
        match self {
            ContentIdentityState::FrontPage
            | ContentIdentityState::Home
            | ContentIdentityState::None => "index",
            ContentIdentityState::PrivacyPolicy | ContentIdentityState::Page => "page",
            ContentIdentityState::PostTypeArchive
            | ContentIdentityState::TaxonomyArchive
            | ContentIdentityState::Category
            | ContentIdentityState::Tag
            | ContentIdentityState::Archive => "archive",
            ContentIdentityState::Attachment => "attachment",
            ContentIdentityState::Single => "single",
            ContentIdentityState::Singular => "singular",
            ContentIdentityState::Author => "author",
            ContentIdentityState::Date => "date",
        }
    }

    /// States that display one entity
    pub fn is_singular(self) -> bool {
        matches!(
            self,
            ContentIdentityState::Attachment
                | ContentIdentityState::Single
                | ContentIdentityState::Page
                | ContentIdentityState::Singular
                | ContentIdentityState::PrivacyPolicy
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentIdentityState::FrontPage => "front_page",
            ContentIdentityState::Home => "home",
            ContentIdentityState::PrivacyPolicy => "privacy_policy",
            ContentIdentityState::PostTypeArchive => "post_type_archive",
            ContentIdentityState::TaxonomyArchive => "taxonomy_archive",
            ContentIdentityState::Attachment => "attachment",
            ContentIdentityState::Single => "single",
            ContentIdentityState::Page => "page",
            ContentIdentityState::Singular => "singular",
            ContentIdentityState::Category => "category",
            ContentIdentityState::Tag => "tag",
            ContentIdentityState::Author => "author",
            ContentIdentityState::Date => "date",
            ContentIdentityState::Archive => "archive",
            ContentIdentityState::None => "none",
        }
    }
}

impl fmt::Display for ContentIdentityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditional flags computed for a request
///
/// Several may hold at once (a static front page is also a page); the
/// state is picked from them with [`ContentIdentityState::from_flags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFlags {
    pub front_page: bool,
    pub home: bool,
    pub privacy_policy: bool,
    pub post_type_archive: bool,
    pub tax: bool,
    pub attachment: bool,
    pub single: bool,
    pub page: bool,
    pub singular: bool,
    pub category: bool,
    pub tag: bool,
    pub author: bool,
    pub date: bool,
    pub archive: bool,
}

impl QueryFlags {
    /// Whether the flag backing `state` is set
    pub fn is(&self, state: ContentIdentityState) -> bool {
        match state {
            ContentIdentityState::FrontPage => self.front_page,
            ContentIdentityState::Home => self.home,
            ContentIdentityState::PrivacyPolicy => self.privacy_policy,
            ContentIdentityState::PostTypeArchive => self.post_type_archive,
            ContentIdentityState::TaxonomyArchive => self.tax,
            ContentIdentityState::Attachment => self.attachment,
            ContentIdentityState::Single => self.single,
            ContentIdentityState::Page => self.page,
            ContentIdentityState::Singular => self.singular,
            ContentIdentityState::Category => self.category,
            ContentIdentityState::Tag => self.tag,
            ContentIdentityState::Author => self.author,
            ContentIdentityState::Date => self.date,
            ContentIdentityState::Archive => self.archive,
            ContentIdentityState::None => false,
        }
    }
}

/// Date archive components, already validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateArchive {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl DateArchive {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }
}

/// What the request is about
#[derive(Debug, Clone, PartialEq)]
pub enum QueriedObject {
    /// Listing with no single subject (posts home)
    Nothing,
    Entity(ContentEntity),
    Term(TaxonomyTerm),
    Author(Author),
    PostType(PostTypeDescriptor),
    Date(DateArchive),
}

/// Outcome of query resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub state: ContentIdentityState,
    pub flags: QueryFlags,
    pub queried: QueriedObject,
}

impl ResolvedQuery {
    /// Derive the state from `flags`
    pub fn new(flags: QueryFlags, queried: QueriedObject) -> Self {
        Self {
            state: ContentIdentityState::from_flags(&flags),
            flags,
            queried,
        }
    }

    /// The queried entity, if the request is about one
    pub fn entity(&self) -> Option<&ContentEntity> {
        match &self.queried {
            QueriedObject::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}
