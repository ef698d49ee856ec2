//! In-memory content repository and JSON site fixtures

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::{ContentRepository, EntityFilter};
use crate::config::SiteConfig;
use crate::content::{Author, ContentEntity, PostType, RegistryManifest, Revision, TaxonomyTerm};
use crate::error::{PressError, Result};

#[derive(Debug, Default)]
struct ContentStore {
    /// Entities by id (ordered, so lookups are deterministic)
    entities: BTreeMap<u64, ContentEntity>,
    /// Revisions by revision id
    revisions: BTreeMap<u64, Revision>,
    /// Terms in insertion order
    terms: Vec<TaxonomyTerm>,
    /// Authors in insertion order
    authors: Vec<Author>,
}

/// In-memory repository
///
/// Thread-safe via RwLock. Content is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: RwLock<ContentStore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository holding everything in `fixture`
    pub fn from_fixture(fixture: &SiteFixture) -> Result<Self> {
        let repo = Self::new();
        for entity in &fixture.entities {
            repo.insert_entity(entity.clone())?;
        }
        for revision in &fixture.revisions {
            repo.insert_revision(revision.clone())?;
        }
        for term in &fixture.terms {
            repo.insert_term(term.clone())?;
        }
        for author in &fixture.authors {
            repo.insert_author(author.clone())?;
        }
        Ok(repo)
    }

    /// Insert or replace an entity
    pub fn insert_entity(&self, entity: ContentEntity) -> Result<()> {
        let mut store = self.store.write().map_err(|_| PressError::RepositoryLocked)?;
        store.entities.insert(entity.id, entity);
        Ok(())
    }

    /// Insert or replace a revision
    pub fn insert_revision(&self, revision: Revision) -> Result<()> {
        let mut store = self.store.write().map_err(|_| PressError::RepositoryLocked)?;
        store.revisions.insert(revision.id, revision);
        Ok(())
    }

    /// Insert or replace a term (keyed by taxonomy and id)
    pub fn insert_term(&self, term: TaxonomyTerm) -> Result<()> {
        let mut store = self.store.write().map_err(|_| PressError::RepositoryLocked)?;
        store
            .terms
            .retain(|t| !(t.id == term.id && t.taxonomy == term.taxonomy));
        store.terms.push(term);
        Ok(())
    }

    /// Insert or replace an author
    pub fn insert_author(&self, author: Author) -> Result<()> {
        let mut store = self.store.write().map_err(|_| PressError::RepositoryLocked)?;
        store.authors.retain(|a| a.id != author.id);
        store.authors.push(author);
        Ok(())
    }

    /// Number of stored entities
    pub fn entity_count(&self) -> usize {
        self.store.read().map(|s| s.entities.len()).unwrap_or(0)
    }
}

impl ContentRepository for InMemoryRepository {
    fn find_entity(&self, post_type: &PostType, filter: &EntityFilter) -> Result<Option<ContentEntity>> {
        let store = self.store.read().map_err(|_| PressError::RepositoryLocked)?;
        Ok(store
            .entities
            .values()
            .find(|e| &e.post_type == post_type && filter.matches(e))
            .cloned())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<ContentEntity>> {
        let store = self.store.read().map_err(|_| PressError::RepositoryLocked)?;
        Ok(store.entities.get(&id).cloned())
    }

    fn find_ancestors(&self, entity: &ContentEntity) -> Result<Vec<ContentEntity>> {
        let store = self.store.read().map_err(|_| PressError::RepositoryLocked)?;

        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([entity.id]);
        let mut next = entity.parent;
        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                return Err(PressError::RepositoryError {
                    reason: format!("parent cycle detected at entity {}", parent_id),
                });
            }
            let Some(parent) = store.entities.get(&parent_id) else {
                break;
            };
            next = parent.parent;
            ancestors.push(parent.clone());
        }

        ancestors.reverse();
        Ok(ancestors)
    }

    fn find_siblings_by_locale(&self, entity: &ContentEntity, locale: &str) -> Result<Option<ContentEntity>> {
        let store = self.store.read().map_err(|_| PressError::RepositoryLocked)?;
        let group = entity.translation_group();
        Ok(store
            .entities
            .values()
            .find(|e| {
                e.post_type == entity.post_type
                    && e.translation_group() == group
                    && e.locale.as_deref() == Some(locale)
            })
            .cloned())
    }

    fn find_revision(&self, entity_id: u64, revision_id: u64) -> Result<Option<Revision>> {
        let store = self.store.read().map_err(|_| PressError::RepositoryLocked)?;
        Ok(store
            .revisions
            .get(&revision_id)
            .filter(|r| r.parent_id == entity_id)
            .cloned())
    }

    fn find_term(&self, taxonomy: &str, slug: &str) -> Result<Option<TaxonomyTerm>> {
        let store = self.store.read().map_err(|_| PressError::RepositoryLocked)?;
        Ok(store
            .terms
            .iter()
            .find(|t| t.taxonomy == taxonomy && t.slug == slug)
            .cloned())
    }

    fn find_author(&self, nicename: &str) -> Result<Option<Author>> {
        let store = self.store.read().map_err(|_| PressError::RepositoryLocked)?;
        Ok(store.authors.iter().find(|a| a.nicename == nicename).cloned())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

/// A whole site in one JSON document: settings, registrations, and content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFixture {
    #[serde(default)]
    pub config: SiteConfig,

    #[serde(default)]
    pub registry: RegistryManifest,

    #[serde(default)]
    pub entities: Vec<ContentEntity>,

    #[serde(default)]
    pub revisions: Vec<Revision>,

    #[serde(default)]
    pub terms: Vec<TaxonomyTerm>,

    #[serde(default)]
    pub authors: Vec<Author>,
}

impl SiteFixture {
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: SiteFixture = serde_json::from_str(json)?;
        fixture.config.validate().map_err(|errors| PressError::InvalidConfig {
            reason: errors.join("; "),
        })?;
        Ok(fixture)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PressError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}
