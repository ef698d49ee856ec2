//! Translation & Revision Resolver
//!
//! Given the entity a singular request resolved to, decides which version of
//! it is shown:
//!
//! 1. A translation in the requested locale, reached by redirect
//! 2. A revision snapshot, when the preview token checks out
//! 3. The entity itself
//!
//! A bad or missing preview token never fails the request. The revision is
//! ignored and the published entity is shown.

mod token;

pub use token::RevisionTokenSigner;

use serde::{Deserialize, Serialize};

use crate::config::MultilangConfig;
use crate::content::{ContentEntity, Revision};
use crate::error::{PressError, Result};
use crate::repository::ContentRepository;

/// Variant-related parameters of a request
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantRequest<'r> {
    pub locale: Option<&'r str>,
    pub revision: Option<&'r str>,
    pub token: Option<&'r str>,
}

/// Which version of an entity to show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum VariantOutcome {
    /// Show the entity as resolved
    UseEntity { entity: ContentEntity },

    /// Send the client to the translation in `locale`
    Redirect { target: ContentEntity, locale: String },

    /// Show `revision` in place of `parent`'s display fields
    UseRevision { revision: Revision, parent: ContentEntity },
}

impl VariantOutcome {
    /// Entity whose fields are rendered
    pub fn display_entity(&self) -> ContentEntity {
        match self {
            VariantOutcome::UseEntity { entity } => entity.clone(),
            VariantOutcome::Redirect { target, .. } => target.clone(),
            VariantOutcome::UseRevision { revision, parent } => revision.apply_to(parent),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, VariantOutcome::Redirect { .. })
    }
}

/// Picks translations and revisions
pub struct VariantResolver<'a> {
    repo: &'a dyn ContentRepository,
    multilang: &'a MultilangConfig,
    signer: &'a RevisionTokenSigner,
}

impl<'a> VariantResolver<'a> {
    pub fn new(
        repo: &'a dyn ContentRepository,
        multilang: &'a MultilangConfig,
        signer: &'a RevisionTokenSigner,
    ) -> Self {
        Self {
            repo,
            multilang,
            signer,
        }
    }

    /// Decide which version of `entity` to show
    pub fn resolve_variant(&self, entity: ContentEntity, request: VariantRequest<'_>) -> Result<VariantOutcome> {
        if let Some(locale) = request.locale {
            if let Some(target) = self.translation(&entity, locale)? {
                tracing::debug!(
                    "Entity {} has a '{}' translation ({}); redirecting",
                    entity.id,
                    locale,
                    target.id
                );
                return Ok(VariantOutcome::Redirect {
                    target,
                    locale: locale.to_string(),
                });
            }
        }

        if let Some(revision_id) = request.revision {
            match self.revision(&entity, revision_id, request.token) {
                Ok(Some(revision)) => {
                    return Ok(VariantOutcome::UseRevision {
                        revision,
                        parent: entity,
                    })
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::debug!("Ignoring revision preview: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(VariantOutcome::UseEntity { entity })
    }

    /// Sibling in `locale`, when it is a different entity
    fn translation(&self, entity: &ContentEntity, locale: &str) -> Result<Option<ContentEntity>> {
        if !self.multilang.enabled {
            return Ok(None);
        }
        if !self.multilang.locales.iter().any(|l| l == locale) {
            tracing::debug!("Locale '{}' is not served; ignoring", locale);
            return Ok(None);
        }

        let current = entity
            .locale
            .as_deref()
            .unwrap_or(self.multilang.default_locale.as_str());
        if current == locale {
            return Ok(None);
        }

        Ok(self
            .repo
            .find_siblings_by_locale(entity, locale)?
            .filter(|sibling| sibling.id != entity.id))
    }

    /// Revision `revision_id` of `entity`, if the token authorizes it
    fn revision(&self, entity: &ContentEntity, revision_id: &str, token: Option<&str>) -> Result<Option<Revision>> {
        let mismatch = || PressError::RevisionTokenMismatch {
            revision_id: revision_id.to_string(),
        };

        let id: u64 = revision_id.trim().parse().map_err(|_| mismatch())?;
        let token = token.ok_or_else(mismatch)?;
        if !self.signer.verify(id, token) {
            return Err(mismatch());
        }

        Ok(self
            .repo
            .find_revision(entity.id, id)?
            .filter(|revision| revision.belongs_to(entity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::repository::InMemoryRepository;

    fn fixture() -> (InMemoryRepository, SiteConfig, RevisionTokenSigner) {
        let repo = InMemoryRepository::new();
        repo.insert_entity(ContentEntity::new(1, "post", "hello").with_title("Hello").with_locale("en"))
            .unwrap();
        repo.insert_entity(
            ContentEntity::new(2, "post", "bonjour")
                .with_title("Bonjour")
                .with_locale("fr")
                .translation_of(1),
        )
        .unwrap();
        repo.insert_revision(Revision::new(50, 1).with_title("Hello (draft)")).unwrap();

        let config = SiteConfig::builder()
            .multilang("en", &["en", "fr", "de"])
            .revision_key("secret")
            .build()
            .unwrap();
        let signer = RevisionTokenSigner::new(&config.revision_key);
        (repo, config, signer)
    }

    fn hello(repo: &InMemoryRepository) -> ContentEntity {
        repo.find_by_id(1).unwrap().unwrap()
    }

    #[test]
    fn test_translation_redirect() {
        let (repo, config, signer) = fixture();
        let resolver = VariantResolver::new(&repo, &config.multilang, &signer);

        let outcome = resolver
            .resolve_variant(
                hello(&repo),
                VariantRequest {
                    locale: Some("fr"),
                    ..Default::default()
                },
            )
            .unwrap();

        match outcome {
            VariantOutcome::Redirect { target, locale } => {
                assert_eq!(target.id, 2);
                assert_eq!(locale, "fr");
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_same_or_missing_locale_keeps_entity() {
        let (repo, config, signer) = fixture();
        let resolver = VariantResolver::new(&repo, &config.multilang, &signer);

        for locale in ["en", "de", "xx"] {
            let outcome = resolver
                .resolve_variant(
                    hello(&repo),
                    VariantRequest {
                        locale: Some(locale),
                        ..Default::default()
                    },
                )
                .unwrap();
            assert!(matches!(outcome, VariantOutcome::UseEntity { ref entity } if entity.id == 1), "{}", locale);
        }
    }

    #[test]
    fn test_multilang_disabled_ignores_locale() {
        let (repo, _, signer) = fixture();
        let multilang = MultilangConfig::default();
        let resolver = VariantResolver::new(&repo, &multilang, &signer);

        let outcome = resolver
            .resolve_variant(
                hello(&repo),
                VariantRequest {
                    locale: Some("fr"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!outcome.is_redirect());
    }

    #[test]
    fn test_revision_with_valid_token() {
        let (repo, config, signer) = fixture();
        let resolver = VariantResolver::new(&repo, &config.multilang, &signer);
        let token = signer.token(50);

        let outcome = resolver
            .resolve_variant(
                hello(&repo),
                VariantRequest {
                    revision: Some("50"),
                    token: Some(&token),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(matches!(outcome, VariantOutcome::UseRevision { .. }));
        let shown = outcome.display_entity();
        assert_eq!(shown.id, 1);
        assert_eq!(shown.title, "Hello (draft)");
    }

    #[test]
    fn test_bad_token_degrades_to_entity() {
        let (repo, config, signer) = fixture();
        let resolver = VariantResolver::new(&repo, &config.multilang, &signer);

        for (revision, token) in [("50", Some("nope")), ("50", None), ("abc", Some("x")), ("51", None)] {
            let outcome = resolver
                .resolve_variant(
                    hello(&repo),
                    VariantRequest {
                        revision: Some(revision),
                        token,
                        ..Default::default()
                    },
                )
                .unwrap();
            assert_eq!(outcome.display_entity().title, "Hello");
        }
    }

    #[test]
    fn test_revision_of_other_entity_is_ignored() {
        let (repo, config, signer) = fixture();
        let resolver = VariantResolver::new(&repo, &config.multilang, &signer);
        let token = signer.token(50);
        let bonjour = repo.find_by_id(2).unwrap().unwrap();

        let outcome = resolver
            .resolve_variant(
                bonjour,
                VariantRequest {
                    revision: Some("50"),
                    token: Some(&token),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(matches!(outcome, VariantOutcome::UseEntity { .. }));
    }

    #[test]
    fn test_translation_takes_priority_over_revision() {
        let (repo, config, signer) = fixture();
        let resolver = VariantResolver::new(&repo, &config.multilang, &signer);
        let token = signer.token(50);

        let outcome = resolver
            .resolve_variant(
                hello(&repo),
                VariantRequest {
                    locale: Some("fr"),
                    revision: Some("50"),
                    token: Some(&token),
                },
            )
            .unwrap();
        assert!(outcome.is_redirect());
    }
}
