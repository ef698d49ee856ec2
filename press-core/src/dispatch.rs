//! Request dispatch
//!
//! Runs one request through the whole pipeline:
//!
//! ```text
//! QueryRequest
//!   -> QueryResolver        (state + queried object)
//!   -> visibility + hooks   (singular entities only)
//!   -> VariantResolver      (translation redirect / revision preview)
//!   -> TemplateHierarchy    (candidate views)
//!   -> ViewResolver         (first existing view, else the default)
//!   -> RenderOutcome
//! ```
//!
//! [`Dispatcher::dispatch`] returns errors as-is; [`Dispatcher::respond`]
//! turns them into localized messages the host can show.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SiteConfig;
use crate::content::{ContentEntity, ContentRegistry, PostType};
use crate::error::{ErrorCategory, PressError, Result};
use crate::hierarchy::TemplateHierarchy;
use crate::hooks::{check_visibility, AuthorizationHook, HookRegistry, OwnerOrEditor, Session};
use crate::permalink::PermalinkBuilder;
use crate::query::{ContentIdentityState, QueriedObject, QueryRequest, QueryResolver, RequestParser};
use crate::repository::ContentRepository;
use crate::variant::{RevisionTokenSigner, VariantOutcome, VariantRequest, VariantResolver};
use crate::view::{ViewOracle, ViewResolver};

/// Ancestor link for breadcrumb trails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub id: u64,
    pub slug: String,
    pub title: String,
}

impl From<&ContentEntity> for Breadcrumb {
    fn from(entity: &ContentEntity) -> Self {
        Self {
            id: entity.id,
            slug: entity.slug.clone(),
            title: entity.title.clone(),
        }
    }
}

/// What the host should render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderInstruction {
    pub request_id: Uuid,
    pub state: ContentIdentityState,

    /// Selected view
    pub view: String,

    /// Whether the default view stood in for every candidate
    pub used_default: bool,

    /// Full candidate list, most specific first
    pub candidates: Vec<String>,

    /// Entity to display, with any revision applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<ContentEntity>,

    /// Revision shown in place of the published fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<u64>,

    /// Ancestors of the entity, root first
    #[serde(default)]
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// Where to send the client instead of rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectInstruction {
    pub request_id: Uuid,
    pub status: u16,
    pub location: String,
    pub target_id: u64,
    pub locale: String,
}

/// A request that ends in a message instead of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePage {
    pub request_id: Uuid,
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Final result of a dispatched request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenderOutcome {
    Render(RenderInstruction),
    Redirect(RedirectInstruction),
    Message(MessagePage),
}

impl RenderOutcome {
    pub fn request_id(&self) -> Uuid {
        match self {
            RenderOutcome::Render(r) => r.request_id,
            RenderOutcome::Redirect(r) => r.request_id,
            RenderOutcome::Message(m) => m.request_id,
        }
    }

    /// HTTP status the host should answer with
    pub fn status(&self) -> u16 {
        match self {
            RenderOutcome::Render(_) => 200,
            RenderOutcome::Redirect(r) => r.status,
            RenderOutcome::Message(m) => m.status,
        }
    }

    /// Selected view, when rendering
    pub fn view(&self) -> Option<&str> {
        match self {
            RenderOutcome::Render(r) => Some(&r.view),
            _ => None,
        }
    }
}

/// Shared, read-only request pipeline
pub struct Dispatcher {
    config: Arc<SiteConfig>,
    registry: Arc<ContentRegistry>,
    repo: Arc<dyn ContentRepository>,
    views: Arc<dyn ViewOracle>,
    authorization: Box<dyn AuthorizationHook>,
    hooks: HookRegistry,
    signer: RevisionTokenSigner,
}

impl Dispatcher {
    pub fn new(
        config: Arc<SiteConfig>,
        registry: Arc<ContentRegistry>,
        repo: Arc<dyn ContentRepository>,
        views: Arc<dyn ViewOracle>,
    ) -> Self {
        let signer = RevisionTokenSigner::new(&config.revision_key);
        Self {
            config,
            registry,
            repo,
            views,
            authorization: Box::new(OwnerOrEditor),
            hooks: HookRegistry::new(),
            signer,
        }
    }

    /// Replace the visibility policy for private and draft content
    pub fn with_authorization(mut self, hook: impl AuthorizationHook + 'static) -> Self {
        self.authorization = Box::new(hook);
        self
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    pub fn signer(&self) -> &RevisionTokenSigner {
        &self.signer
    }

    /// Parse a permalink path and query pairs
    pub fn parse<K, V>(&self, path: &str, pairs: &[(K, V)]) -> Result<QueryRequest>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        RequestParser::new(&self.registry, &self.config).parse(path, pairs)
    }

    /// Run the pipeline, returning errors unchanged
    pub fn dispatch(&self, request: &QueryRequest, session: &Session) -> Result<RenderOutcome> {
        self.run(Uuid::new_v4(), request, session)
    }

    /// Run the pipeline, mapping errors onto message pages
    pub fn respond(&self, request: &QueryRequest, session: &Session) -> RenderOutcome {
        let request_id = Uuid::new_v4();
        match self.run(request_id, request, session) {
            Ok(outcome) => outcome,
            Err(e) => self.message_for(request_id, &e, request.locale.as_deref()),
        }
    }

    fn run(&self, request_id: Uuid, request: &QueryRequest, session: &Session) -> Result<RenderOutcome> {
        let span = tracing::info_span!("dispatch", %request_id);
        let _guard = span.enter();

        let resolved = QueryResolver::new(self.repo.as_ref(), &self.registry, &self.config).resolve(request)?;
        let mut queried = resolved.queried.clone();
        let mut revision_id = None;
        let mut breadcrumbs = Vec::new();

        if let Some(entity) = resolved.entity() {
            check_visibility(entity, session, self.authorization.as_ref())?;
            self.hooks.run(entity, session)?;
            breadcrumbs = self
                .repo
                .find_ancestors(entity)?
                .iter()
                .map(Breadcrumb::from)
                .collect();

            if has_variants(resolved.state, entity) {
                let variant = VariantResolver::new(self.repo.as_ref(), &self.config.multilang, &self.signer)
                    .resolve_variant(
                        entity.clone(),
                        VariantRequest {
                            locale: request.locale.as_deref(),
                            revision: request.revision.as_deref(),
                            token: request.revision_token.as_deref(),
                        },
                    )?;

                match variant {
                    VariantOutcome::Redirect { target, locale } => {
                        let ancestors = self.repo.find_ancestors(&target)?;
                        let links = PermalinkBuilder::new(&self.registry, &self.config);
                        let path = links.canonical_path(&target, &ancestors, self.repo.as_ref())?;
                        let location = links.localized(&path, &locale);
                        tracing::info!("Redirecting entity {} to {}", entity.id, location);
                        return Ok(RenderOutcome::Redirect(RedirectInstruction {
                            request_id,
                            status: 302,
                            location,
                            target_id: target.id,
                            locale,
                        }));
                    }
                    VariantOutcome::UseRevision { ref revision, .. } => {
                        revision_id = Some(revision.id);
                        queried = QueriedObject::Entity(variant.display_entity());
                    }
                    VariantOutcome::UseEntity { .. } => {}
                }
            }
        }

        let candidates = TemplateHierarchy::new(&self.registry).candidates(resolved.state, &queried);
        let selected = ViewResolver::new(self.config.default_view.as_str()).select(&candidates, self.views.as_ref())?;

        tracing::info!(
            "Request resolved to '{}' using view '{}'",
            resolved.state,
            selected.view
        );

        let entity = match queried {
            QueriedObject::Entity(entity) => Some(entity),
            _ => None,
        };
        Ok(RenderOutcome::Render(RenderInstruction {
            request_id,
            state: resolved.state,
            view: selected.view,
            used_default: selected.used_default,
            candidates: candidates.into_vec(),
            entity,
            revision_id,
            breadcrumbs,
        }))
    }

    fn message_for(&self, request_id: Uuid, err: &PressError, locale: Option<&str>) -> RenderOutcome {
        let messages = self.config.messages_for(locale);
        let (message, redirect) = match err {
            PressError::Unauthorized { .. } => (messages.unauthorized, Some(self.config.safe_redirect.clone())),
            PressError::AccessDenied { message, redirect, .. } => (message.clone(), Some(redirect.clone())),
            PressError::InvalidDateRange { .. } => (messages.invalid_date, None),
            e if e.category() == ErrorCategory::NotFound => (messages.not_found, None),
            e => (e.to_string(), None),
        };

        if err.is_server_error() {
            tracing::error!("Request {} failed: {}", request_id, err);
        } else {
            tracing::debug!("Request {} answered with {}: {}", request_id, err.error_code(), err);
        }

        RenderOutcome::Message(MessagePage {
            request_id,
            status: err.http_status_code(),
            code: err.error_code().to_string(),
            message,
            redirect,
        })
    }
}

/// Translations and revisions apply to singular views of regular content,
/// never to listings or attachments
fn has_variants(state: ContentIdentityState, entity: &ContentEntity) -> bool {
    entity.post_type != PostType::Attachment
        && matches!(
            state,
            ContentIdentityState::FrontPage
                | ContentIdentityState::PrivacyPolicy
                | ContentIdentityState::Single
                | ContentIdentityState::Page
                | ContentIdentityState::Singular
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{PostStatus, Revision, TaxonomyTerm};
    use crate::hooks::HookDecision;
    use crate::repository::InMemoryRepository;
    use crate::view::StaticViews;

    fn dispatcher(views: &[&str]) -> Dispatcher {
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
        repo.insert_entity(ContentEntity::new(3, "page", "about").with_title("About")).unwrap();
        repo.insert_entity(ContentEntity::new(4, "page", "team").with_parent(3)).unwrap();
        repo.insert_entity(
            ContentEntity::new(5, "post", "secret")
                .with_status(PostStatus::Private)
                .with_author(9),
        )
        .unwrap();
        repo.insert_revision(Revision::new(60, 1).with_title("Hello v2")).unwrap();
        repo.insert_term(TaxonomyTerm::new(7, "category", "news")).unwrap();

        let config = SiteConfig::builder()
            .multilang("en", &["en", "fr"])
            .revision_key("k")
            .build()
            .unwrap();

        Dispatcher::new(
            Arc::new(config),
            Arc::new(ContentRegistry::with_builtins().unwrap()),
            Arc::new(repo),
            Arc::new(views.iter().copied().collect::<StaticViews>()),
        )
    }

    fn render(outcome: RenderOutcome) -> RenderInstruction {
        match outcome {
            RenderOutcome::Render(r) => r,
            other => panic!("expected render, got {:?}", other),
        }
    }

    #[test]
    fn test_single_post_renders_most_specific_view() {
        let d = dispatcher(&["index", "single"]);
        let request = d.parse::<&str, &str>("/hello/", &[]).unwrap();
        let out = render(d.dispatch(&request, &Session::anonymous()).unwrap());

        assert_eq!(out.state, ContentIdentityState::Single);
        assert_eq!(out.view, "single");
        assert_eq!(out.candidates, vec!["single-post-hello", "single-post", "single"]);
        assert_eq!(out.entity.map(|e| e.id), Some(1));
    }

    #[test]
    fn test_page_breadcrumbs() {
        let d = dispatcher(&["index"]);
        let request = d.parse::<&str, &str>("/about/team/", &[]).unwrap();
        let out = render(d.dispatch(&request, &Session::anonymous()).unwrap());

        assert_eq!(out.view, "index");
        assert!(out.used_default);
        assert_eq!(out.breadcrumbs.iter().map(|b| b.slug.as_str()).collect::<Vec<_>>(), vec!["about"]);
    }

    #[test]
    fn test_translation_redirect() {
        let d = dispatcher(&["index"]);
        let request = d.parse("/hello/", &[("lang", "fr")]).unwrap();
        match d.dispatch(&request, &Session::anonymous()).unwrap() {
            RenderOutcome::Redirect(r) => {
                assert_eq!(r.status, 302);
                assert_eq!(r.location, "/bonjour/?lang=fr");
                assert_eq!(r.target_id, 2);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_category_archive_is_not_translated() {
        let d = dispatcher(&["index", "category"]);
        let request = d.parse("/category/news/", &[("lang", "fr")]).unwrap();
        let out = render(d.dispatch(&request, &Session::anonymous()).unwrap());
        assert_eq!(out.state, ContentIdentityState::Category);
        assert_eq!(out.view, "category");
    }

    #[test]
    fn test_revision_preview() {
        let d = dispatcher(&["index"]);
        let token = d.signer().token(60);
        let request = d.parse("/hello/", &[("revision", "60"), ("token", token.as_str())]).unwrap();
        let out = render(d.dispatch(&request, &Session::anonymous()).unwrap());

        assert_eq!(out.revision_id, Some(60));
        assert_eq!(out.entity.map(|e| e.title), Some("Hello v2".to_string()));
    }

    #[test]
    fn test_private_content_messages() {
        let d = dispatcher(&["index"]);
        let request = d.parse::<&str, &str>("/secret/", &[]).unwrap();

        match d.respond(&request, &Session::anonymous()) {
            RenderOutcome::Message(m) => {
                assert_eq!(m.status, 403);
                assert_eq!(m.code, "UNAUTHORIZED");
                assert_eq!(m.redirect.as_deref(), Some("/"));
            }
            other => panic!("expected message, got {:?}", other),
        }

        let out = d.respond(&request, &Session::user(9));
        assert_eq!(out.status(), 200);
    }

    #[test]
    fn test_hook_denial() {
        let mut hooks = HookRegistry::new();
        hooks.register_fn("maintenance", |_, _| HookDecision::deny("Back soon", "/maintenance/"));
        let d = dispatcher(&["index"]).with_hooks(hooks);

        let request = d.parse::<&str, &str>("/hello/", &[]).unwrap();
        match d.respond(&request, &Session::anonymous()) {
            RenderOutcome::Message(m) => {
                assert_eq!(m.code, "ACCESS_DENIED");
                assert_eq!(m.message, "Back soon");
                assert_eq!(m.redirect.as_deref(), Some("/maintenance/"));
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found_and_bad_dates() {
        let d = dispatcher(&["index"]);

        let request = d.parse::<&str, &str>("/nothing-here/", &[]).unwrap();
        let out = d.respond(&request, &Session::anonymous());
        assert_eq!(out.status(), 404);

        let request = d.parse::<&str, &str>("/2024/02/30/", &[]).unwrap();
        match d.respond(&request, &Session::anonymous()) {
            RenderOutcome::Message(m) => {
                assert_eq!(m.status, 400);
                assert_eq!(m.message, d.config().messages_for(None).invalid_date);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_default_view_is_server_error() {
        let d = dispatcher(&[]);
        let request = d.parse::<&str, &str>("/hello/", &[]).unwrap();
        let out = d.respond(&request, &Session::anonymous());
        assert_eq!(out.status(), 500);
        assert!(out.view().is_none());
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let d = dispatcher(&["index"]);
        let out = d.respond(&QueryRequest::new(), &Session::anonymous());
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["outcome"], "render");
        assert_eq!(json["state"], "front_page");
        assert_eq!(json["view"], "index");
    }
}
