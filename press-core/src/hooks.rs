//! Visibility checks and before-show hooks
//!
//! Two extension points sit between query resolution and rendering:
//!
//! - An [`AuthorizationHook`] decides whether a non-public entity may be
//!   shown to the current [`Session`]
//! - [`BeforeShowHook`]s run in registration order and may deny display with
//!   a message and a redirect; the first denial wins

use serde::{Deserialize, Serialize};

use crate::content::{ContentEntity, PostStatus};
use crate::error::{PressError, Result};

/// Who is asking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Logged-in user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl Session {
    /// Visitor without a login
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Decides whether a private or draft entity may be shown
pub trait AuthorizationHook: Send + Sync {
    fn is_visible(&self, entity: &ContentEntity, session: &Session) -> bool;
}

impl<F> AuthorizationHook for F
where
    F: Fn(&ContentEntity, &Session) -> bool + Send + Sync,
{
    fn is_visible(&self, entity: &ContentEntity, session: &Session) -> bool {
        self(entity, session)
    }
}

/// Default policy: authors see their own content, editors see everything
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOrEditor;

impl AuthorizationHook for OwnerOrEditor {
    fn is_visible(&self, entity: &ContentEntity, session: &Session) -> bool {
        match session.user_id {
            None => false,
            Some(user) => {
                user == entity.author_id || session.has_role("editor") || session.has_role("administrator")
            }
        }
    }
}

/// Gate an entity on its status
///
/// Published content is always visible. A hidden private entity is
/// `Unauthorized`; a hidden draft does not exist as far as the visitor can tell.
pub fn check_visibility(entity: &ContentEntity, session: &Session, hook: &dyn AuthorizationHook) -> Result<()> {
    match entity.status {
        PostStatus::Publish => Ok(()),
        _ if hook.is_visible(entity, session) => Ok(()),
        PostStatus::Private => Err(PressError::Unauthorized { entity_id: entity.id }),
        PostStatus::Draft => Err(PressError::not_found(format!("entity {}", entity.id))),
    }
}

/// Decision from a before-show hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum HookDecision {
    Allow,
    Deny { message: String, redirect: String },
}

impl HookDecision {
    pub fn allow() -> Self {
        HookDecision::Allow
    }

    pub fn deny(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        HookDecision::Deny {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, HookDecision::Allow)
    }
}

/// Runs just before a resolved entity is displayed
pub trait BeforeShowHook: Send + Sync {
    fn name(&self) -> &str;

    fn before_show(&self, entity: &ContentEntity, session: &Session) -> HookDecision;
}

struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> BeforeShowHook for FnHook<F>
where
    F: Fn(&ContentEntity, &Session) -> HookDecision + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn before_show(&self, entity: &ContentEntity, session: &Session) -> HookDecision {
        (self.f)(entity, session)
    }
}

/// Ordered list of before-show hooks
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Box<dyn BeforeShowHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; hooks run in the order they were added
    pub fn register(&mut self, hook: impl BeforeShowHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Append a closure hook
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&ContentEntity, &Session) -> HookDecision + Send + Sync + 'static,
    {
        self.register(FnHook { name: name.into(), f });
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook until one denies
    pub fn run(&self, entity: &ContentEntity, session: &Session) -> Result<()> {
        for hook in &self.hooks {
            if let HookDecision::Deny { message, redirect } = hook.before_show(entity, session) {
                tracing::info!("Hook '{}' denied entity {}: {}", hook.name(), entity.id, message);
                return Err(PressError::AccessDenied {
                    hook: hook.name().to_string(),
                    message,
                    redirect,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}
