//! Visibility rules and before-show hooks

mod common;

use press_core::{ContentEntity, HookDecision, HookRegistry, PostType, RenderOutcome, Session};

fn message(outcome: RenderOutcome) -> press_core::MessagePage {
    match outcome {
        RenderOutcome::Message(m) => m,
        other => panic!("expected message page, got {:?}", other),
    }
}

#[test]
fn test_private_post_hidden_from_visitors() {
    let d = common::dispatcher(&["index"]);
    let page = message(common::respond(&d, "/members-news/", &[], &Session::anonymous()));

    assert_eq!(page.status, 403);
    assert_eq!(page.code, "UNAUTHORIZED");
    assert_eq!(page.message, "You are not allowed to view this content.");
    assert_eq!(page.redirect.as_deref(), Some("/login/"));
}

#[test]
fn test_private_post_visible_to_author_and_editors() {
    let d = common::dispatcher(&["index"]);

    for session in [Session::user(100), Session::user(7).with_role("editor")] {
        let out = common::respond(&d, "/members-news/", &[], &session);
        match out {
            RenderOutcome::Render(r) => assert_eq!(r.entity.map(|e| e.id), Some(3)),
            other => panic!("expected render, got {:?}", other),
        }
    }

    let stranger = message(common::respond(&d, "/members-news/", &[], &Session::user(7)));
    assert_eq!(stranger.status, 403);
}

#[test]
fn test_hidden_draft_is_not_found() {
    let d = common::dispatcher(&["index"]);
    let page = message(common::respond(&d, "/wip/", &[], &Session::anonymous()));

    assert_eq!(page.status, 404);
    assert_eq!(page.code, "ENTITY_NOT_FOUND");
    assert_eq!(page.redirect, None);

    let out = common::respond(&d, "/wip/", &[], &Session::user(100));
    assert!(matches!(out, RenderOutcome::Render(_)));
}

#[test]
fn test_unauthorized_message_is_localized() {
    let d = common::dispatcher(&["index"]);
    let page = message(common::respond(
        &d,
        "/members-news/",
        &[("lang", "fr")],
        &Session::anonymous(),
    ));

    assert_eq!(page.message, "Vous n'avez pas accès à ce contenu.");
    assert_eq!(page.redirect.as_deref(), Some("/login/"));
}

#[test]
fn test_custom_authorization_closure() {
    let d = common::dispatcher(&["index"])
        .with_authorization(|_: &ContentEntity, session: &Session| session.has_role("subscriber"));

    let member = Session::user(5).with_role("subscriber");
    assert!(matches!(
        common::respond(&d, "/members-news/", &[], &member),
        RenderOutcome::Render(_)
    ));

    // The author alone no longer passes
    let author = message(common::respond(&d, "/members-news/", &[], &Session::user(100)));
    assert_eq!(author.status, 403);
}

#[test]
fn test_before_show_hook_denies_with_redirect() {
    let mut hooks = HookRegistry::new();
    hooks.register_fn("audit", |_, _| HookDecision::allow());
    hooks.register_fn("paywall", |entity, session| {
        if entity.post_type == PostType::Custom("book".to_string()) && !session.is_logged_in() {
            HookDecision::deny("Subscribe to keep reading.", "/subscribe/")
        } else {
            HookDecision::allow()
        }
    });
    let d = common::dispatcher(&["index"]).with_hooks(hooks);

    let page = message(common::respond(&d, "/books/dune/", &[], &Session::anonymous()));
    assert_eq!(page.status, 403);
    assert_eq!(page.code, "ACCESS_DENIED");
    assert_eq!(page.message, "Subscribe to keep reading.");
    assert_eq!(page.redirect.as_deref(), Some("/subscribe/"));

    assert!(matches!(
        common::respond(&d, "/books/dune/", &[], &Session::user(1)),
        RenderOutcome::Render(_)
    ));
    // Listings are not gated
    assert!(matches!(
        common::respond(&d, "/books/", &[], &Session::anonymous()),
        RenderOutcome::Render(_)
    ));
}

#[test]
fn test_hooks_run_before_translation_redirect() {
    let mut hooks = HookRegistry::new();
    hooks.register_fn("closed", |_, _| HookDecision::deny("Closed for maintenance.", "/"));
    let d = common::dispatcher(&["index"]).with_hooks(hooks);

    let page = message(common::respond(&d, "/hello-world/", &[("lang", "fr")], &Session::anonymous()));
    assert_eq!(page.code, "ACCESS_DENIED");
}
