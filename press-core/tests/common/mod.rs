//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use press_core::{
    ContentEntity, Dispatcher, InMemoryRepository, RegistryBuilder, RenderInstruction, RenderOutcome, Session,
    SiteFixture, StaticViews,
};

/// The fixture site used across integration tests
pub fn load_site() -> SiteFixture {
    SiteFixture::from_json(include_str!("../fixtures/site.json")).expect("Failed to parse site.json")
}

/// Dispatcher over the fixture site with the given views available
pub fn dispatcher(views: &[&str]) -> Dispatcher {
    dispatcher_with(views, Vec::new())
}

/// Dispatcher over the fixture site plus `extra` entities
pub fn dispatcher_with(views: &[&str], extra: Vec<ContentEntity>) -> Dispatcher {
    let site = load_site();
    let registry = RegistryBuilder::new()
        .manifest(site.registry.clone())
        .build()
        .expect("Fixture registry is valid");
    let repo = InMemoryRepository::from_fixture(&site).expect("Fixture loads into memory");
    for entity in extra {
        repo.insert_entity(entity).expect("Extra entity inserts");
    }

    Dispatcher::new(
        Arc::new(site.config),
        Arc::new(registry),
        Arc::new(repo),
        Arc::new(views.iter().copied().collect::<StaticViews>()),
    )
}

/// Respond to `path` plus `pairs` as `session`
pub fn respond(d: &Dispatcher, path: &str, pairs: &[(&str, &str)], session: &Session) -> RenderOutcome {
    let request = d.parse(path, pairs).expect("Request parses");
    d.respond(&request, session)
}

/// Respond anonymously and expect content to render
pub fn render(d: &Dispatcher, path: &str) -> RenderInstruction {
    match respond(d, path, &[], &Session::anonymous()) {
        RenderOutcome::Render(r) => r,
        other => panic!("{} did not render: {:?}", path, other),
    }
}
