//! Error classification and the message pages built from it

mod common;

use press_core::{ErrorCategory, PressError, RenderOutcome, Session};

fn message(outcome: RenderOutcome) -> press_core::MessagePage {
    match outcome {
        RenderOutcome::Message(m) => m,
        other => panic!("expected message page, got {:?}", other),
    }
}

fn dispatch_err(path: &str, pairs: &[(&str, &str)]) -> PressError {
    let d = common::dispatcher(&["index"]);
    let request = d.parse(path, pairs).expect("Request parses");
    d.dispatch(&request, &Session::anonymous()).unwrap_err()
}

#[test]
fn test_impossible_dates_are_bad_requests() {
    let d = common::dispatcher(&["index"]);

    let cases: [(&str, &[(&str, &str)]); 3] = [
        ("/2024/02/30/", &[]),
        ("/", &[("year", "2024"), ("monthnum", "13")]),
        ("/", &[("m", "20230229")]),
    ];
    for (path, pairs) in cases {
        let page = message(common::respond(&d, path, pairs, &Session::anonymous()));
        assert_eq!(page.status, 400, "{} {:?}", path, pairs);
        assert_eq!(page.code, "INVALID_DATE_RANGE");
        assert_eq!(page.message, "The requested date is not valid.");
    }

    // Leap day exists in 2024
    assert!(matches!(
        common::respond(&d, "/2024/02/29/", &[], &Session::anonymous()),
        RenderOutcome::Render(_)
    ));
}

#[test]
fn test_invalid_date_message_is_localized() {
    let d = common::dispatcher(&["index"]);
    let page = message(common::respond(&d, "/2024/02/30/", &[("lang", "fr")], &Session::anonymous()));
    assert_eq!(page.message, "La date demandée n'est pas valide.");
}

#[test]
fn test_not_found_variants() {
    assert!(matches!(dispatch_err("/no-such-thing/", &[]), PressError::EntityNotFound { .. }));
    assert!(matches!(dispatch_err("/category/missing/", &[]), PressError::TermNotFound { .. }));
    assert!(matches!(dispatch_err("/author/nobody/", &[]), PressError::AuthorNotFound { .. }));
    assert!(matches!(
        dispatch_err("/", &[("taxonomy", "flavor"), ("term", "sweet")]),
        PressError::UnknownTaxonomy { .. }
    ));
    // Unregistered types have no archive
    assert!(matches!(
        dispatch_err("/", &[("post_type", "recipe")]),
        PressError::EntityNotFound { .. }
    ));

    for err in [
        dispatch_err("/no-such-thing/", &[]),
        dispatch_err("/about/nobody/", &[]),
    ] {
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.http_status_code(), 404);
        assert!(!err.is_recoverable());
    }
}

#[test]
fn test_not_found_page_is_localized() {
    let d = common::dispatcher(&["index"]);

    let page = message(common::respond(&d, "/no-such-thing/", &[], &Session::anonymous()));
    assert_eq!(page.status, 404);
    assert_eq!(page.message, "Sorry, the page you were looking for could not be found.");

    let page = message(common::respond(&d, "/no-such-thing/", &[("lang", "fr")], &Session::anonymous()));
    assert_eq!(page.message, "Désolé, cette page est introuvable.");
}

#[test]
fn test_malformed_parameters_fail_to_parse() {
    let d = common::dispatcher(&["index"]);

    let err = d.parse("/", &[("year", "twenty")]).unwrap_err();
    assert!(matches!(err, PressError::InvalidRequest { .. }));
    assert_eq!(err.http_status_code(), 400);

    let err = d.parse("/", &[("year", "99999999999999999999999")]).unwrap_err();
    assert!(matches!(err, PressError::InvalidDateRange { .. }));
}

#[test]
fn test_taxonomy_without_term_is_invalid() {
    let err = dispatch_err("/", &[("taxonomy", "genre")]);
    assert!(matches!(err, PressError::InvalidRequest { .. }));
    assert!(err.is_client_error());
}

#[test]
fn test_missing_default_view_is_server_error() {
    let d = common::dispatcher(&["single"]);

    let page = message(common::respond(&d, "/logo/", &[], &Session::anonymous()));
    assert_eq!(page.status, 500);
    assert_eq!(page.code, "DEFAULT_VIEW_MISSING");
    assert!(page.message.contains("index"));

    // A candidate that exists still renders without the default
    let out = common::render(&d, "/hello-world/");
    assert_eq!(out.view, "single");
}

#[test]
fn test_error_response_json() {
    let err = dispatch_err("/category/missing/", &[]);
    let json = serde_json::to_value(err.to_error_response()).unwrap();

    assert_eq!(json["error"]["code"], "TERM_NOT_FOUND");
    assert_eq!(json["error"]["recoverable"], false);
    assert!(json["error"]["message"].as_str().unwrap().contains("missing"));
}
