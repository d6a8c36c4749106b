//! Integration tests for the HTTP boundary.
//!
//! These drive `web::handle` the way a host HTTP layer would: build a
//! `RequestAdapter` from a resolved session, dispatch, then write the
//! returned session back.

use std::sync::Arc;

use deskgate::memory::MemoryFramework;
use deskgate::meta::{DocTypeMeta, FieldMeta, FieldType, PermissionType};
use deskgate::web::{handle, HttpVerb, RequestAdapter, Response};
use deskgate::{Api, Backend, Config, CsrfToken, Principal, Session};
use serde_json::Value;

const BOB: &str = "bob@example.com";

fn setup() -> (Arc<MemoryFramework>, Api) {
    let fw = Arc::new(MemoryFramework::new());
    fw.add_doctype(
        DocTypeMeta::new("ToDo", "Desk")
            .field(FieldMeta::new("status", FieldType::Select).options("Open\nClosed"))
            .field(FieldMeta::new("allocated_to", FieldType::Link).options("User").default_value("__user")),
    );
    fw.add_doctype(DocTypeMeta::new("Note", "Desk"));
    fw.grant(BOB, "ToDo", PermissionType::Create);

    let api = Api::builder(Config::default(), Backend::from_memory(fw.clone())).build();
    (fw, api)
}

fn bob() -> Session {
    Session::for_user("sid-bob", Principal::new(BOB, "Bob"))
}

fn call(api: &Api, verb: HttpVerb, method: &str, session: Session, params: &[(&str, &str)]) -> Response {
    let mut request = RequestAdapter::new("req-web", verb, method, session);
    for (k, v) in params {
        request.add_param(*k, *v);
    }
    handle(api, &request)
}

fn exc_type(response: &Response) -> &str {
    response.body["exc_type"].as_str().unwrap_or_default()
}

fn server_message(response: &Response) -> String {
    let outer: Vec<String> =
        serde_json::from_str(response.body["_server_messages"].as_str().unwrap()).unwrap();
    let inner: Value = serde_json::from_str(&outer[0]).unwrap();
    inner["message"].as_str().unwrap().to_string()
}

#[test]
fn guest_boot_over_http() {
    let (_, api) = setup();

    let response = call(&api, HttpVerb::Get, "axon_erp.api.get_boot", Session::guest(), &[]);

    assert_eq!(response.status, 200);
    assert_eq!(response.body["message"]["user"], "Guest");
    assert_eq!(response.body["message"]["all_doctypes"], serde_json::json!([]));
    assert!(response.session.is_guest());
}

#[test]
fn user_boot_over_http() {
    let (_, api) = setup();

    let response = call(&api, HttpVerb::Get, "get_boot", bob(), &[]);

    assert_eq!(response.status, 200);
    assert_eq!(response.body["message"]["user"]["name"], BOB);
    assert_eq!(
        response.body["message"]["all_doctypes"][0],
        serde_json::json!({ "name": "Note", "module": "Desk", "icon": null, "custom": 0 })
    );
}

#[test]
fn csrf_token_requires_login() {
    let (_, api) = setup();

    let response = call(&api, HttpVerb::Get, "get_csrf_token", Session::guest(), &[]);

    assert_eq!(response.status, 403);
    assert_eq!(exc_type(&response), "PermissionError");
}

#[test]
fn csrf_token_round_trip_protects_later_posts() {
    let (fw, api) = setup();

    let issued = call(&api, HttpVerb::Get, "get_csrf_token", bob(), &[]);
    assert_eq!(issued.status, 200);
    let token = issued.body["message"]["csrf_token"].as_str().unwrap().to_string();
    assert_eq!(issued.session.csrf_token().unwrap().expose_secret(), token);
    assert_eq!(fw.persist_count(), 1);

    // Without the header a POST is refused
    let refused = call(&api, HttpVerb::Post, "get_new_doc", issued.session.clone(), &[("doctype", "ToDo")]);
    assert_eq!(refused.status, 400);
    assert_eq!(exc_type(&refused), "CSRFTokenError");

    // With the header it goes through
    let mut request = RequestAdapter::new("req-web", HttpVerb::Post, "get_new_doc", issued.session);
    request.add_param("doctype", "ToDo");
    request.add_header("X-Frappe-CSRF-Token", token.as_str());
    let accepted = handle(&api, &request);
    assert_eq!(accepted.status, 200);
    assert_eq!(accepted.body["message"]["doctype"], "ToDo");
}

#[test]
fn new_doc_over_http() {
    let (_, api) = setup();

    let response = call(
        &api,
        HttpVerb::Get,
        "get_new_doc",
        bob(),
        &[("doctype", " ToDo "), ("with_mandatory_children", "0")],
    );

    assert_eq!(response.status, 200);
    let doc = &response.body["message"];
    assert_eq!(doc["status"], "Open");
    assert_eq!(doc["owner"], BOB);
    // Links to User are not filled from user defaults, but the static
    // sentinel still applies
    assert_eq!(doc["allocated_to"], BOB);
}

#[test]
fn new_doc_permission_denied_is_403() {
    let (_, api) = setup();

    let response = call(&api, HttpVerb::Get, "get_new_doc", bob(), &[("doctype", "Note")]);

    assert_eq!(response.status, 403);
    assert_eq!(exc_type(&response), "PermissionError");
    assert_eq!(server_message(&response), "No permission to create Note");
}

#[test]
fn new_doc_unknown_doctype_is_404() {
    let (_, api) = setup();

    let response = call(&api, HttpVerb::Get, "get_new_doc", bob(), &[("doctype", "Ghost")]);

    assert_eq!(response.status, 404);
    assert_eq!(exc_type(&response), "DoesNotExistError");
}

#[test]
fn new_doc_parameters_are_sanitized() {
    let (_, api) = setup();

    let missing = call(&api, HttpVerb::Get, "get_new_doc", bob(), &[]);
    assert_eq!(missing.status, 417);
    assert_eq!(exc_type(&missing), "ValidationError");

    let injected = call(&api, HttpVerb::Get, "get_new_doc", bob(), &[("doctype", "ToDo' OR 1=1")]);
    assert_eq!(injected.status, 417);
    assert!(!server_message(&injected).contains("OR 1=1"));

    let bad_flag = call(
        &api,
        HttpVerb::Get,
        "get_new_doc",
        bob(),
        &[("doctype", "ToDo"), ("with_mandatory_children", "maybe")],
    );
    assert_eq!(bad_flag.status, 417);
}

#[test]
fn unknown_method_is_404() {
    let (_, api) = setup();

    let response = call(&api, HttpVerb::Get, "frappe.client.delete_everything", bob(), &[]);

    assert_eq!(response.status, 404);
    assert_eq!(server_message(&response), "Method delete_everything not found");
    assert_eq!(response.session, bob());
}

#[test]
fn session_without_token_passes_posts() {
    let (_, api) = setup();

    let response = call(&api, HttpVerb::Post, "get_csrf_token", bob(), &[]);

    assert_eq!(response.status, 200);
}

#[test]
fn existing_token_is_returned_over_http() {
    let (fw, api) = setup();
    let mut session = bob();
    session.data.csrf_token = Some(CsrfToken::new("already-here"));

    let response = call(&api, HttpVerb::Get, "get_csrf_token", session, &[]);

    assert_eq!(response.body["message"]["csrf_token"], "already-here");
    assert_eq!(fw.persist_count(), 0);
}
