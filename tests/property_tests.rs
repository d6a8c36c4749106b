//! Property tests for cross-module invariants.

use std::sync::Arc;

use deskgate::defaults::FixedClock;
use deskgate::memory::MemoryFramework;
use deskgate::meta::{DocTypeMeta, FieldMeta, FieldType, PermissionType};
use deskgate::web::{extract_authed, extract_unauthed, handle, HttpVerb, RequestAdapter};
use deskgate::{
    Api, Backend, Config, CsrfToken, DoctypeNameSanitizer, FlagSanitizer, Principal,
    RandomHashGenerator, Sanitizer, Session, Tainted, TokenGenerator,
};
use proptest::prelude::*;
use time::macros::datetime;

fn arb_principal() -> impl Strategy<Value = Principal> {
    (
        prop::string::string_regex("[a-z]{3,8}@example\\.com").unwrap(),
        prop::string::string_regex("[A-Z][a-z]{2,10}").unwrap(),
    )
        .prop_map(|(id, name)| Principal::new(id, name))
}

fn arb_doctype_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{2,8}( [A-Z][a-z]{2,8}){0,2}").unwrap()
}

fn arb_doctype() -> impl Strategy<Value = (String, bool, bool)> {
    (arb_doctype_name(), any::<bool>(), any::<bool>())
}

fn api_over(fw: &Arc<MemoryFramework>) -> Api {
    Api::builder(Config::default(), Backend::from_memory(fw.clone()))
        .clock(Arc::new(FixedClock(datetime!(2024-12-31 23:59:59 UTC))))
        .build()
}

proptest! {
    /// Boot lists exactly the regular doctypes, sorted, whatever their count
    #[test]
    fn boot_lists_all_regular_doctypes(
        doctypes in prop::collection::vec(arb_doctype(), 0..80),
        principal in arb_principal(),
    ) {
        let fw = Arc::new(MemoryFramework::new());
        for (name, istable, issingle) in &doctypes {
            let mut meta = DocTypeMeta::new(name.clone(), "Custom");
            meta.istable = *istable;
            meta.issingle = *issingle;
            fw.add_doctype(meta);
        }
        let api = api_over(&fw);

        let request = RequestAdapter::new("req-p", HttpVerb::Get, "get_boot", Session::for_user("sid", principal));
        let boot = api.get_boot(&extract_unauthed(&request, "en").context).unwrap();

        // Later duplicates replace earlier ones in the registry
        let mut expected: std::collections::BTreeMap<&str, bool> = Default::default();
        for (name, istable, issingle) in &doctypes {
            expected.insert(name.as_str(), !istable && !issingle);
        }
        let expected: Vec<&str> = expected
            .into_iter()
            .filter(|(_, regular)| *regular)
            .map(|(name, _)| name)
            .collect();

        let listed: Vec<&str> = boot
            .all_doctypes()
            .iter()
            .filter_map(|d| d["name"].as_str())
            .collect();
        prop_assert_eq!(listed, expected);
    }

    /// Guests always get the same four-key payload
    #[test]
    fn guest_boot_is_constant(
        names in prop::collection::vec(arb_doctype_name(), 0..30),
    ) {
        let fw = Arc::new(MemoryFramework::new());
        for name in names {
            fw.add_doctype(DocTypeMeta::new(name, "Custom"));
        }
        let api = api_over(&fw);

        let request = RequestAdapter::new("req-g", HttpVerb::Get, "get_boot", Session::guest());
        let boot = api.get_boot(&extract_unauthed(&request, "en").context).unwrap();

        prop_assert_eq!(boot.user(), Some("Guest"));
        prop_assert!(boot.all_doctypes().is_empty());
        prop_assert_eq!(boot.into_map().len(), 4);
    }

    /// Repeated token requests on one session never change the token or
    /// write more than once
    #[test]
    fn csrf_token_is_stable(principal in arb_principal(), calls in 1usize..6) {
        let fw = Arc::new(MemoryFramework::new());
        let api = api_over(&fw);
        let request = RequestAdapter::new("req-c", HttpVerb::Get, "get_csrf_token", Session::for_user("sid", principal));
        let mut ctx = extract_authed(&request, "en").unwrap().context;

        let first = api.get_csrf_token(&mut ctx).unwrap();
        for _ in 1..calls {
            prop_assert_eq!(&api.get_csrf_token(&mut ctx).unwrap(), &first);
        }
        prop_assert_eq!(fw.persist_count(), 1);
    }

    /// Generated tokens are lowercase hex of the requested length
    #[test]
    fn generated_tokens_have_requested_shape(length in 1usize..128) {
        let token = RandomHashGenerator::new(length).generate();
        prop_assert_eq!(token.expose_secret().len(), length);
        prop_assert!(token.expose_secret().chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        prop_assert_eq!(format!("{:?}", token), "[REDACTED]");
    }

    /// Tokens only match themselves
    #[test]
    fn token_matching_is_exact(a in "[0-9a-f]{8,64}", b in "[0-9a-f]{8,64}") {
        let token = CsrfToken::new(a.clone());
        prop_assert!(token.matches(&a));
        prop_assert_eq!(token.matches(&b), a == b);
    }

    /// Denied callers never get a document, granted callers always get one
    /// with exactly one row per required table when asked
    #[test]
    fn new_doc_follows_permission(
        principal in arb_principal(),
        granted in any::<bool>(),
        with_children in any::<bool>(),
        required_tables in 0usize..4,
    ) {
        let fw = Arc::new(MemoryFramework::new());
        let mut meta = DocTypeMeta::new("Project", "Projects")
            .field(FieldMeta::new("status", FieldType::Select).options("Open\nCompleted"));
        for i in 0..required_tables {
            meta = meta.field(FieldMeta::new(format!("rows_{i}"), FieldType::Table).options("Project Row").required());
        }
        meta = meta.field(FieldMeta::new("optional_rows", FieldType::Table).options("Project Row"));
        fw.add_doctype(meta);
        fw.add_doctype(DocTypeMeta::new("Project Row", "Projects").child_table());
        if granted {
            fw.grant(&principal.id, "Project", PermissionType::Create);
        }
        let api = api_over(&fw);

        let request = RequestAdapter::new("req-n", HttpVerb::Get, "get_new_doc", Session::for_user("sid", principal.clone()));
        let ctx = extract_authed(&request, "en").unwrap().context;
        let result = api.get_new_doc(&ctx, "Project", with_children);

        if granted {
            let doc = result.unwrap();
            let expected_rows = usize::from(with_children);
            for i in 0..required_tables {
                prop_assert_eq!(doc.rows(&format!("rows_{i}")).len(), expected_rows);
            }
            prop_assert!(doc.rows("optional_rows").is_empty());
            prop_assert_eq!(doc.get("owner").unwrap(), principal.id.as_str());
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Any rejected doctype parameter becomes a 417 and its text never
    /// appears in the response
    #[test]
    fn rejected_doctype_params_are_not_echoed(raw in "[A-Za-z]{1,10}[;'<>%/\\\\]{1,5}[A-Za-z]{1,10}") {
        let fw = Arc::new(MemoryFramework::new());
        let api = api_over(&fw);
        let mut request = RequestAdapter::new(
            "req-s",
            HttpVerb::Get,
            "get_new_doc",
            Session::for_user("sid", Principal::new("x@example.com", "X")),
        );
        request.add_param("doctype", raw.clone());

        let response = handle(&api, &request);

        prop_assert_eq!(response.status, 417);
        prop_assert!(!response.body.to_string().contains(&raw));
    }

    /// Sanitized doctype names are trimmed and otherwise unchanged
    #[test]
    fn doctype_names_survive_sanitization(name in arb_doctype_name(), pad in " {0,3}") {
        let padded = format!("{pad}{name}{pad}");
        let verified = DoctypeNameSanitizer::default().sanitize(Tainted::new(padded)).unwrap();
        prop_assert_eq!(verified.into_inner(), name);
    }

    /// Flag parsing is case-insensitive
    #[test]
    fn flags_ignore_case(truthy in any::<bool>(), upper in any::<bool>()) {
        let word = if truthy { "true" } else { "false" };
        let word = if upper { word.to_uppercase() } else { word.to_string() };
        let flag = FlagSanitizer.sanitize(Tainted::new(word)).unwrap();
        prop_assert_eq!(flag.into_inner(), truthy);
    }
}
