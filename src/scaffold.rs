//! Permission-gated construction of new documents.

use std::sync::Arc;

use crate::capability::CreateCap;
use crate::context::Ctx;
use crate::defaults::{apply_defaults, Clock, DefaultResolvers, ResolveEnv};
use crate::document::NewDocument;
use crate::error::Error;
use crate::framework::{DefaultsStore, DocumentHooks, FrameworkError, MetaStore, PermissionEngine};
use crate::gate::PermissionGate;
use crate::i18n::Translator;
use crate::policy::CanCreate;
use crate::state::Authed;

/// Builds new, unsaved documents with their defaults applied.
pub struct DocumentScaffolder {
    meta: Arc<dyn MetaStore>,
    permissions: Arc<dyn PermissionEngine>,
    defaults: Arc<dyn DefaultsStore>,
    hooks: Arc<dyn DocumentHooks>,
    translator: Arc<dyn Translator>,
    resolvers: DefaultResolvers,
    clock: Arc<dyn Clock>,
}

impl DocumentScaffolder {
    /// Creates a scaffolder over the given collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        meta: Arc<dyn MetaStore>,
        permissions: Arc<dyn PermissionEngine>,
        defaults: Arc<dyn DefaultsStore>,
        hooks: Arc<dyn DocumentHooks>,
        translator: Arc<dyn Translator>,
        resolvers: DefaultResolvers,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            meta,
            permissions,
            defaults,
            hooks,
            translator,
            resolvers,
            clock,
        }
    }

    /// Returns a new `doctype` document for the caller.
    ///
    /// The caller must hold `create` on `doctype`. When
    /// `with_mandatory_children` is set, every required table field gets one
    /// default-filled row.
    ///
    /// # Errors
    ///
    /// - `Violation` with `PermissionDenied` when `create` is refused; nothing
    ///   is constructed
    /// - `FrameworkError` from schema lookup or hooks, unchanged
    pub fn get_new_doc(
        &self,
        ctx: &Ctx<Authed>,
        doctype: &str,
        with_mandatory_children: bool,
    ) -> Result<NewDocument, Error> {
        let grants = PermissionGate::new(ctx, self.permissions.as_ref(), self.translator.as_ref())
            .require(CanCreate::doctype(doctype))
            .build()?;

        let cap = grants.create(doctype).ok_or_else(|| {
            FrameworkError::Internal(format!("create grant for {doctype} missing after check"))
        })?;

        let doc = self.scaffold(ctx, cap, with_mandatory_children)?;
        ctx.log().debug(format_args!(
            "scaffolded new {} ({} fields)",
            doctype,
            doc.as_map().len()
        ));
        Ok(doc)
    }

    /// Builds a document for a doctype the caller already holds `create` on.
    ///
    /// # Errors
    ///
    /// `FrameworkError` from schema lookup, default lookup or hooks. A
    /// required table field without a child doctype in its options is a
    /// `FrameworkError::Validation`.
    pub fn scaffold(
        &self,
        ctx: &Ctx<Authed>,
        cap: &CreateCap,
        with_mandatory_children: bool,
    ) -> Result<NewDocument, FrameworkError> {
        let meta = self.meta.get_meta(cap.doctype())?;
        let env = ResolveEnv {
            user: ctx.identity().user_id(),
            now: self.clock.now(),
        };

        let mut doc = NewDocument::new(&meta.name, env.user, meta.issingle);
        apply_defaults(&mut doc, &meta, &env, self.defaults.as_ref(), &self.resolvers)?;
        self.hooks.after_new(&mut doc)?;

        if with_mandatory_children {
            for table in meta.mandatory_tables() {
                let child_type = table
                    .options
                    .as_deref()
                    .filter(|o| !o.is_empty())
                    .ok_or_else(|| {
                        FrameworkError::Validation(format!(
                            "table field {} of {} names no child doctype",
                            table.fieldname, meta.name
                        ))
                    })?;

                let child_meta = self.meta.get_meta(child_type)?;
                let mut row = NewDocument::new(&child_meta.name, env.user, false);
                apply_defaults(
                    &mut row,
                    &child_meta,
                    &env,
                    self.defaults.as_ref(),
                    &self.resolvers,
                )?;
                doc.append(&table.fieldname, row);
            }
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_ctx;
    use crate::defaults::FixedClock;
    use crate::error::ViolationKind;
    use crate::i18n::Untranslated;
    use crate::memory::{HookRegistry, MemoryFramework};
    use crate::meta::{DocTypeMeta, FieldMeta, FieldType, PermissionType};
    use crate::request::Principal;
    use crate::session::Session;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::datetime;

    const ALICE: &str = "alice@example.com";

    fn alice() -> Ctx<Authed> {
        test_ctx(Session::for_user("sid-a", Principal::new(ALICE, "Alice")))
            .authenticate()
            .unwrap()
    }

    fn sales_order_backend() -> Arc<MemoryFramework> {
        let fw = Arc::new(MemoryFramework::new());
        fw.add_doctype(
            DocTypeMeta::new("Sales Order", "Selling")
                .field(FieldMeta::new("transaction_date", FieldType::Date).default_value("Today"))
                .field(FieldMeta::new("customer", FieldType::Link).options("Customer"))
                .field(
                    FieldMeta::new("items", FieldType::Table)
                        .options("Sales Order Item")
                        .required(),
                )
                .field(FieldMeta::new("taxes", FieldType::Table).options("Sales Taxes")),
        );
        fw.add_doctype(
            DocTypeMeta::new("Sales Order Item", "Selling")
                .child_table()
                .field(FieldMeta::new("qty", FieldType::Float).default_value("1")),
        );
        fw.add_doctype(DocTypeMeta::new("Sales Taxes", "Selling").child_table());
        fw
    }

    fn scaffolder(fw: &Arc<MemoryFramework>, hooks: Arc<dyn DocumentHooks>) -> DocumentScaffolder {
        DocumentScaffolder::new(
            fw.clone(),
            fw.clone(),
            fw.clone(),
            hooks,
            Arc::new(Untranslated),
            DefaultResolvers::standard(),
            Arc::new(FixedClock(datetime!(2024-06-01 09:00 UTC))),
        )
    }

    #[test]
    fn new_doc_without_children_has_empty_tables() {
        let fw = sales_order_backend();
        fw.grant(ALICE, "Sales Order", PermissionType::Create);

        let doc = scaffolder(&fw, Arc::new(crate::framework::NoHooks))
            .get_new_doc(&alice(), "Sales Order", false)
            .unwrap();

        assert_eq!(doc.doctype(), "Sales Order");
        assert_eq!(doc.get("owner").unwrap(), ALICE);
        assert_eq!(doc.get("transaction_date").unwrap(), "2024-06-01");
        assert_eq!(doc.get("customer").unwrap(), &Value::Null);
        assert!(doc.rows("items").is_empty());
        assert!(doc.rows("taxes").is_empty());
    }

    #[test]
    fn mandatory_children_get_one_row_each() {
        let fw = sales_order_backend();
        fw.grant(ALICE, "Sales Order", PermissionType::Create);

        let doc = scaffolder(&fw, Arc::new(crate::framework::NoHooks))
            .get_new_doc(&alice(), "Sales Order", true)
            .unwrap();

        let items = doc.rows("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["doctype"], "Sales Order Item");
        assert_eq!(items[0]["parenttype"], "Sales Order");
        assert_eq!(items[0]["qty"], 1.0);
        assert!(doc.rows("taxes").is_empty());
    }

    #[test]
    fn denied_create_constructs_nothing() {
        let fw = sales_order_backend();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = HookRegistry::new();
        let seen = calls.clone();
        hooks.on_new("Sales Order", move |_doc: &mut NewDocument| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = scaffolder(&fw, Arc::new(hooks))
            .get_new_doc(&alice(), "Sales Order", true)
            .unwrap_err();

        assert_eq!(
            err.violation_kind(),
            Some(&ViolationKind::PermissionDenied {
                doctype: "Sales Order".to_string(),
                permission: PermissionType::Create,
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn hooks_run_after_defaults() {
        let fw = sales_order_backend();
        fw.grant(ALICE, "Sales Order", PermissionType::Create);
        let mut hooks = HookRegistry::new();
        hooks.on_new("Sales Order", |doc: &mut NewDocument| {
            let date = doc.get("transaction_date").cloned().unwrap_or(Value::Null);
            doc.set("delivery_date", date);
            Ok(())
        });

        let doc = scaffolder(&fw, Arc::new(hooks))
            .get_new_doc(&alice(), "Sales Order", false)
            .unwrap();

        assert_eq!(doc.get("delivery_date").unwrap(), "2024-06-01");
    }

    #[test]
    fn hook_errors_propagate() {
        let fw = sales_order_backend();
        fw.grant(ALICE, "Sales Order", PermissionType::Create);
        let mut hooks = HookRegistry::new();
        hooks.on_new("Sales Order", |_doc: &mut NewDocument| {
            Err(FrameworkError::Validation("company is not set up".to_string()))
        });

        let err = scaffolder(&fw, Arc::new(hooks))
            .get_new_doc(&alice(), "Sales Order", false)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Framework(FrameworkError::Validation(ref m)) if m == "company is not set up"
        ));
    }

    #[test]
    fn unknown_doctype_is_does_not_exist() {
        let fw = sales_order_backend();

        let err = scaffolder(&fw, Arc::new(crate::framework::NoHooks))
            .get_new_doc(&alice(), "Nope", false)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Framework(FrameworkError::DoesNotExist { .. })
        ));
    }

    #[test]
    fn mandatory_table_without_child_type_is_validation_error() {
        let fw = Arc::new(MemoryFramework::new());
        fw.add_doctype(
            DocTypeMeta::new("Broken", "Custom")
                .field(FieldMeta::new("rows", FieldType::Table).required()),
        );
        fw.grant(ALICE, "Broken", PermissionType::Create);

        let err = scaffolder(&fw, Arc::new(crate::framework::NoHooks))
            .get_new_doc(&alice(), "Broken", true)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Framework(FrameworkError::Validation(_))
        ));
    }
}
