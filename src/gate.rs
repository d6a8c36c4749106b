use crate::capability::CreateCap;
use crate::context::Ctx;
use crate::error::{Error, Violation, ViolationKind};
use crate::framework::PermissionEngine;
use crate::i18n::{format_positional, Translator};
use crate::meta::PermissionType;
use crate::policy::PolicyReq;
use crate::state::Authed;

/// The permission enforcement gate.
///
/// `PermissionGate` is the only way to obtain a [`CreateCap`]. It asks the
/// framework's permission engine about every accumulated requirement and
/// fails on the first refusal with a localized `PermissionDenied` violation.
///
/// ```ignore
/// let grants = PermissionGate::new(&ctx, permissions, translator)
///     .require(CanCreate::doctype("Sales Order"))
///     .build()?;
/// let cap = grants.create("Sales Order").expect("granted");
/// ```
pub struct PermissionGate<'a> {
    ctx: &'a Ctx<Authed>,
    engine: &'a dyn PermissionEngine,
    translator: &'a dyn Translator,
    requirements: Vec<PolicyReq>,
}

impl<'a> PermissionGate<'a> {
    /// Creates a gate for the caller in `ctx`.
    pub fn new(
        ctx: &'a Ctx<Authed>,
        engine: &'a dyn PermissionEngine,
        translator: &'a dyn Translator,
    ) -> Self {
        Self {
            ctx,
            engine,
            translator,
            requirements: Vec::new(),
        }
    }

    /// Adds a requirement, ignoring exact duplicates.
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();
        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }
        self
    }

    /// Checks every requirement and grants the capabilities they imply.
    ///
    /// # Errors
    ///
    /// - `Violation` with `PermissionDenied` for the first refused requirement
    /// - `Violation` with `Unauthenticated` if the session names no user
    /// - any `FrameworkError` raised by the permission engine, unchanged
    pub fn build(self) -> Result<Grants, Error> {
        let user = self.ctx.user()?;
        let mut grants = Grants::default();

        for req in &self.requirements {
            let PolicyReq::Can {
                doctype,
                permission,
            } = req;

            if !self.engine.has_permission(doctype, *permission, user)? {
                self.ctx.log().warn(format_args!(
                    "permission denied: {} on {}",
                    permission, doctype
                ));
                return Err(self.denied(doctype, *permission).into());
            }

            if *permission == PermissionType::Create {
                grants.create.push(CreateCap::new(doctype.as_str()));
            }
        }

        Ok(grants)
    }

    fn denied(&self, doctype: &str, permission: PermissionType) -> Violation {
        let lang = self.ctx.lang();
        let doctype_label = self.translator.translate(lang, doctype);

        let message = match permission {
            PermissionType::Create => {
                let template = self.translator.translate(lang, "No permission to create {0}");
                format_positional(&template, &[doctype_label.as_ref()])
            }
            other => {
                let ptype = other.to_string();
                let ptype_label = self.translator.translate(lang, &ptype);
                let template = self.translator.translate(lang, "No {0} permission for {1}");
                format_positional(&template, &[ptype_label.as_ref(), doctype_label.as_ref()])
            }
        };

        Violation::new(
            ViolationKind::PermissionDenied {
                doctype: doctype.to_string(),
                permission,
            },
            message,
        )
    }
}

/// Capabilities granted by a successful [`PermissionGate::build`].
#[derive(Debug, Default)]
pub struct Grants {
    create: Vec<CreateCap>,
}

impl Grants {
    /// The create capability for `doctype`, if it was required and granted.
    pub fn create(&self, doctype: &str) -> Option<&CreateCap> {
        self.create.iter().find(|cap| cap.doctype() == doctype)
    }
}
