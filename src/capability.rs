/// Capability granting permission to construct new documents of one doctype.
///
/// Acts as proof that the permission engine allowed `create` on
/// [`doctype`](Self::doctype) for the caller. Only the
/// [`PermissionGate`](crate::PermissionGate) mints it, so the scaffolder
/// cannot be reached without the check having run.
///
/// ```compile_fail
/// # use deskgate::CreateCap;
/// // CreateCap cannot be constructed outside the crate:
/// let cap = CreateCap { doctype: "Item".to_string(), _private: () };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCap {
    doctype: String,
    _private: (),
}

impl CreateCap {
    /// Creates a new CreateCap.
    ///
    /// This is `pub(crate)` so only the permission gate can create it.
    pub(crate) fn new(doctype: impl Into<String>) -> Self {
        Self {
            doctype: doctype.into(),
            _private: (),
        }
    }

    /// The doctype this capability covers.
    pub fn doctype(&self) -> &str {
        &self.doctype
    }
}
