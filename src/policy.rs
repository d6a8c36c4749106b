use crate::meta::PermissionType;

/// A permission requirement evaluated by
/// [`PermissionGate::build`](crate::PermissionGate::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires `permission` on `doctype`
    Can {
        /// Doctype the permission is checked against
        doctype: String,
        /// Permission type
        permission: PermissionType,
    },
}

/// Requirement to hold `create` on a doctype.
///
/// Satisfying it makes the gate grant a [`CreateCap`](crate::CreateCap).
pub struct CanCreate(String);

impl CanCreate {
    /// Requires `create` on `doctype`.
    pub fn doctype(doctype: impl Into<String>) -> Self {
        Self(doctype.into())
    }
}

impl From<CanCreate> for PolicyReq {
    fn from(req: CanCreate) -> Self {
        PolicyReq::Can {
            doctype: req.0,
            permission: PermissionType::Create,
        }
    }
}
