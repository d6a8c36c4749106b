use std::fmt;

use crate::framework::FrameworkError;
use crate::meta::PermissionType;

/// Errors returned by the API operations.
///
/// Violations are raised by this crate. Framework errors come from the
/// wrapped collaborators and are passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A check performed by this layer failed
    #[error("Policy violation: {0}")]
    Violation(#[from] Violation),

    /// An error raised by the underlying framework
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}

impl Error {
    /// Returns the violation kind, if this error was raised by this layer.
    pub fn violation_kind(&self) -> Option<&ViolationKind> {
        match self {
            Error::Violation(v) => Some(&v.kind),
            Error::Framework(_) => None,
        }
    }
}

/// A policy violation with details about what failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable, possibly localized message
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// The operation needs a logged-in user but the session is a guest session
    Unauthenticated,
    /// The permission engine refused the requested permission
    PermissionDenied {
        /// Doctype the permission was checked against
        doctype: String,
        /// Permission that was refused
        permission: PermissionType,
    },
    /// The anti-forgery header was missing or did not match the session token
    CsrfMismatch,
    /// A request parameter failed sanitization
    InvalidInput,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::PermissionDenied {
                doctype,
                permission,
            } => write!(f, "No '{}' permission on '{}'", permission, doctype),
            ViolationKind::CsrfMismatch => write!(f, "CSRF token mismatch"),
            ViolationKind::InvalidInput => write!(f, "Invalid input"),
        }
    }
}

impl From<crate::sanitizer::SanitizationError> for Violation {
    fn from(err: crate::sanitizer::SanitizationError) -> Self {
        Violation::new(ViolationKind::InvalidInput, err.to_string())
    }
}
