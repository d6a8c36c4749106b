//! Collaborator interfaces for the wrapped framework.
//!
//! The host application implements these traits against its real session
//! store, schema engine and permission engine. [`crate::memory`] has an
//! in-memory implementation of every one of them.

use crate::boot::BootPayload;
use crate::document::NewDocument;
use crate::meta::{DocTypeMeta, DocTypeQuery, ObjectTypeDescriptor, PermissionType};
use crate::request::Principal;
use crate::session::Session;

/// Errors raised by the framework.
///
/// This layer never inspects or rewrites these; they travel to the caller
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameworkError {
    /// A record was looked up by name and not found
    #[error("{doctype} {name} not found")]
    DoesNotExist {
        /// Doctype that was searched
        doctype: String,
        /// Name that was not found
        name: String,
    },

    /// A hook or validation rejected the document
    #[error("validation failed: {0}")]
    Validation(String),

    /// The session store could not be read or written
    #[error("session store error: {0}")]
    SessionStore(String),

    /// Any other framework failure
    #[error("internal framework error: {0}")]
    Internal(String),
}

/// Builds the initialization payload the framework's own client receives.
pub trait BootSource: Send + Sync {
    /// Returns the boot payload for `session`.
    fn boot_info(&self, session: &Session) -> Result<BootPayload, FrameworkError>;
}

/// Schema lookups and doctype listing.
pub trait MetaStore: Send + Sync {
    /// Returns the schema for `doctype`.
    ///
    /// # Errors
    ///
    /// `FrameworkError::DoesNotExist` for unknown doctypes.
    fn get_meta(&self, doctype: &str) -> Result<DocTypeMeta, FrameworkError>;

    /// Lists doctypes matching `query`, ordered by name.
    ///
    /// Implementations must honour `query.limit`; `PageLimit::Default` applies
    /// the framework's default page length.
    fn list_doctypes(&self, query: &DocTypeQuery)
        -> Result<Vec<ObjectTypeDescriptor>, FrameworkError>;
}

/// The framework's permission engine.
pub trait PermissionEngine: Send + Sync {
    /// Whether `user` holds `ptype` on `doctype`.
    fn has_permission(
        &self,
        doctype: &str,
        ptype: PermissionType,
        user: &Principal,
    ) -> Result<bool, FrameworkError>;
}

/// Restrictions a user has on a linked doctype.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPermissions {
    /// Records the user may reference
    pub allowed: Vec<String>,
    /// Record marked as the user's default
    pub default: Option<String>,
}

impl UserPermissions {
    /// Whether `value` is one of the allowed records.
    pub fn allows(&self, value: &str) -> bool {
        self.allowed.iter().any(|v| v == value)
    }
}

/// User and system default values.
pub trait DefaultsStore: Send + Sync {
    /// Per-user default for `key`.
    fn user_default(&self, user: &str, key: &str) -> Result<Option<String>, FrameworkError>;

    /// System-wide default for `key`.
    fn global_default(&self, key: &str) -> Result<Option<String>, FrameworkError>;

    /// User-permission restrictions on `doctype`, `None` when unrestricted.
    fn user_permissions(
        &self,
        user: &str,
        doctype: &str,
    ) -> Result<Option<UserPermissions>, FrameworkError>;
}

/// Session persistence.
pub trait SessionStore: Send + Sync {
    /// Loads a session by id.
    fn load(&self, sid: &str) -> Result<Option<Session>, FrameworkError>;

    /// Writes `session` immediately, bypassing any lazy-update window.
    ///
    /// Concurrent writers of the same session: last write wins.
    fn persist(&self, session: &Session) -> Result<(), FrameworkError>;
}

/// Doctype-specific setup run on freshly constructed documents.
pub trait DocumentHooks: Send + Sync {
    /// Called once after defaults are applied, before mandatory child rows
    /// are added.
    fn after_new(&self, doc: &mut NewDocument) -> Result<(), FrameworkError>;
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl DocumentHooks for NoHooks {
    fn after_new(&self, _doc: &mut NewDocument) -> Result<(), FrameworkError> {
        Ok(())
    }
}
