//! In-memory implementation of every framework collaborator.
//!
//! Useful for tests and for running the API without a real backend. All
//! state sits behind `RwLock`s; a poisoned lock surfaces as
//! `FrameworkError::Internal` from trait methods, while the setup helpers
//! recover the guard and carry on.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use serde_json::{json, Map, Value};

use crate::boot::BootPayload;
use crate::config::{Config, ListConfig};
use crate::document::NewDocument;
use crate::framework::{
    BootSource, DefaultsStore, DocumentHooks, FrameworkError, MetaStore, PermissionEngine,
    SessionStore, UserPermissions,
};
use crate::meta::{DocTypeMeta, DocTypeQuery, ObjectTypeDescriptor, PageLimit, PermissionType};
use crate::request::Principal;
use crate::session::Session;

fn poisoned<T>(_: PoisonError<T>) -> FrameworkError {
    FrameworkError::Internal("in-memory store lock poisoned".to_string())
}

/// A complete framework backend held in memory.
#[derive(Debug)]
pub struct MemoryFramework {
    doctypes: RwLock<BTreeMap<String, DocTypeMeta>>,
    permissions: RwLock<HashSet<(String, String, PermissionType)>>,
    user_defaults: RwLock<HashMap<(String, String), String>>,
    global_defaults: RwLock<HashMap<String, String>>,
    user_permissions: RwLock<HashMap<(String, String), UserPermissions>>,
    sessions: RwLock<HashMap<String, Session>>,
    persist_count: AtomicUsize,
    page_length: usize,
}

impl Default for MemoryFramework {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFramework {
    /// Creates an empty backend with the framework's default page length.
    pub fn new() -> Self {
        Self {
            doctypes: RwLock::default(),
            permissions: RwLock::default(),
            user_defaults: RwLock::default(),
            global_defaults: RwLock::default(),
            user_permissions: RwLock::default(),
            sessions: RwLock::default(),
            persist_count: AtomicUsize::new(0),
            page_length: ListConfig::default().default_page_length,
        }
    }

    /// Creates an empty backend using the `[list]` settings of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_page_length(config.list.default_page_length)
    }

    /// Sets the cap applied to `PageLimit::Default` listings.
    pub fn with_page_length(mut self, page_length: usize) -> Self {
        self.page_length = page_length;
        self
    }

    /// Registers a doctype, replacing one of the same name.
    pub fn add_doctype(&self, meta: DocTypeMeta) {
        self.doctypes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(meta.name.clone(), meta);
    }

    /// Grants `ptype` on `doctype` to `user`.
    pub fn grant(&self, user: &str, doctype: &str, ptype: PermissionType) {
        self.permissions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user.to_string(), doctype.to_string(), ptype));
    }

    /// Sets a per-user default.
    pub fn set_user_default(&self, user: &str, key: &str, value: &str) {
        self.user_defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user.to_string(), key.to_string()), value.to_string());
    }

    /// Sets a system-wide default.
    pub fn set_global_default(&self, key: &str, value: &str) {
        self.global_defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    /// Restricts which `doctype` records `user` may reference.
    pub fn restrict(&self, user: &str, doctype: &str, permissions: UserPermissions) {
        self.user_permissions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user.to_string(), doctype.to_string()), permissions);
    }

    /// Stores a session without counting it as a forced write.
    pub fn insert_session(&self, session: Session) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.sid.clone(), session);
    }

    /// The stored copy of session `sid`.
    pub fn session(&self, sid: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sid)
            .cloned()
    }

    /// Number of forced session writes so far.
    pub fn persist_count(&self) -> usize {
        self.persist_count.load(Ordering::SeqCst)
    }

    fn modules(&self) -> Result<Map<String, Value>, FrameworkError> {
        let doctypes = self.doctypes.read().map_err(poisoned)?;
        let mut modules = Map::new();
        for meta in doctypes.values() {
            modules
                .entry(meta.module.clone())
                .or_insert_with(|| json!({ "label": meta.module }));
        }
        Ok(modules)
    }

    fn doctypes_with(
        &self,
        user: &Principal,
        ptype: PermissionType,
    ) -> Result<Vec<String>, FrameworkError> {
        let permissions = self.permissions.read().map_err(poisoned)?;
        let mut names: Vec<String> = permissions
            .iter()
            .filter(|(u, _, p)| *u == user.id && *p == ptype)
            .map(|(_, d, _)| d.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

impl BootSource for MemoryFramework {
    fn boot_info(&self, session: &Session) -> Result<BootPayload, FrameworkError> {
        let mut boot = BootPayload::new();

        let (can_create, can_read) = match session.user.principal() {
            Some(p) => (
                self.doctypes_with(p, PermissionType::Create)?,
                self.doctypes_with(p, PermissionType::Read)?,
            ),
            None => (Vec::new(), Vec::new()),
        };
        let full_name = session
            .user
            .principal()
            .map_or(session.user.user_id(), |p| p.name.as_str());

        boot.insert(
            "user",
            json!({
                "name": session.user.user_id(),
                "full_name": full_name,
                "can_create": can_create,
                "can_read": can_read,
            }),
        );
        boot.insert("sid", session.sid.as_str());
        boot.insert("lang", "en");
        boot.insert("modules", self.modules()?);
        let sysdefaults: Map<String, Value> = self
            .global_defaults
            .read()
            .map_err(poisoned)?
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        boot.insert("sysdefaults", sysdefaults);
        boot.insert("home_page", "app");
        Ok(boot)
    }
}

impl MetaStore for MemoryFramework {
    fn get_meta(&self, doctype: &str) -> Result<DocTypeMeta, FrameworkError> {
        self.doctypes
            .read()
            .map_err(poisoned)?
            .get(doctype)
            .cloned()
            .ok_or_else(|| FrameworkError::DoesNotExist {
                doctype: "DocType".to_string(),
                name: doctype.to_string(),
            })
    }

    fn list_doctypes(
        &self,
        query: &DocTypeQuery,
    ) -> Result<Vec<ObjectTypeDescriptor>, FrameworkError> {
        let limit = match query.limit {
            PageLimit::Default => Some(self.page_length),
            PageLimit::Unbounded => None,
        };

        let doctypes = self.doctypes.read().map_err(poisoned)?;
        let matching = doctypes
            .values()
            .filter(|meta| query.matches(meta))
            .map(DocTypeMeta::descriptor);

        Ok(match limit {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        })
    }
}

impl PermissionEngine for MemoryFramework {
    fn has_permission(
        &self,
        doctype: &str,
        ptype: PermissionType,
        user: &Principal,
    ) -> Result<bool, FrameworkError> {
        if !self.doctypes.read().map_err(poisoned)?.contains_key(doctype) {
            return Err(FrameworkError::DoesNotExist {
                doctype: "DocType".to_string(),
                name: doctype.to_string(),
            });
        }

        Ok(self.permissions.read().map_err(poisoned)?.contains(&(
            user.id.clone(),
            doctype.to_string(),
            ptype,
        )))
    }
}

impl DefaultsStore for MemoryFramework {
    fn user_default(&self, user: &str, key: &str) -> Result<Option<String>, FrameworkError> {
        Ok(self
            .user_defaults
            .read()
            .map_err(poisoned)?
            .get(&(user.to_string(), key.to_string()))
            .cloned())
    }

    fn global_default(&self, key: &str) -> Result<Option<String>, FrameworkError> {
        Ok(self.global_defaults.read().map_err(poisoned)?.get(key).cloned())
    }

    fn user_permissions(
        &self,
        user: &str,
        doctype: &str,
    ) -> Result<Option<UserPermissions>, FrameworkError> {
        Ok(self
            .user_permissions
            .read()
            .map_err(poisoned)?
            .get(&(user.to_string(), doctype.to_string()))
            .cloned())
    }
}

impl SessionStore for MemoryFramework {
    fn load(&self, sid: &str) -> Result<Option<Session>, FrameworkError> {
        Ok(self.sessions.read().map_err(poisoned)?.get(sid).cloned())
    }

    fn persist(&self, session: &Session) -> Result<(), FrameworkError> {
        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.sid.clone(), session.clone());
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

type Hook = Box<dyn Fn(&mut NewDocument) -> Result<(), FrameworkError> + Send + Sync>;

/// Post-construction hooks registered per doctype.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Vec<Hook>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `hook` on every new `doctype` document, after earlier hooks.
    pub fn on_new<F>(&mut self, doctype: impl Into<String>, hook: F)
    where
        F: Fn(&mut NewDocument) -> Result<(), FrameworkError> + Send + Sync + 'static,
    {
        self.hooks
            .entry(doctype.into())
            .or_default()
            .push(Box::new(hook));
    }
}

impl DocumentHooks for HookRegistry {
    fn after_new(&self, doc: &mut NewDocument) -> Result<(), FrameworkError> {
        let Some(hooks) = self.hooks.get(doc.doctype()) else {
            return Ok(());
        };
        for hook in hooks {
            hook(doc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal::new("alice@example.com", "Alice")
    }

    #[test]
    fn default_listing_is_capped_by_page_length() {
        let fw = MemoryFramework::new().with_page_length(3);
        for name in ["A", "B", "C", "D", "E"] {
            fw.add_doctype(DocTypeMeta::new(name, "Core"));
        }

        let capped = fw.list_doctypes(&DocTypeQuery::default()).unwrap();
        let all = fw
            .list_doctypes(&DocTypeQuery {
                limit: PageLimit::Unbounded,
                ..DocTypeQuery::default()
            })
            .unwrap();

        assert_eq!(capped.len(), 3);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn configured_page_length_caps_default_listing() {
        let config = Config::from_toml_str("[list]\ndefault-page-length = 2").unwrap();
        let fw = MemoryFramework::from_config(&config);
        for name in ["A", "B", "C"] {
            fw.add_doctype(DocTypeMeta::new(name, "Core"));
        }

        assert_eq!(fw.list_doctypes(&DocTypeQuery::default()).unwrap().len(), 2);

        let fw = MemoryFramework::from_config(&Config::default());
        for i in 0..25 {
            fw.add_doctype(DocTypeMeta::new(format!("Type {i:02}"), "Core"));
        }
        assert_eq!(fw.list_doctypes(&DocTypeQuery::default()).unwrap().len(), 20);
    }

    #[test]
    fn unknown_doctype_permission_is_does_not_exist() {
        let fw = MemoryFramework::new();
        let err = fw
            .has_permission("Ghost", PermissionType::Read, &alice())
            .unwrap_err();
        assert_eq!(
            err,
            FrameworkError::DoesNotExist {
                doctype: "DocType".to_string(),
                name: "Ghost".to_string(),
            }
        );
    }

    #[test]
    fn permissions_are_per_type() {
        let fw = MemoryFramework::new();
        fw.add_doctype(DocTypeMeta::new("Item", "Stock"));
        fw.grant("alice@example.com", "Item", PermissionType::Read);

        assert!(fw
            .has_permission("Item", PermissionType::Read, &alice())
            .unwrap());
        assert!(!fw
            .has_permission("Item", PermissionType::Create, &alice())
            .unwrap());
    }

    #[test]
    fn persist_counts_forced_writes() {
        let fw = MemoryFramework::new();
        fw.insert_session(Session::guest());
        assert_eq!(fw.persist_count(), 0);

        fw.persist(&Session::for_user("s1", alice())).unwrap();
        assert_eq!(fw.persist_count(), 1);
        assert!(fw.load("s1").unwrap().is_some());
    }

    #[test]
    fn boot_info_describes_user_and_modules() {
        let fw = MemoryFramework::new();
        fw.add_doctype(DocTypeMeta::new("Item", "Stock"));
        fw.add_doctype(DocTypeMeta::new("Customer", "Selling"));
        fw.grant("alice@example.com", "Item", PermissionType::Create);

        let boot = fw.boot_info(&Session::for_user("s1", alice())).unwrap();

        assert_eq!(boot.user(), Some("alice@example.com"));
        let user = boot.get("user").unwrap();
        assert_eq!(user["full_name"], "Alice");
        assert_eq!(user["can_create"], json!(["Item"]));
        assert!(boot.get("modules").unwrap().get("Stock").is_some());
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let mut hooks = HookRegistry::new();
        hooks.on_new("ToDo", |doc: &mut NewDocument| {
            doc.set("status", "Open");
            Ok(())
        });
        hooks.on_new("ToDo", |doc: &mut NewDocument| {
            let status = doc.get("status").cloned().unwrap_or(Value::Null);
            doc.set("description", format!("starts {}", status.as_str().unwrap_or("")));
            Ok(())
        });

        let mut doc = NewDocument::new("ToDo", "alice@example.com", false);
        hooks.after_new(&mut doc).unwrap();
        assert_eq!(doc.get("description").unwrap(), "starts Open");

        let mut other = NewDocument::new("Note", "alice@example.com", false);
        hooks.after_new(&mut other).unwrap();
        assert!(other.get("status").is_none());
    }
}
