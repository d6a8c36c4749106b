//! Boot payload for freshly loading clients.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::BootConfig;
use crate::context::Ctx;
use crate::error::Error;
use crate::framework::{BootSource, FrameworkError, MetaStore};
use crate::meta::{DocTypeQuery, PageLimit};
use crate::request::GUEST;
use crate::state::Unauthed;

/// Initialization data for a client, as a JSON object.
///
/// Keys are not kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BootPayload(Map<String, Value>);

impl BootPayload {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// The `user` entry as a user id.
    ///
    /// Accepts both shapes the framework uses: a bare id string or an object
    /// with a `name` key.
    pub fn user(&self) -> Option<&str> {
        match self.0.get("user")? {
            Value::String(s) => Some(s),
            Value::Object(o) => o.get("name").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Entries of `all_doctypes`; empty if absent.
    pub fn all_doctypes(&self) -> &[Value] {
        self.0
            .get("all_doctypes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Consumes the payload into its JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for BootPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Which revision of the boot endpoint to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootVariant {
    /// Guest fast path plus the full `all_doctypes` listing
    #[default]
    Augmented,
    /// The framework's boot info as-is, for every caller
    Passthrough,
}

/// Serves [`get_boot`](Self::get_boot).
pub struct BootProvider {
    source: Arc<dyn BootSource>,
    meta: Arc<dyn MetaStore>,
    variant: BootVariant,
    guest_message: String,
}

impl BootProvider {
    /// Creates a provider over the framework's boot source and schema store.
    pub fn new(source: Arc<dyn BootSource>, meta: Arc<dyn MetaStore>, config: &BootConfig) -> Self {
        Self {
            source,
            meta,
            variant: config.variant,
            guest_message: config.guest_message.clone(),
        }
    }

    /// Returns the boot payload for the caller's session.
    ///
    /// Guests get a minimal payload without touching the framework. Logged-in
    /// users get the framework's boot info with `all_doctypes` set to every
    /// regular doctype, ordered by name and never truncated.
    ///
    /// # Errors
    ///
    /// Framework errors from either lookup, unchanged.
    pub fn get_boot(&self, ctx: &Ctx<Unauthed>) -> Result<BootPayload, Error> {
        if self.variant == BootVariant::Passthrough {
            ctx.log().debug(format_args!("serving passthrough boot"));
            return Ok(self.source.boot_info(ctx.session())?);
        }

        if ctx.identity().is_guest() {
            ctx.log().info(format_args!("serving guest boot"));
            return Ok(self.guest_boot());
        }

        let mut boot = self.source.boot_info(ctx.session())?;
        let doctypes = self.meta.list_doctypes(&DocTypeQuery {
            istable: Some(false),
            issingle: Some(false),
            limit: PageLimit::Unbounded,
        })?;

        ctx.log().info(format_args!(
            "serving boot with {} doctypes",
            doctypes.len()
        ));

        let listing = serde_json::to_value(doctypes)
            .map_err(|e| FrameworkError::Internal(e.to_string()))?;
        boot.insert("all_doctypes", listing);
        Ok(boot)
    }

    fn guest_boot(&self) -> BootPayload {
        let mut boot = BootPayload::new();
        boot.insert("user", GUEST);
        boot.insert("all_doctypes", Value::Array(Vec::new()));
        boot.insert("modules", Value::Object(Map::new()));
        boot.insert("message", self.guest_message.as_str());
        boot
    }
}
