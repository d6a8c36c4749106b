//! Default-value resolution for new documents.
//!
//! Fields are filled in schema order, first match wins:
//!
//! 1. Link fields: the user's permitted default record, then a user default,
//!    then a system default, as long as user permissions allow the value.
//! 2. The field's static default. Sentinels (`Today` on date fields,
//!    `__user`, `now`) are resolved through [`DefaultResolvers`]; literals
//!    are coerced to the field type.
//! 3. Select fields: the first option.
//!
//! Anything left over is `0` for numeric fields and `null` otherwise. Table
//! fields start as empty arrays.

use std::collections::HashMap;

use serde_json::{Number, Value};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::document::NewDocument;
use crate::framework::{DefaultsStore, FrameworkError, UserPermissions};
use crate::meta::{DocTypeMeta, FieldMeta, FieldType};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:6]");

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Dynamic default markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentinelKind {
    /// Current date
    Today,
    /// Current date and time
    Now,
    /// Current time of day
    CurrentTime,
    /// Id of the user constructing the document
    CurrentUser,
}

impl SentinelKind {
    /// Recognizes a sentinel in `field`'s raw default.
    pub fn detect(field: &FieldMeta, raw: &str) -> Option<Self> {
        match raw {
            "__user" => Some(SentinelKind::CurrentUser),
            r if r.eq_ignore_ascii_case("today") => match field.fieldtype {
                FieldType::Date | FieldType::Datetime => Some(SentinelKind::Today),
                _ => None,
            },
            r if r.eq_ignore_ascii_case("now") => match field.fieldtype {
                FieldType::Datetime => Some(SentinelKind::Now),
                FieldType::Time => Some(SentinelKind::CurrentTime),
                FieldType::Date => Some(SentinelKind::Today),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Inputs a sentinel resolver may use.
#[derive(Debug, Clone, Copy)]
pub struct ResolveEnv<'a> {
    /// User constructing the document
    pub user: &'a str,
    /// Instant captured once per construction
    pub now: OffsetDateTime,
}

/// Computes the value of one sentinel kind.
pub trait SentinelResolver: Send + Sync {
    /// Value for `field` under `env`.
    fn resolve(&self, field: &FieldMeta, env: &ResolveEnv<'_>) -> Result<Value, FrameworkError>;
}

impl<F> SentinelResolver for F
where
    F: Fn(&FieldMeta, &ResolveEnv<'_>) -> Result<Value, FrameworkError> + Send + Sync,
{
    fn resolve(&self, field: &FieldMeta, env: &ResolveEnv<'_>) -> Result<Value, FrameworkError> {
        self(field, env)
    }
}

fn format_now(env: &ResolveEnv<'_>, format: &[BorrowedFormatItem<'_>]) -> Result<Value, FrameworkError> {
    env.now
        .format(format)
        .map(Value::String)
        .map_err(|e| FrameworkError::Internal(format!("cannot format timestamp: {e}")))
}

/// Sentinel resolvers keyed by kind.
pub struct DefaultResolvers {
    resolvers: HashMap<SentinelKind, Box<dyn SentinelResolver>>,
}

impl DefaultResolvers {
    /// A registry with no resolvers; every sentinel is left unset.
    pub fn empty() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// The framework's standard resolvers.
    pub fn standard() -> Self {
        let mut resolvers = Self::empty();
        resolvers.register(SentinelKind::Today, |_: &FieldMeta, env: &ResolveEnv<'_>| {
            format_now(env, DATE_FORMAT)
        });
        resolvers.register(SentinelKind::Now, |_: &FieldMeta, env: &ResolveEnv<'_>| {
            format_now(env, DATETIME_FORMAT)
        });
        resolvers.register(
            SentinelKind::CurrentTime,
            |_: &FieldMeta, env: &ResolveEnv<'_>| format_now(env, TIME_FORMAT),
        );
        resolvers.register(
            SentinelKind::CurrentUser,
            |_: &FieldMeta, env: &ResolveEnv<'_>| Ok(Value::from(env.user)),
        );
        resolvers
    }

    /// Installs or replaces the resolver for `kind`.
    pub fn register(&mut self, kind: SentinelKind, resolver: impl SentinelResolver + 'static) {
        self.resolvers.insert(kind, Box::new(resolver));
    }

    /// Resolves `kind`, `None` when no resolver is registered.
    pub fn resolve(
        &self,
        kind: SentinelKind,
        field: &FieldMeta,
        env: &ResolveEnv<'_>,
    ) -> Result<Option<Value>, FrameworkError> {
        self.resolvers
            .get(&kind)
            .map(|r| r.resolve(field, env))
            .transpose()
    }
}

impl Default for DefaultResolvers {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fills every value-bearing field of `doc` from `meta`.
pub(crate) fn apply_defaults(
    doc: &mut NewDocument,
    meta: &DocTypeMeta,
    env: &ResolveEnv<'_>,
    store: &dyn DefaultsStore,
    resolvers: &DefaultResolvers,
) -> Result<(), FrameworkError> {
    for df in &meta.fields {
        if df.fieldtype.is_no_value() {
            continue;
        }
        if df.fieldtype.is_table() {
            doc.set(&df.fieldname, Value::Array(Vec::new()));
            continue;
        }

        let value = match resolve_field(df, env, store, resolvers)? {
            Some(value) => value,
            None if df.fieldtype.is_int() => Value::from(0),
            None if df.fieldtype.is_float() => Value::from(0.0),
            None => Value::Null,
        };
        doc.set(&df.fieldname, value);
    }
    Ok(())
}

fn resolve_field(
    df: &FieldMeta,
    env: &ResolveEnv<'_>,
    store: &dyn DefaultsStore,
    resolvers: &DefaultResolvers,
) -> Result<Option<Value>, FrameworkError> {
    let restriction = link_restriction(df, env, store)?;

    if is_user_defaultable_link(df) {
        if let Some(default) = restriction.as_ref().and_then(|r| r.default.clone()) {
            return Ok(Some(Value::String(default)));
        }

        let candidates = [
            store.user_default(env.user, &df.fieldname)?,
            store.global_default(&df.fieldname)?,
        ];
        for candidate in candidates.into_iter().flatten() {
            if restriction.as_ref().map_or(true, |r| r.allows(&candidate)) {
                return Ok(Some(Value::String(candidate)));
            }
        }
    }

    if let Some(raw) = df.default.as_deref().filter(|d| !d.is_empty()) {
        if let Some(kind) = SentinelKind::detect(df, raw) {
            return resolvers.resolve(kind, df, env);
        }
        // ":fieldname" defaults are copied from a parent document, which a
        // scaffolded document does not have
        if raw.starts_with(':') {
            return Ok(None);
        }
        if restriction.as_ref().map_or(false, |r| !r.allows(raw)) {
            return Ok(None);
        }
        return Ok(Some(coerce(df.fieldtype, raw)));
    }

    if df.fieldtype == FieldType::Select {
        if let Some(options) = df.options.as_deref().filter(|o| *o != "[Select]") {
            let first = options.split('\n').next().unwrap_or_default();
            return Ok(Some(Value::from(first)));
        }
    }

    Ok(None)
}

fn is_user_defaultable_link(df: &FieldMeta) -> bool {
    df.fieldtype == FieldType::Link && df.options.as_deref().map_or(false, |o| o != "User")
}

fn link_restriction(
    df: &FieldMeta,
    env: &ResolveEnv<'_>,
    store: &dyn DefaultsStore,
) -> Result<Option<UserPermissions>, FrameworkError> {
    if !is_user_defaultable_link(df) || df.ignore_user_permissions {
        return Ok(None);
    }
    match df.options.as_deref() {
        Some(linked) => store.user_permissions(env.user, linked),
        None => Ok(None),
    }
}

fn coerce(fieldtype: FieldType, raw: &str) -> Value {
    let trimmed = raw.trim();
    if fieldtype.is_int() {
        let parsed = trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
            .unwrap_or(0);
        return Value::from(parsed);
    }
    if fieldtype.is_float() {
        let parsed = trimmed.parse::<f64>().unwrap_or(0.0);
        return Number::from_f64(parsed).map_or(Value::from(0.0), Value::Number);
    }
    Value::from(raw)
}
