//! Localization of user-facing messages.

use std::borrow::Cow;
use std::collections::HashMap;

/// Translates source strings into a target language.
pub trait Translator: Send + Sync {
    /// Returns `source` rendered in `lang`, or `source` itself when there is
    /// no translation.
    fn translate<'a>(&'a self, lang: &str, source: &'a str) -> Cow<'a, str>;
}

/// Returns every string unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untranslated;

impl Translator for Untranslated {
    fn translate<'a>(&'a self, _lang: &str, source: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(source)
    }
}

/// Translations keyed by language and source string.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<(String, String), String>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation.
    pub fn insert(
        &mut self,
        lang: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) {
        self.entries
            .insert((lang.into(), source.into()), target.into());
    }
}

impl Translator for Catalog {
    fn translate<'a>(&'a self, lang: &str, source: &'a str) -> Cow<'a, str> {
        match self.entries.get(&(lang.to_string(), source.to_string())) {
            Some(target) => Cow::Borrowed(target.as_str()),
            None => Cow::Borrowed(source),
        }
    }
}

/// Substitutes positional `{0}`, `{1}`, … placeholders.
pub fn format_positional(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), arg);
    }
    out
}
