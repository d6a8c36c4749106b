//! Transient, unsaved documents.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A freshly constructed document that has not been saved.
///
/// Serialized as a flat key-value map: the framework's bookkeeping keys
/// (`doctype`, `__islocal`, `__unsaved`, `owner`, `docstatus`, `idx`)
/// plus one key per field. Key order is not preserved. Table fields hold
/// arrays of child rows.
/// Nothing here is ever written to storage by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    doctype: String,
    values: Map<String, Value>,
}

impl NewDocument {
    /// Creates a bare document owned by `owner`.
    ///
    /// Single doctypes are not marked `__unsaved`, matching how the framework
    /// treats settings pages.
    pub(crate) fn new(doctype: &str, owner: &str, issingle: bool) -> Self {
        let mut values = Map::new();
        values.insert("doctype".to_string(), Value::from(doctype));
        values.insert("__islocal".to_string(), Value::from(1));
        if !issingle {
            values.insert("__unsaved".to_string(), Value::from(1));
        }
        values.insert("owner".to_string(), Value::from(owner));
        values.insert("docstatus".to_string(), Value::from(0));
        values.insert("idx".to_string(), Value::from(0));

        Self {
            doctype: doctype.to_string(),
            values,
        }
    }

    /// The document's doctype.
    pub fn doctype(&self) -> &str {
        &self.doctype
    }

    /// Value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Sets `field` to `value`.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Child rows of a table field; empty when the field has none.
    pub fn rows(&self, table_field: &str) -> &[Value] {
        self.values
            .get(table_field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends `row` to a table field, linking it to this document.
    pub fn append(&mut self, table_field: &str, mut row: NewDocument) {
        let slot = self
            .values
            .entry(table_field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }

        if let Value::Array(rows) = slot {
            row.set("parentfield", table_field);
            row.set("parenttype", self.doctype.as_str());
            row.set("idx", rows.len() + 1);
            rows.push(Value::Object(row.values));
        }
    }

    /// Borrows the key-value form.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Consumes the document into its key-value form.
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl Serialize for NewDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
