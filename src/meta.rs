//! Doctype metadata as seen from this layer.
//!
//! Everything here is owned by the framework's schema engine; this crate only
//! reads it. The types mirror the columns the framework stores for a doctype
//! and its fields.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Permission types understood by the framework's permission engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    /// Read existing documents
    Read,
    /// Modify existing documents
    Write,
    /// Create new documents
    Create,
    /// Delete documents
    Delete,
    /// Submit submittable documents
    Submit,
    /// Cancel submitted documents
    Cancel,
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionType::Read => "read",
            PermissionType::Write => "write",
            PermissionType::Create => "create",
            PermissionType::Delete => "delete",
            PermissionType::Submit => "submit",
            PermissionType::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// Field types, named as the framework names them.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Data,
    Link,
    Select,
    Int,
    Check,
    Float,
    Currency,
    Percent,
    Date,
    Datetime,
    Time,
    Text,
    #[serde(rename = "Small Text")]
    SmallText,
    #[serde(rename = "Long Text")]
    LongText,
    #[serde(rename = "Text Editor")]
    TextEditor,
    Table,
    #[serde(rename = "Table MultiSelect")]
    TableMultiSelect,
    #[serde(rename = "Section Break")]
    SectionBreak,
    #[serde(rename = "Column Break")]
    ColumnBreak,
    #[serde(rename = "Tab Break")]
    TabBreak,
    #[serde(rename = "HTML")]
    Html,
    Button,
    Heading,
}

impl FieldType {
    /// Layout-only types that never hold a value.
    pub fn is_no_value(self) -> bool {
        matches!(
            self,
            FieldType::SectionBreak
                | FieldType::ColumnBreak
                | FieldType::TabBreak
                | FieldType::Html
                | FieldType::Button
                | FieldType::Heading
        )
    }

    /// Types whose value is a list of child rows.
    pub fn is_table(self) -> bool {
        matches!(self, FieldType::Table | FieldType::TableMultiSelect)
    }

    /// Integer-valued types.
    pub fn is_int(self) -> bool {
        matches!(self, FieldType::Int | FieldType::Check)
    }

    /// Float-valued types.
    pub fn is_float(self) -> bool {
        matches!(
            self,
            FieldType::Float | FieldType::Currency | FieldType::Percent
        )
    }
}

/// One field of a doctype schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Column name
    pub fieldname: String,
    /// Field type
    pub fieldtype: FieldType,
    /// Linked doctype for Link/Table fields, newline-separated choices for Select
    #[serde(default)]
    pub options: Option<String>,
    /// Static default, possibly a sentinel such as `Today`
    #[serde(default)]
    pub default: Option<String>,
    /// Whether the field is mandatory
    #[serde(default)]
    pub reqd: bool,
    /// Skip user-permission filtering for Link defaults
    #[serde(default)]
    pub ignore_user_permissions: bool,
}

impl FieldMeta {
    /// Creates a field with no options, default or flags.
    pub fn new(fieldname: impl Into<String>, fieldtype: FieldType) -> Self {
        Self {
            fieldname: fieldname.into(),
            fieldtype,
            options: None,
            default: None,
            reqd: false,
            ignore_user_permissions: false,
        }
    }

    /// Sets the options column.
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Sets the static default.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the field as mandatory.
    pub fn required(mut self) -> Self {
        self.reqd = true;
        self
    }

    /// Disables user-permission filtering for this field.
    pub fn ignoring_user_permissions(mut self) -> Self {
        self.ignore_user_permissions = true;
        self
    }
}

/// Schema of a doctype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocTypeMeta {
    /// Doctype name, unique
    pub name: String,
    /// Owning module
    pub module: String,
    /// Sidebar icon
    #[serde(default)]
    pub icon: Option<String>,
    /// Child table doctype
    #[serde(default)]
    pub istable: bool,
    /// Singleton (settings) doctype
    #[serde(default)]
    pub issingle: bool,
    /// Created through the UI rather than shipped by an app
    #[serde(default)]
    pub custom: bool,
    /// Fields in schema order
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

impl DocTypeMeta {
    /// Creates an empty, regular doctype in `module`.
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            icon: None,
            istable: false,
            issingle: false,
            custom: false,
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Marks this doctype as a child table.
    pub fn child_table(mut self) -> Self {
        self.istable = true;
        self
    }

    /// Marks this doctype as a singleton.
    pub fn single(mut self) -> Self {
        self.issingle = true;
        self
    }

    /// Marks this doctype as custom.
    pub fn custom(mut self) -> Self {
        self.custom = true;
        self
    }

    /// Sets the icon.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Required table fields, in schema order.
    pub fn mandatory_tables(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields
            .iter()
            .filter(|df| df.fieldtype.is_table() && df.reqd)
    }

    /// Navigation descriptor for this doctype.
    pub fn descriptor(&self) -> ObjectTypeDescriptor {
        ObjectTypeDescriptor {
            name: self.name.clone(),
            module: self.module.clone(),
            icon: self.icon.clone(),
            custom: self.custom,
        }
    }
}

/// Navigation record for a doctype, as listed in the boot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectTypeDescriptor {
    /// Doctype name
    pub name: String,
    /// Owning module
    pub module: String,
    /// Sidebar icon
    pub icon: Option<String>,
    /// Custom doctype flag, serialized as 0/1
    #[serde(serialize_with = "bool_as_int")]
    pub custom: bool,
}

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// How many rows a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLimit {
    /// The framework's default page length
    #[default]
    Default,
    /// Every matching row
    Unbounded,
}

/// Filter and paging for a doctype listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTypeQuery {
    /// Match on the child-table flag, if set
    pub istable: Option<bool>,
    /// Match on the singleton flag, if set
    pub issingle: Option<bool>,
    /// Row cap
    pub limit: PageLimit,
}

impl DocTypeQuery {
    /// Whether `meta` passes the filters.
    pub fn matches(&self, meta: &DocTypeMeta) -> bool {
        self.istable.map_or(true, |v| v == meta.istable)
            && self.issingle.map_or(true, |v| v == meta.issingle)
    }
}
