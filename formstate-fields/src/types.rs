//! Declarative field schema types.
//!
//! All types serialize to/from YAML via serde. A collection is a named list of
//! fields; fields nest through groups, arrays, block variants, unnamed layout
//! containers and tabs. Validators and default suppliers are referenced by
//! name and bound at run time through [`crate::FieldHooks`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single option in a select field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The declared default of a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// A literal value used as-is when the document has none.
    Value(Value),
    /// The name of an async supplier registered in [`crate::FieldHooks`].
    Supplier(String),
}

/// Admin-panel options that influence form state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Admin {
    /// Rows of an array or blocks field start collapsed when no preference exists.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub init_collapsed: bool,
    /// Opaque identifier handed to the caller's visibility evaluator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Admin {
    fn is_default(&self) -> bool {
        self == &Admin::default()
    }
}

/// One variant of a blocks field, selected per row by `blockType`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockDef {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// One tab of a tabs field. A named tab nests its data under the name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// The type of a field. Determines what shape its data takes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Email,
    Number,
    Checkbox,
    Date,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        has_many: bool,
    },
    Json,
    /// Stores the id (or ids) of documents in another collection.
    Relationship {
        relation_to: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        has_many: bool,
    },
    /// Stores the id of an uploaded media document.
    Upload { relation_to: String },
    /// Named container; its data is a nested object.
    Group {
        #[serde(default)]
        fields: Vec<FieldSchema>,
    },
    /// Repeatable rows sharing one set of fields.
    Array {
        #[serde(default)]
        fields: Vec<FieldSchema>,
    },
    /// Repeatable rows, each governed by one of several block variants.
    Blocks {
        #[serde(default)]
        blocks: Vec<BlockDef>,
    },
    /// Horizontal layout row; contributes no data nesting.
    Row {
        #[serde(default)]
        fields: Vec<FieldSchema>,
    },
    /// Collapsible layout panel; contributes no data nesting.
    Collapsible {
        #[serde(default)]
        fields: Vec<FieldSchema>,
    },
    Tabs {
        #[serde(default)]
        tabs: Vec<TabDef>,
    },
    /// Presentational only; never holds data.
    Ui,
}

/// Closed dispatch view over a field's kind.
///
/// The walker and the schema checks match on this instead of on
/// [`FieldKind`] so every traversal handles the same small set of shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape<'a> {
    Scalar,
    Relationship,
    Group(&'a [FieldSchema]),
    Array(&'a [FieldSchema]),
    Blocks(&'a [BlockDef]),
    Unnamed(&'a [FieldSchema]),
    Tabs(&'a [TabDef]),
    Presentational,
}

impl FieldShape<'_> {
    /// Whether a field of this shape stores data under its own name.
    pub fn is_data_bearing(&self) -> bool {
        matches!(
            self,
            FieldShape::Scalar
                | FieldShape::Relationship
                | FieldShape::Group(_)
                | FieldShape::Array(_)
                | FieldShape::Blocks(_)
        )
    }
}

/// A field definition: one node of a collection's schema tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Written as a single-key map, `value: ..` or `supplier: ..`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml_ng::with::singleton_map"
    )]
    pub default: Option<DefaultValue>,
    /// Name of a validator registered in [`crate::FieldHooks`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<String>,
    #[serde(default, skip_serializing_if = "Admin::is_default")]
    pub admin: Admin,
    /// Free-form attributes visible to validators.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

impl FieldSchema {
    /// A field of the given kind with every optional attribute unset.
    pub fn new(name: Option<&str>, kind: FieldKind) -> Self {
        Self {
            name: name.map(str::to_string),
            kind,
            label: None,
            required: false,
            default: None,
            validate: None,
            admin: Admin::default(),
            custom: Map::new(),
        }
    }

    /// Shorthand for a named data field.
    pub fn named(name: &str, kind: FieldKind) -> Self {
        Self::new(Some(name), kind)
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_validate(mut self, validator: &str) -> Self {
        self.validate = Some(validator.to_string());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_init_collapsed(mut self, collapsed: bool) -> Self {
        self.admin.init_collapsed = collapsed;
        self
    }

    pub fn with_custom(mut self, key: &str, value: Value) -> Self {
        self.custom.insert(key.to_string(), value);
        self
    }

    pub fn shape(&self) -> FieldShape<'_> {
        match &self.kind {
            FieldKind::Text
            | FieldKind::Textarea
            | FieldKind::Email
            | FieldKind::Number
            | FieldKind::Checkbox
            | FieldKind::Date
            | FieldKind::Select { .. }
            | FieldKind::Json => FieldShape::Scalar,
            FieldKind::Relationship { .. } | FieldKind::Upload { .. } => FieldShape::Relationship,
            FieldKind::Group { fields } => FieldShape::Group(fields),
            FieldKind::Array { fields } => FieldShape::Array(fields),
            FieldKind::Blocks { blocks } => FieldShape::Blocks(blocks),
            FieldKind::Row { fields } | FieldKind::Collapsible { fields } => {
                FieldShape::Unnamed(fields)
            }
            FieldKind::Tabs { tabs } => FieldShape::Tabs(tabs),
            FieldKind::Ui => FieldShape::Presentational,
        }
    }

    /// The field's name when it stores data under that name.
    pub fn data_name(&self) -> Option<&str> {
        match self.name.as_deref() {
            Some(name) if self.shape().is_data_bearing() => Some(name),
            _ => None,
        }
    }

    /// Kebab-case type tag, as written in YAML.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Email => "email",
            FieldKind::Number => "number",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Date => "date",
            FieldKind::Select { .. } => "select",
            FieldKind::Json => "json",
            FieldKind::Relationship { .. } => "relationship",
            FieldKind::Upload { .. } => "upload",
            FieldKind::Group { .. } => "group",
            FieldKind::Array { .. } => "array",
            FieldKind::Blocks { .. } => "blocks",
            FieldKind::Row { .. } => "row",
            FieldKind::Collapsible { .. } => "collapsible",
            FieldKind::Tabs { .. } => "tabs",
            FieldKind::Ui => "ui",
        }
    }
}

/// A collection definition: one editable document type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionDef {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl BlockDef {
    pub fn new(slug: &str, fields: Vec<FieldSchema>) -> Self {
        Self {
            slug: slug.to_string(),
            label: None,
            fields,
        }
    }
}

impl TabDef {
    pub fn new(name: Option<&str>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.map(str::to_string),
            label: None,
            fields,
        }
    }
}
