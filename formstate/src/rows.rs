//! Row identity and collapse state for array and blocks fields.

use std::collections::BTreeSet;

use formstate_fields::{BlockDef, FieldSchema, FieldShape};
use serde_json::{Map, Value};
use ulid::Ulid;

use crate::config::RowIdFormat;
use crate::context::Preferences;
use crate::state::RowMetadata;

pub const ROW_ID_KEY: &str = "id";
pub const BLOCK_TYPE_KEY: &str = "blockType";
pub const BLOCK_NAME_KEY: &str = "blockName";

/// The stable id already stored on a row: a non-empty string or a number.
pub fn row_id(row: &Value) -> Option<String> {
    row.get(ROW_ID_KEY).and_then(usable_id)
}

/// The block variant a row declares, if `blocks` has one with that slug.
pub fn find_block<'b>(blocks: &'b [BlockDef], row: &Value) -> Option<&'b BlockDef> {
    let slug = row.get(BLOCK_TYPE_KEY)?.as_str()?;
    blocks.iter().find(|block| block.slug == slug)
}

/// Whether a row renders collapsed.
///
/// A recorded preference for the container is authoritative, even an empty
/// one. Without it the field's `init_collapsed` applies.
pub fn is_collapsed(
    preferences: &Preferences,
    container_path: &str,
    row_id: &str,
    init_collapsed: bool,
) -> bool {
    match preferences.collapsed_rows(container_path) {
        Some(collapsed) => collapsed.iter().any(|id| id == row_id),
        None => init_collapsed,
    }
}

/// Assigns row ids and produces per-row metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowTracker {
    format: RowIdFormat,
}

impl RowTracker {
    pub fn new(format: RowIdFormat) -> Self {
        Self { format }
    }

    /// Mint a fresh row id.
    pub fn mint(&self) -> String {
        let ulid = Ulid::new();
        match self.format {
            RowIdFormat::Ulid => ulid.to_string(),
            RowIdFormat::ObjectId => {
                // Saturates past 2106, where 4 bytes of seconds run out.
                let seconds = u32::try_from(ulid.timestamp_ms() / 1000).unwrap_or(u32::MAX);
                let random = ulid.random() & u128::from(u64::MAX);
                format!("{seconds:08x}{random:016x}")
            }
        }
    }

    /// Return the row's id, minting and storing one if it has none.
    pub fn ensure_id(&self, row: &mut Map<String, Value>) -> String {
        if let Some(id) = row.get(ROW_ID_KEY).and_then(usable_id) {
            return id;
        }
        let id = self.mint();
        row.insert(ROW_ID_KEY.to_string(), Value::String(id.clone()));
        id
    }

    /// Give every row under `fields` an id, in place.
    ///
    /// Follows the same traversal as materialization: groups descend into
    /// their object, unnamed containers share the parent object, named tabs
    /// descend into their key. Block rows with an unknown `blockType` and
    /// non-object rows are left alone.
    pub fn stamp_fields(&self, fields: &[FieldSchema], data: &mut Value) {
        for field in fields {
            match field.shape() {
                FieldShape::Unnamed(children) => self.stamp_fields(children, data),
                FieldShape::Tabs(tabs) => {
                    for tab in tabs {
                        match tab.name.as_deref() {
                            Some(name) => {
                                if let Some(nested) = data.get_mut(name) {
                                    self.stamp_fields(&tab.fields, nested);
                                }
                            }
                            None => self.stamp_fields(&tab.fields, data),
                        }
                    }
                }
                _ => {
                    let Some(name) = field.data_name() else {
                        continue;
                    };
                    if let Some(value) = data.get_mut(name) {
                        self.stamp_value(field, value);
                    }
                }
            }
        }
    }

    /// Stamp the value held by a single data field.
    pub fn stamp_value(&self, field: &FieldSchema, value: &mut Value) {
        match field.shape() {
            FieldShape::Group(children) => self.stamp_fields(children, value),
            FieldShape::Array(children) => {
                let Some(rows) = value.as_array_mut() else {
                    return;
                };
                for row in rows {
                    if let Some(object) = row.as_object_mut() {
                        self.ensure_id(object);
                        self.stamp_fields(children, row);
                    }
                }
            }
            FieldShape::Blocks(blocks) => {
                let Some(rows) = value.as_array_mut() else {
                    return;
                };
                for row in rows {
                    let Some(block) = find_block(blocks, row) else {
                        continue;
                    };
                    if let Some(object) = row.as_object_mut() {
                        self.ensure_id(object);
                        self.stamp_fields(&block.fields, row);
                    }
                }
            }
            _ => {}
        }
    }

    /// Metadata for one row of the container at `container_path`.
    pub fn track_row(
        &self,
        row: &Value,
        container_path: &str,
        preferences: &Preferences,
        init_collapsed: bool,
        block_type: Option<&str>,
    ) -> RowMetadata {
        let id = row_id(row).unwrap_or_else(|| self.mint());
        RowMetadata {
            collapsed: is_collapsed(preferences, container_path, &id, init_collapsed),
            id,
            block_type: block_type.map(str::to_string),
            child_error_paths: BTreeSet::new(),
        }
    }
}

fn usable_id(id: &Value) -> Option<String> {
    match id {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
