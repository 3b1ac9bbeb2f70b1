//! Structural checks over a field schema.
//!
//! Two data-bearing siblings must never resolve to the same path key, which
//! has to account for unnamed containers and unnamed tabs flattening their
//! children into the parent's scope.

use std::collections::HashSet;

use crate::error::{FieldsError, Result};
use crate::path::PathPrefix;
use crate::types::{FieldSchema, FieldShape};

/// Check a field list for missing names, path collisions and duplicate block slugs.
pub fn check_fields(fields: &[FieldSchema]) -> Result<()> {
    check_scope(fields, &PathPrefix::root(), &mut HashSet::new())
}

fn check_scope(
    fields: &[FieldSchema],
    prefix: &PathPrefix,
    seen: &mut HashSet<String>,
) -> Result<()> {
    for field in fields {
        match field.shape() {
            FieldShape::Presentational => {}
            FieldShape::Unnamed(children) => check_scope(children, prefix, seen)?,
            FieldShape::Tabs(tabs) => {
                for tab in tabs {
                    match tab.name.as_deref() {
                        Some(name) => {
                            claim(seen, prefix.key(name))?;
                            check_scope(&tab.fields, &prefix.nested(name), &mut HashSet::new())?;
                        }
                        None => check_scope(&tab.fields, prefix, seen)?,
                    }
                }
            }
            shape => {
                let Some(name) = field.name.as_deref() else {
                    return Err(FieldsError::MissingName {
                        kind: field.type_name().to_string(),
                        path: prefix.to_string(),
                    });
                };
                claim(seen, prefix.key(name))?;

                match shape {
                    FieldShape::Group(children) => {
                        check_scope(children, &prefix.nested(name), &mut HashSet::new())?
                    }
                    FieldShape::Array(children) => {
                        check_scope(children, &prefix.row(name, 0), &mut HashSet::new())?
                    }
                    FieldShape::Blocks(blocks) => {
                        let mut slugs = HashSet::new();
                        for block in blocks {
                            if !slugs.insert(block.slug.as_str()) {
                                return Err(FieldsError::DuplicateBlockSlug {
                                    path: prefix.key(name),
                                    slug: block.slug.clone(),
                                });
                            }
                            check_scope(&block.fields, &prefix.row(name, 0), &mut HashSet::new())?;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

fn claim(seen: &mut HashSet<String>, path: String) -> Result<()> {
    if seen.insert(path.clone()) {
        Ok(())
    } else {
        Err(FieldsError::DuplicateFieldName { path })
    }
}
