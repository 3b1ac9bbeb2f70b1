//! Default-value resolution.

use std::borrow::Cow;

use formstate_fields::{
    DefaultContext, DefaultValue, FieldHooks, FieldSchema, FieldShape, FieldsError, PathPrefix,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{FormStateError, Result};
use crate::rows::find_block;

/// Resolve the effective value of a field.
///
/// An existing value always wins, even `null` or an empty string. Otherwise a
/// static default is cloned and a supplier default is awaited. Returns `None`
/// when the document has nothing and no default is declared.
pub async fn resolve_default<'v>(
    declared: Option<&DefaultValue>,
    existing: Option<&'v Value>,
    hooks: &FieldHooks,
    ctx: &DefaultContext<'_>,
    path: &str,
) -> Result<Option<Cow<'v, Value>>> {
    if let Some(value) = existing {
        return Ok(Some(Cow::Borrowed(value)));
    }
    match declared {
        None => Ok(None),
        Some(DefaultValue::Value(value)) => Ok(Some(Cow::Owned(value.clone()))),
        Some(DefaultValue::Supplier(name)) => {
            let supplier = hooks
                .get_supplier(name)
                .ok_or_else(|| FieldsError::UnknownSupplier {
                    name: name.clone(),
                    path: path.to_string(),
                })?;
            let value =
                supplier
                    .supply(ctx)
                    .await
                    .map_err(|source| FormStateError::DefaultSupplier {
                        path: path.to_string(),
                        source,
                    })?;
            trace!(path, supplier = %name, "default supplied");
            Ok(Some(Cow::Owned(value)))
        }
    }
}

/// Write the declared defaults of absent array and blocks fields into `data`.
///
/// Seeded rows become part of the caller's document, so the ids stamped on
/// them afterwards are reused by later passes. A group or named tab that is
/// absent is created only when something below it was seeded. Returns
/// whether `data` changed.
pub fn seed_containers<'s>(
    fields: &'s [FieldSchema],
    data: &'s mut Map<String, Value>,
    prefix: PathPrefix,
    hooks: &'s FieldHooks,
    ctx: &'s DefaultContext<'s>,
) -> BoxFuture<'s, Result<bool>> {
    async move {
        let mut seeded = false;
        for field in fields {
            match field.shape() {
                FieldShape::Unnamed(children) => {
                    seeded |= seed_containers(children, data, prefix.clone(), hooks, ctx).await?;
                }
                FieldShape::Tabs(tabs) => {
                    for tab in tabs {
                        seeded |= match tab.name.as_deref() {
                            Some(name) => {
                                let nested = prefix.nested(name);
                                seed_nested(&tab.fields, data, name, nested, hooks, ctx).await?
                            }
                            None => {
                                seed_containers(&tab.fields, data, prefix.clone(), hooks, ctx)
                                    .await?
                            }
                        };
                    }
                }
                FieldShape::Group(children) => {
                    if let Some(name) = field.data_name() {
                        let nested = prefix.nested(name);
                        seeded |= seed_nested(children, data, name, nested, hooks, ctx).await?;
                    }
                }
                FieldShape::Array(_) | FieldShape::Blocks(_) => {
                    if let Some(name) = field.data_name() {
                        seeded |= seed_container(field, name, data, &prefix, hooks, ctx).await?;
                    }
                }
                _ => {}
            }
        }
        Ok(seeded)
    }
    .boxed()
}

async fn seed_nested(
    fields: &[FieldSchema],
    data: &mut Map<String, Value>,
    name: &str,
    prefix: PathPrefix,
    hooks: &FieldHooks,
    ctx: &DefaultContext<'_>,
) -> Result<bool> {
    match data.get_mut(name) {
        Some(Value::Object(nested)) => seed_containers(fields, nested, prefix, hooks, ctx).await,
        Some(_) => Ok(false),
        None => {
            let mut nested = Map::new();
            let seeded = seed_containers(fields, &mut nested, prefix, hooks, ctx).await?;
            if seeded {
                data.insert(name.to_string(), Value::Object(nested));
            }
            Ok(seeded)
        }
    }
}

async fn seed_container(
    field: &FieldSchema,
    name: &str,
    data: &mut Map<String, Value>,
    prefix: &PathPrefix,
    hooks: &FieldHooks,
    ctx: &DefaultContext<'_>,
) -> Result<bool> {
    let mut seeded = false;
    if !data.contains_key(name) {
        let path = prefix.key(name);
        let declared = field.default.as_ref();
        if let Some(value) = resolve_default(declared, None, hooks, ctx, &path).await? {
            trace!(path = %path, "container default seeded");
            data.insert(name.to_string(), value.into_owned());
            seeded = true;
        }
    }

    let Some(Value::Array(rows)) = data.get_mut(name) else {
        return Ok(seeded);
    };
    // Indices match the walk, which skips rows it cannot resolve.
    let mut index = 0;
    for row in rows.iter_mut() {
        let row_fields = match field.shape() {
            FieldShape::Array(children) => Some(children),
            FieldShape::Blocks(blocks) => find_block(blocks, row).map(|block| &block.fields[..]),
            _ => None,
        };
        let (Some(row_fields), Some(object)) = (row_fields, row.as_object_mut()) else {
            continue;
        };
        let row_prefix = prefix.row(name, index);
        seeded |= seed_containers(row_fields, object, row_prefix, hooks, ctx).await?;
        index += 1;
    }
    Ok(seeded)
}
