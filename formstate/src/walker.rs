//! Concurrent schema walk producing flat form state.
//!
//! Every sibling field, every row of a container and every tab is processed
//! concurrently. Each branch returns its entries as an ordered list and the
//! lists are concatenated in declaration order, so the resulting map is
//! identical no matter which hook finishes first.

use std::borrow::Cow;
use std::future::Future;
use std::sync::LazyLock;

use formstate_fields::{
    BlockDef, DefaultContext, FieldHooks, FieldSchema, FieldShape, PathPrefix, TabDef,
    ValidationContext,
};
use futures::future::{try_join_all, BoxFuture};
use futures::{stream, FutureExt, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use tracing::trace;

use crate::context::MaterializeContext;
use crate::defaults::resolve_default;
use crate::error::Result;
use crate::rows::{find_block, RowTracker, BLOCK_NAME_KEY, BLOCK_TYPE_KEY, ROW_ID_KEY};
use crate::state::FieldState;
use crate::validate::{invoke_validator, ValidationOutcome};

pub(crate) type Entry = (String, FieldState);

static EMPTY_OBJECT: LazyLock<Value> = LazyLock::new(|| json!({}));

/// Data for a group or named tab: the nested object, or an empty one.
fn nested_object<'v>(data: &'v Value, name: &str) -> &'v Value {
    data.get(name)
        .filter(|value| value.is_object())
        .unwrap_or(&*EMPTY_OBJECT)
}

/// Relationship and upload values may arrive populated; state keeps the ids.
fn relationship_value(value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.contains_key(ROW_ID_KEY) => {
            object.remove(ROW_ID_KEY).unwrap_or(Value::Null)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(relationship_value).collect()),
        other => other,
    }
}

/// Which fields govern the rows of a container.
#[derive(Clone, Copy)]
enum RowSchema<'f> {
    Array(&'f [FieldSchema]),
    Blocks(&'f [BlockDef]),
}

/// A row kept for materialization, with its governing fields.
struct RowPlan<'r> {
    row: &'r Value,
    fields: &'r [FieldSchema],
    block_type: Option<&'r str>,
}

pub(crate) struct SchemaWalker<'a> {
    hooks: &'a FieldHooks,
    ctx: &'a MaterializeContext,
    tracker: RowTracker,
    document: &'a Value,
    fan_out_limit: Option<usize>,
}

impl<'a> SchemaWalker<'a> {
    pub(crate) fn new(
        hooks: &'a FieldHooks,
        ctx: &'a MaterializeContext,
        tracker: RowTracker,
        document: &'a Value,
        fan_out_limit: Option<usize>,
    ) -> Self {
        Self {
            hooks,
            ctx,
            tracker,
            document,
            fan_out_limit,
        }
    }

    /// Walk a list of sibling fields whose data lives in `data`.
    pub(crate) fn walk_fields<'s>(
        &'s self,
        fields: &'s [FieldSchema],
        data: &'s Value,
        prefix: PathPrefix,
        parent_passes: bool,
    ) -> BoxFuture<'s, Result<Vec<Entry>>> {
        async move {
            let branches = fields
                .iter()
                .map(|field| self.walk_field(field, data, prefix.clone(), parent_passes))
                .collect::<Vec<_>>();
            let entries = self.join(branches).await?;
            Ok(entries.into_iter().flatten().collect())
        }
        .boxed()
    }

    async fn walk_field<'s>(
        &'s self,
        field: &'s FieldSchema,
        data: &'s Value,
        prefix: PathPrefix,
        parent_passes: bool,
    ) -> Result<Vec<Entry>> {
        let visible = match field.name.as_deref() {
            Some(name) => self.ctx.visibility().passes(field, &prefix.key(name)),
            None => self.ctx.visibility().passes(field, prefix.as_str()),
        };
        let passes = parent_passes && visible;

        if let Some(name) = field.data_name() {
            return self.walk_data_field(field, name, data, &prefix, passes).await;
        }
        match field.shape() {
            FieldShape::Unnamed(children) => self.walk_fields(children, data, prefix, passes).await,
            FieldShape::Tabs(tabs) => self.walk_tabs(tabs, data, prefix, passes).await,
            _ => Ok(Vec::new()),
        }
    }

    async fn walk_tabs<'s>(
        &'s self,
        tabs: &'s [TabDef],
        data: &'s Value,
        prefix: PathPrefix,
        passes: bool,
    ) -> Result<Vec<Entry>> {
        trace!(path = %prefix, tabs = tabs.len(), "walking tabs");
        let branches = tabs.iter().map(|tab| match tab.name.as_deref() {
            Some(name) => self.walk_fields(
                &tab.fields,
                nested_object(data, name),
                prefix.nested(name),
                passes,
            ),
            None => self.walk_fields(&tab.fields, data, prefix.clone(), passes),
        })
        .collect::<Vec<_>>();
        let entries = self.join(branches).await?;
        Ok(entries.into_iter().flatten().collect())
    }

    async fn walk_data_field<'s>(
        &'s self,
        field: &'s FieldSchema,
        name: &'s str,
        data: &'s Value,
        prefix: &PathPrefix,
        passes: bool,
    ) -> Result<Vec<Entry>> {
        let path = prefix.key(name);
        if let FieldShape::Group(children) = field.shape() {
            let outcome = self.validate(field, &path, data.get(name), data).await?;
            let mut entries = self
                .walk_fields(children, nested_object(data, name), prefix.nested(name), passes)
                .await?;
            // A group has no state of its own unless its validator rejects it.
            if !outcome.valid {
                let mut state = FieldState::new(None, passes).with_outcome(outcome);
                state.disable_form_data = true;
                entries.insert(0, (path, state));
            }
            return Ok(entries);
        }

        let default_ctx = DefaultContext {
            locale: &self.ctx.locale,
            user: self.ctx.user.as_ref(),
        };
        let resolved = resolve_default(
            field.default.as_ref(),
            data.get(name),
            self.hooks,
            &default_ctx,
            &path,
        )
        .await?;
        let outcome = self
            .validate(field, &path, resolved.as_deref(), data)
            .await?;

        match field.shape() {
            FieldShape::Array(children) => {
                let schema = RowSchema::Array(children);
                self.walk_rows(field, name, prefix, resolved, schema, outcome, passes)
                    .await
            }
            FieldShape::Blocks(blocks) => {
                let schema = RowSchema::Blocks(blocks);
                self.walk_rows(field, name, prefix, resolved, schema, outcome, passes)
                    .await
            }
            FieldShape::Relationship => {
                let value = resolved.map(|value| relationship_value(value.into_owned()));
                Ok(vec![(path, FieldState::new(value, passes).with_outcome(outcome))])
            }
            _ => {
                let value = resolved.map(Cow::into_owned);
                Ok(vec![(path, FieldState::new(value, passes).with_outcome(outcome))])
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn walk_rows<'s>(
        &'s self,
        field: &'s FieldSchema,
        name: &'s str,
        prefix: &PathPrefix,
        resolved: Option<Cow<'s, Value>>,
        schema: RowSchema<'s>,
        outcome: ValidationOutcome,
        passes: bool,
    ) -> Result<Vec<Entry>> {
        let path = prefix.key(name);
        let mut resolved = resolved;
        // Defaults under non-object data could not be seeded into the document.
        if let Some(Cow::Owned(value)) = resolved.as_mut() {
            self.tracker.stamp_value(field, value);
        }

        let container = resolved.as_deref();
        let rows = container.and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
        let plans: Vec<RowPlan<'_>> = rows
            .iter()
            .filter(|row| row.is_object())
            .filter_map(|row| match schema {
                RowSchema::Array(fields) => Some(RowPlan {
                    row,
                    fields,
                    block_type: None,
                }),
                RowSchema::Blocks(blocks) => find_block(blocks, row).map(|block| RowPlan {
                    row,
                    fields: &block.fields,
                    block_type: Some(block.slug.as_str()),
                }),
            })
            .collect();
        trace!(path = %path, rows = plans.len(), skipped = rows.len() - plans.len(), "walking rows");

        let branches = plans.iter().enumerate().map(|(index, plan)| {
            self.walk_fields(plan.fields, plan.row, prefix.row(name, index), passes)
        })
        .collect::<Vec<_>>();
        let row_entries = self.join(branches).await?;

        let mut metadata = Vec::with_capacity(plans.len());
        let mut children = Vec::new();
        for (index, (plan, entries)) in plans.iter().zip(row_entries).enumerate() {
            let row_prefix = prefix.row(name, index);
            let mut row_meta = self.tracker.track_row(
                plan.row,
                &path,
                &self.ctx.preferences,
                field.admin.init_collapsed,
                plan.block_type,
            );
            row_meta.child_error_paths = entries
                .iter()
                .filter(|(_, state)| !state.valid)
                .map(|(child_path, _)| child_path.clone())
                .collect();

            let id = plan
                .row
                .get(ROW_ID_KEY)
                .cloned()
                .unwrap_or_else(|| Value::String(row_meta.id.clone()));
            children.push((row_prefix.key(ROW_ID_KEY), FieldState::new(Some(id), passes)));
            if plan.block_type.is_some() {
                for key in [BLOCK_TYPE_KEY, BLOCK_NAME_KEY] {
                    let value = plan.row.get(key).cloned();
                    children.push((row_prefix.key(key), FieldState::new(value, passes)));
                }
            }
            children.extend(entries);
            metadata.push(row_meta);
        }

        let mut state = match container {
            Some(Value::Null) => FieldState::new(Some(Value::Null), passes),
            _ => {
                let mut state = FieldState::new(Some(json!(plans.len())), passes);
                state.disable_form_data = !plans.is_empty();
                state
            }
        }
        .with_outcome(outcome);
        state.rows = Some(metadata);

        let mut entries = Vec::with_capacity(children.len() + 1);
        entries.push((path, state));
        entries.extend(children);
        Ok(entries)
    }

    async fn validate(
        &self,
        field: &FieldSchema,
        path: &str,
        value: Option<&Value>,
        sibling_data: &Value,
    ) -> Result<ValidationOutcome> {
        let ctx = ValidationContext {
            field,
            path,
            data: self.document,
            sibling_data,
            id: self.ctx.id.as_deref(),
            operation: self.ctx.operation,
            locale: &self.ctx.locale,
            user: self.ctx.user.as_ref(),
        };
        invoke_validator(field, value, self.hooks, &ctx).await
    }

    /// Await sibling branches, keeping their declaration order.
    async fn join<I, F, T>(&self, branches: I) -> Result<Vec<T>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T>>,
    {
        match self.fan_out_limit {
            None => try_join_all(branches).await,
            Some(limit) => {
                stream::iter(branches)
                    .buffered(limit.max(1))
                    .try_collect()
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Preferences, VisibilityMap};
    use formstate_fields::{FieldKind, Operation};

    async fn walk(fields: &[FieldSchema], data: &Value, ctx: &MaterializeContext) -> Vec<Entry> {
        let hooks = FieldHooks::with_builtins();
        let walker = SchemaWalker::new(&hooks, ctx, RowTracker::default(), data, None);
        walker
            .walk_fields(fields, data, PathPrefix::root(), true)
            .await
            .unwrap()
    }

    fn paths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|(path, _)| path.as_str()).collect()
    }

    #[test]
    fn relationship_keeps_id_of_populated_doc() {
        assert_eq!(
            relationship_value(json!({"id": "u1", "name": "Ada"})),
            json!("u1")
        );
        assert_eq!(relationship_value(json!("u1")), json!("u1"));
        assert_eq!(relationship_value(json!({"name": "Ada"})), json!({"name": "Ada"}));
        assert_eq!(
            relationship_value(json!([{"id": "a"}, "b"])),
            json!(["a", "b"])
        );
    }

    #[tokio::test]
    async fn group_fields_flatten_without_own_entry() {
        let fields = vec![FieldSchema::named(
            "meta",
            FieldKind::Group {
                fields: vec![FieldSchema::named("slug", FieldKind::Text)],
            },
        )];
        let data = json!({"meta": {"slug": "hello"}});
        let ctx = MaterializeContext::new(Operation::Update);
        let entries = walk(&fields, &data, &ctx).await;
        assert_eq!(paths(&entries), vec!["meta.slug"]);
        assert_eq!(entries[0].1.value, Some(json!("hello")));
    }

    #[tokio::test]
    async fn rejected_group_gets_an_error_entry() {
        let fields = vec![FieldSchema::named(
            "meta",
            FieldKind::Group {
                fields: vec![FieldSchema::named("slug", FieldKind::Text)],
            },
        )
        .with_validate("required")];
        let ctx = MaterializeContext::new(Operation::Create);

        let entries = walk(&fields, &json!({}), &ctx).await;
        assert_eq!(paths(&entries), vec!["meta", "meta.slug"]);
        let meta = &entries[0].1;
        assert!(!meta.valid);
        assert_eq!(meta.error_message.as_deref(), Some("This field is required."));
        assert_eq!(meta.value, None);
        assert!(meta.disable_form_data);

        let entries = walk(&fields, &json!({"meta": {"slug": "s"}}), &ctx).await;
        assert_eq!(paths(&entries), vec!["meta.slug"]);
    }

    #[tokio::test]
    async fn group_validator_sees_the_raw_group_value() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
        let record = seen.clone();
        let hooks = FieldHooks::new().validator(
            "inspect",
            formstate_fields::validator_fn(move |value, ctx| {
                *record.lock().unwrap() = Some((value.cloned(), ctx.path.to_string()));
                Ok(json!(true))
            }),
        );
        let fields = vec![FieldSchema::named(
            "meta",
            FieldKind::Group {
                fields: vec![FieldSchema::named("slug", FieldKind::Text)],
            },
        )
        .with_validate("inspect")];
        let data = json!({"meta": {"slug": "x"}});
        let ctx = MaterializeContext::new(Operation::Update);
        let walker = SchemaWalker::new(&hooks, &ctx, RowTracker::default(), &data, None);
        walker
            .walk_fields(&fields, &data, PathPrefix::root(), true)
            .await
            .unwrap();

        let (value, path) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(value, Some(json!({"slug": "x"})));
        assert_eq!(path, "meta");
    }

    #[tokio::test]
    async fn group_with_non_object_data_walks_empty() {
        let fields = vec![FieldSchema::named(
            "meta",
            FieldKind::Group {
                fields: vec![FieldSchema::named("slug", FieldKind::Text)],
            },
        )];
        let data = json!({"meta": "oops"});
        let ctx = MaterializeContext::new(Operation::Update);
        let entries = walk(&fields, &data, &ctx).await;
        assert_eq!(paths(&entries), vec!["meta.slug"]);
        assert_eq!(entries[0].1.value, None);
    }

    #[tokio::test]
    async fn hidden_parent_hides_children() {
        let fields = vec![FieldSchema::named(
            "meta",
            FieldKind::Group {
                fields: vec![FieldSchema::named("slug", FieldKind::Text)],
            },
        )];
        let data = json!({});
        let ctx = MaterializeContext::new(Operation::Create)
            .with_visibility(VisibilityMap::new().with("meta", false));
        let entries = walk(&fields, &data, &ctx).await;
        assert!(!entries[0].1.passes_condition);
    }

    #[tokio::test]
    async fn rows_are_preceded_by_container_and_bookkeeping() {
        let fields = vec![FieldSchema::named(
            "layout",
            FieldKind::Blocks {
                blocks: vec![BlockDef::new(
                    "hero",
                    vec![FieldSchema::named("heading", FieldKind::Text)],
                )],
            },
        )];
        let data = json!({
            "layout": [{"id": "h1", "blockType": "hero", "blockName": "Top", "heading": "Hi"}]
        });
        let ctx = MaterializeContext::new(Operation::Update)
            .with_preferences(Preferences::new().with_collapsed("layout", ["h1"]));
        let entries = walk(&fields, &data, &ctx).await;
        assert_eq!(
            paths(&entries),
            vec![
                "layout",
                "layout.0.id",
                "layout.0.blockType",
                "layout.0.blockName",
                "layout.0.heading"
            ]
        );
        let rows = entries[0].1.rows.as_ref().unwrap();
        assert!(rows[0].collapsed);
        assert_eq!(rows[0].block_type.as_deref(), Some("hero"));
        assert_eq!(entries[3].1.value, Some(json!("Top")));
    }

    #[tokio::test]
    async fn bounded_fan_out_keeps_order() {
        let fields: Vec<FieldSchema> = (0..20)
            .map(|i| FieldSchema::named(&format!("f{i}"), FieldKind::Text))
            .collect();
        let data = json!({});
        let ctx = MaterializeContext::new(Operation::Create);
        let hooks = FieldHooks::new();
        let walker = SchemaWalker::new(&hooks, &ctx, RowTracker::default(), &data, Some(3));
        let entries = walker
            .walk_fields(&fields, &data, PathPrefix::root(), true)
            .await
            .unwrap();
        let expected: Vec<String> = (0..20).map(|i| format!("f{i}")).collect();
        assert_eq!(paths(&entries), expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
