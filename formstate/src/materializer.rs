//! Entry points for a materialization pass.

use formstate_fields::{DefaultContext, FieldHooks, FieldSchema, PathPrefix};
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::MaterializerConfig;
use crate::context::MaterializeContext;
use crate::defaults::seed_containers;
use crate::error::Result;
use crate::logging::Pretty;
use crate::rows::RowTracker;
use crate::state::FlatFormState;
use crate::walker::SchemaWalker;

/// Turns a schema and a document into flat form state.
///
/// ```ignore
/// let materializer = Materializer::new(FieldHooks::with_builtins());
/// let state = materializer.materialize(&fields, &mut document, &ctx).await?;
/// assert!(state.get("title").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    hooks: FieldHooks,
    config: MaterializerConfig,
}

impl Materializer {
    pub fn new(hooks: FieldHooks) -> Self {
        Self {
            hooks,
            config: MaterializerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MaterializerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(&self) -> &FieldHooks {
        &self.hooks
    }

    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    /// Materialize `document` against `fields`.
    ///
    /// Rows in `document` that lack an id get one written in place, so a
    /// later pass over the same document sees the same ids. Absent array and
    /// blocks fields with a declared default get that default written in
    /// first, so their rows keep their ids too. Any hook failure aborts the
    /// pass and no state is returned.
    pub async fn materialize(
        &self,
        fields: &[FieldSchema],
        document: &mut Value,
        ctx: &MaterializeContext,
    ) -> Result<FlatFormState> {
        run(&self.hooks, &self.config, fields, document, ctx).await
    }
}

/// Materialize with the default configuration.
pub async fn materialize(
    fields: &[FieldSchema],
    document: &mut Value,
    ctx: &MaterializeContext,
    hooks: &FieldHooks,
) -> Result<FlatFormState> {
    run(hooks, &MaterializerConfig::default(), fields, document, ctx).await
}

async fn run(
    hooks: &FieldHooks,
    config: &MaterializerConfig,
    fields: &[FieldSchema],
    document: &mut Value,
    ctx: &MaterializeContext,
) -> Result<FlatFormState> {
    hooks.verify(fields)?;

    debug!(
        fields = fields.len(),
        operation = %ctx.operation,
        locale = %ctx.locale,
        id = ctx.id.as_deref().unwrap_or("<new>"),
        "materializing form state"
    );

    if let Some(object) = document.as_object_mut() {
        let default_ctx = DefaultContext {
            locale: &ctx.locale,
            user: ctx.user.as_ref(),
        };
        if seed_containers(fields, object, PathPrefix::root(), hooks, &default_ctx).await? {
            debug!("container defaults written into the document");
        }
    }

    let tracker = RowTracker::new(config.row_id_format);
    tracker.stamp_fields(fields, document);

    let document = &*document;
    let walker = SchemaWalker::new(hooks, ctx, tracker, document, config.fan_out_limit);
    let entries = walker
        .walk_fields(fields, document, PathPrefix::root(), true)
        .await?;
    let state = FlatFormState::from_entries(entries);

    debug!(
        entries = state.len(),
        invalid = state.invalid_paths().len(),
        "form state materialized"
    );
    trace!("form state: {}", Pretty(&state));
    Ok(state)
}
