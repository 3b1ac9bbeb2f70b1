//! Form state materialization
//!
//! Given a collection's field schema and a document, `formstate` produces the
//! flat, path-keyed state an edit form renders from: every field's value and
//! initial value, its validity, whether its visibility condition passes, and
//! for array and blocks fields the per-row metadata a form needs to track
//! rows across edits.
//!
//! # Architecture
//!
//! - **Ordered concurrency**: siblings, rows and tabs are walked concurrently
//!   but their entries are joined in declaration order
//! - **Stable rows**: rows without an id get one written back into the
//!   document before the walk, so ids survive re-materialization
//! - **Hooks by name**: validators and default suppliers come from a
//!   [`FieldHooks`] registry; a hook that errors aborts the pass
//!
//! ```ignore
//! use formstate::{materialize, FieldHooks, MaterializeContext, Operation};
//!
//! let hooks = FieldHooks::with_builtins();
//! let ctx = MaterializeContext::new(Operation::Update).with_id("doc-1");
//! let state = materialize(&collection.fields, &mut document, &ctx, &hooks).await?;
//! for (path, field) in state.iter() {
//!     println!("{path}: {:?}", field.value);
//! }
//! ```

pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod materializer;
pub mod rows;
pub mod state;
pub mod validate;
mod walker;

pub use config::{MaterializerConfig, RowIdFormat};
pub use context::{
    AlwaysVisible, FieldPreferences, MaterializeContext, Preferences, Visibility, VisibilityMap,
};
pub use defaults::resolve_default;
pub use error::{FormStateError, Result};
pub use logging::Pretty;
pub use materializer::{materialize, Materializer};
pub use rows::{is_collapsed, row_id, RowTracker};
pub use state::{FieldState, FlatFormState, RowMetadata};
pub use validate::{invoke_validator, ValidationOutcome};

pub use formstate_fields::{
    DefaultContext, FieldHooks, FieldKind, FieldSchema, Operation, PathPrefix, User,
    ValidationContext,
};
