//! Field schema and hook registry
//!
//! `formstate-fields` is the schema-only half of formstate. It describes the
//! editable shape of a document and knows nothing about document values.
//!
//! # Architecture
//!
//! - **Schema-only**: Owns field and collection definitions, not field values
//! - **YAML on disk**: One `.yaml` file per collection under `collections/`
//! - **Named hooks**: Validators and default suppliers are referenced by name
//!   and bound through a [`FieldHooks`] registry at materialization time

mod builtins;
pub mod check;
pub mod context;
pub mod error;
pub mod hooks;
pub mod path;
pub mod types;

pub use builtins::{Email, Length, LocaleSupplier, NowSupplier, Required, Rows, UserIdSupplier};
pub use check::check_fields;
pub use context::{FieldsContext, FieldsContextBuilder};
pub use error::{FieldsError, Result};
pub use hooks::{
    supplier_fn, validator_fn, DefaultContext, DefaultSupplier, FieldHooks, FnSupplier,
    FnValidator, HookError, Operation, User, Validate, ValidationContext,
};
pub use path::{PathPrefix, DELIMITER};
pub use types::{
    Admin, BlockDef, CollectionDef, DefaultValue, FieldKind, FieldSchema, FieldShape,
    SelectOption, TabDef,
};
