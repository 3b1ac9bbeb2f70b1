//! Named async hooks: validators and default-value suppliers.
//!
//! Schemas refer to hooks by name (`validate: required`,
//! `default: { supplier: now }`); a [`FieldHooks`] registry binds those names
//! to callables when a document is materialized.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldsError, Result};
use crate::path::PathPrefix;
use crate::types::{DefaultValue, FieldSchema, FieldShape};

/// Error raised by a hook. Hook failures abort the whole materialization.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// The kind of edit the form is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Update => f.write_str("update"),
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            other => Err(format!("unknown operation '{other}', expected create or update")),
        }
    }
}

/// The authenticated actor editing the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection: None,
            attributes: Map::new(),
        }
    }
}

/// Everything a validator can see besides the value itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The field declaration being validated.
    pub field: &'a FieldSchema,
    /// Path key of the field.
    pub path: &'a str,
    /// The full document.
    pub data: &'a Value,
    /// The object holding the field and its siblings.
    pub sibling_data: &'a Value,
    /// Document id, absent on create.
    pub id: Option<&'a str>,
    pub operation: Operation,
    pub locale: &'a str,
    pub user: Option<&'a User>,
}

/// Context handed to default-value suppliers.
#[derive(Debug, Clone, Copy)]
pub struct DefaultContext<'a> {
    pub locale: &'a str,
    pub user: Option<&'a User>,
}

/// A field validator.
///
/// Returning a string marks the value invalid with that message; any other
/// value (including `false`) marks it valid. Returning `Err` is a hard failure.
#[async_trait]
pub trait Validate: Send + Sync {
    async fn validate(
        &self,
        value: Option<&Value>,
        ctx: &ValidationContext<'_>,
    ) -> std::result::Result<Value, HookError>;
}

/// An async supplier of a field's default value.
#[async_trait]
pub trait DefaultSupplier: Send + Sync {
    async fn supply(&self, ctx: &DefaultContext<'_>) -> std::result::Result<Value, HookError>;
}

/// Adapter turning a synchronous closure into a [`Validate`].
pub struct FnValidator<F>(F);

/// Wrap a closure as a validator.
pub fn validator_fn<F>(f: F) -> FnValidator<F>
where
    F: Fn(Option<&Value>, &ValidationContext<'_>) -> std::result::Result<Value, HookError>
        + Send
        + Sync,
{
    FnValidator(f)
}

#[async_trait]
impl<F> Validate for FnValidator<F>
where
    F: Fn(Option<&Value>, &ValidationContext<'_>) -> std::result::Result<Value, HookError>
        + Send
        + Sync,
{
    async fn validate(
        &self,
        value: Option<&Value>,
        ctx: &ValidationContext<'_>,
    ) -> std::result::Result<Value, HookError> {
        (self.0)(value, ctx)
    }
}

/// Adapter turning a synchronous closure into a [`DefaultSupplier`].
pub struct FnSupplier<F>(F);

/// Wrap a closure as a default supplier.
pub fn supplier_fn<F>(f: F) -> FnSupplier<F>
where
    F: Fn(&DefaultContext<'_>) -> std::result::Result<Value, HookError> + Send + Sync,
{
    FnSupplier(f)
}

#[async_trait]
impl<F> DefaultSupplier for FnSupplier<F>
where
    F: Fn(&DefaultContext<'_>) -> std::result::Result<Value, HookError> + Send + Sync,
{
    async fn supply(&self, ctx: &DefaultContext<'_>) -> std::result::Result<Value, HookError> {
        (self.0)(ctx)
    }
}

/// Registry of named validators and default suppliers.
#[derive(Clone, Default)]
pub struct FieldHooks {
    validators: HashMap<String, Arc<dyn Validate>>,
    suppliers: HashMap<String, Arc<dyn DefaultSupplier>>,
}

impl FieldHooks {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in validators and suppliers.
    pub fn with_builtins() -> Self {
        crate::builtins::register(Self::new())
    }

    /// Register (or replace) a validator.
    pub fn validator(mut self, name: &str, validator: impl Validate + 'static) -> Self {
        self.validators.insert(name.to_string(), Arc::new(validator));
        self
    }

    /// Register (or replace) a default supplier.
    pub fn supplier(mut self, name: &str, supplier: impl DefaultSupplier + 'static) -> Self {
        self.suppliers.insert(name.to_string(), Arc::new(supplier));
        self
    }

    pub fn get_validator(&self, name: &str) -> Option<&Arc<dyn Validate>> {
        self.validators.get(name)
    }

    pub fn get_supplier(&self, name: &str) -> Option<&Arc<dyn DefaultSupplier>> {
        self.suppliers.get(name)
    }

    /// Registered validator names, sorted.
    pub fn validator_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered supplier names, sorted.
    pub fn supplier_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.suppliers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check that every hook a schema names is registered.
    pub fn verify(&self, fields: &[FieldSchema]) -> Result<()> {
        self.verify_scope(fields, &PathPrefix::root())
    }

    fn verify_scope(&self, fields: &[FieldSchema], prefix: &PathPrefix) -> Result<()> {
        for field in fields {
            let path = field
                .name
                .as_deref()
                .map(|name| prefix.key(name))
                .unwrap_or_else(|| prefix.to_string());

            if let Some(name) = &field.validate {
                if !self.validators.contains_key(name) {
                    return Err(FieldsError::UnknownValidator {
                        name: name.clone(),
                        path,
                    });
                }
            }
            if let Some(DefaultValue::Supplier(name)) = &field.default {
                if !self.suppliers.contains_key(name) {
                    return Err(FieldsError::UnknownSupplier {
                        name: name.clone(),
                        path,
                    });
                }
            }

            let name = field.name.as_deref().unwrap_or_default();
            match field.shape() {
                FieldShape::Group(children) => self.verify_scope(children, &prefix.nested(name))?,
                FieldShape::Array(children) => self.verify_scope(children, &prefix.row(name, 0))?,
                FieldShape::Blocks(blocks) => {
                    for block in blocks {
                        self.verify_scope(&block.fields, &prefix.row(name, 0))?;
                    }
                }
                FieldShape::Unnamed(children) => self.verify_scope(children, prefix)?,
                FieldShape::Tabs(tabs) => {
                    for tab in tabs {
                        match tab.name.as_deref() {
                            Some(tab_name) => {
                                self.verify_scope(&tab.fields, &prefix.nested(tab_name))?
                            }
                            None => self.verify_scope(&tab.fields, prefix)?,
                        }
                    }
                }
                FieldShape::Scalar | FieldShape::Relationship | FieldShape::Presentational => {}
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FieldHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHooks")
            .field("validators", &self.validator_names())
            .field("suppliers", &self.supplier_names())
            .finish()
    }
}
