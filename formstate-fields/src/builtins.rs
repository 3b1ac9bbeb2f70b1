//! Built-in validators and default suppliers.
//!
//! Validators read their limits from the field's `required` flag and its
//! `custom` attributes (`min_length`, `max_length`, `min_rows`, `max_rows`).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::hooks::{
    DefaultContext, DefaultSupplier, FieldHooks, HookError, Validate, ValidationContext,
};

const REQUIRED_MESSAGE: &str = "This field is required.";

pub(crate) fn register(hooks: FieldHooks) -> FieldHooks {
    hooks
        .validator("required", Required)
        .validator("length", Length)
        .validator("rows", Rows)
        .validator("email", Email)
        .supplier("locale", LocaleSupplier)
        .supplier("user_id", UserIdSupplier)
        .supplier("now", NowSupplier)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn custom_usize(ctx: &ValidationContext<'_>, key: &str) -> Option<usize> {
    ctx.field
        .custom
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

/// Rejects absent, null, blank-string and empty-array values.
pub struct Required;

#[async_trait]
impl Validate for Required {
    async fn validate(
        &self,
        value: Option<&Value>,
        _ctx: &ValidationContext<'_>,
    ) -> Result<Value, HookError> {
        if is_blank(value) {
            return Ok(json!(REQUIRED_MESSAGE));
        }
        Ok(json!(true))
    }
}

/// String length limits from `custom.min_length` / `custom.max_length`.
pub struct Length;

#[async_trait]
impl Validate for Length {
    async fn validate(
        &self,
        value: Option<&Value>,
        ctx: &ValidationContext<'_>,
    ) -> Result<Value, HookError> {
        if is_blank(value) {
            return Ok(if ctx.field.required {
                json!(REQUIRED_MESSAGE)
            } else {
                json!(true)
            });
        }
        let Some(text) = value.and_then(Value::as_str) else {
            return Ok(json!(true));
        };
        let length = text.chars().count();
        if let Some(max) = custom_usize(ctx, "max_length") {
            if length > max {
                return Ok(json!(format!(
                    "This value must be shorter than the max length of {max} characters."
                )));
            }
        }
        if let Some(min) = custom_usize(ctx, "min_length") {
            if length < min {
                return Ok(json!(format!(
                    "This value must be longer than the minimum length of {min} characters."
                )));
            }
        }
        Ok(json!(true))
    }
}

/// Row count limits for array and blocks fields.
pub struct Rows;

#[async_trait]
impl Validate for Rows {
    async fn validate(
        &self,
        value: Option<&Value>,
        ctx: &ValidationContext<'_>,
    ) -> Result<Value, HookError> {
        let count = value.and_then(Value::as_array).map_or(0, Vec::len);
        if count == 0 && ctx.field.required {
            return Ok(json!("This field requires at least one row."));
        }
        if let Some(min) = custom_usize(ctx, "min_rows") {
            if count < min {
                return Ok(json!(format!("This field requires at least {min} row(s).")));
            }
        }
        if let Some(max) = custom_usize(ctx, "max_rows") {
            if count > max {
                return Ok(json!(format!("This field requires no more than {max} row(s).")));
            }
        }
        Ok(json!(true))
    }
}

/// Loose `local@domain.tld` shape check.
pub struct Email;

#[async_trait]
impl Validate for Email {
    async fn validate(
        &self,
        value: Option<&Value>,
        ctx: &ValidationContext<'_>,
    ) -> Result<Value, HookError> {
        if is_blank(value) {
            return Ok(if ctx.field.required {
                json!(REQUIRED_MESSAGE)
            } else {
                json!(true)
            });
        }
        let valid = value
            .and_then(Value::as_str)
            .and_then(|s| s.split_once('@'))
            .is_some_and(|(local, domain)| {
                !local.is_empty()
                    && !domain.starts_with('.')
                    && domain.split('.').filter(|part| !part.is_empty()).count() >= 2
            });
        if valid {
            Ok(json!(true))
        } else {
            Ok(json!("Please enter a valid email address."))
        }
    }
}

/// Supplies the request locale.
pub struct LocaleSupplier;

#[async_trait]
impl DefaultSupplier for LocaleSupplier {
    async fn supply(&self, ctx: &DefaultContext<'_>) -> Result<Value, HookError> {
        Ok(json!(ctx.locale))
    }
}

/// Supplies the acting user's id, or null when anonymous.
pub struct UserIdSupplier;

#[async_trait]
impl DefaultSupplier for UserIdSupplier {
    async fn supply(&self, ctx: &DefaultContext<'_>) -> Result<Value, HookError> {
        Ok(ctx.user.map_or(Value::Null, |user| json!(user.id)))
    }
}

/// Supplies the current UTC time as RFC 3339.
pub struct NowSupplier;

#[async_trait]
impl DefaultSupplier for NowSupplier {
    async fn supply(&self, _ctx: &DefaultContext<'_>) -> Result<Value, HookError> {
        Ok(json!(chrono::Utc::now().to_rfc3339()))
    }
}
