//! Validator invocation.

use formstate_fields::{FieldHooks, FieldSchema, FieldsError, ValidationContext};
use serde_json::Value;
use tracing::trace;

use crate::error::{FormStateError, Result};

/// Validity of one field after its validator ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub error_message: Option<String>,
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error_message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: Some(message.into()),
        }
    }

    /// Interpret a validator's return value: a string is an error message,
    /// anything else means valid.
    pub fn from_result(result: Value) -> Self {
        match result {
            Value::String(message) => Self::invalid(message),
            _ => Self::valid(),
        }
    }
}

/// Run the field's validator, if it declares one, against `value`.
///
/// Fields without a validator are valid. A validator that returns `Err`
/// aborts the pass.
pub async fn invoke_validator(
    field: &FieldSchema,
    value: Option<&Value>,
    hooks: &FieldHooks,
    ctx: &ValidationContext<'_>,
) -> Result<ValidationOutcome> {
    let Some(name) = field.validate.as_deref() else {
        return Ok(ValidationOutcome::valid());
    };
    let validator = hooks
        .get_validator(name)
        .ok_or_else(|| FieldsError::UnknownValidator {
            name: name.to_string(),
            path: ctx.path.to_string(),
        })?;

    let result = validator
        .validate(value, ctx)
        .await
        .map_err(|source| FormStateError::Validator {
            path: ctx.path.to_string(),
            source,
        })?;
    let outcome = ValidationOutcome::from_result(result);
    if !outcome.valid {
        trace!(path = ctx.path, validator = name, "field invalid");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstate_fields::{validator_fn, FieldKind, Operation};
    use serde_json::json;

    fn ctx<'a>(field: &'a FieldSchema, data: &'a Value) -> ValidationContext<'a> {
        ValidationContext {
            field,
            path: "title",
            data,
            sibling_data: data,
            id: None,
            operation: Operation::Create,
            locale: "en",
            user: None,
        }
    }

    #[test]
    fn only_strings_are_errors() {
        assert_eq!(
            ValidationOutcome::from_result(json!("Too short")),
            ValidationOutcome::invalid("Too short")
        );
        assert!(ValidationOutcome::from_result(json!(false)).valid);
        assert!(ValidationOutcome::from_result(json!(true)).valid);
        assert!(ValidationOutcome::from_result(Value::Null).valid);
    }

    #[tokio::test]
    async fn fields_without_validator_are_valid() {
        let field = FieldSchema::named("title", FieldKind::Text);
        let data = json!({});
        let outcome = invoke_validator(&field, None, &FieldHooks::new(), &ctx(&field, &data))
            .await
            .unwrap();
        assert_eq!(outcome, ValidationOutcome::valid());
    }

    #[tokio::test]
    async fn builtin_required_reports_message() {
        let field = FieldSchema::named("title", FieldKind::Text).with_validate("required");
        let data = json!({});
        let outcome = invoke_validator(
            &field,
            None,
            &FieldHooks::with_builtins(),
            &ctx(&field, &data),
        )
        .await
        .unwrap();
        assert_eq!(outcome, ValidationOutcome::invalid("This field is required."));
    }

    #[tokio::test]
    async fn validator_error_aborts() {
        let hooks = FieldHooks::new().validator(
            "remote",
            validator_fn(|_, _| Err("service unavailable".into())),
        );
        let field = FieldSchema::named("title", FieldKind::Text).with_validate("remote");
        let data = json!({});
        let err = invoke_validator(&field, Some(&json!("x")), &hooks, &ctx(&field, &data))
            .await
            .unwrap_err();
        assert!(matches!(err, FormStateError::Validator { ref path, .. } if path == "title"));
    }

    #[tokio::test]
    async fn unregistered_validator_is_an_error() {
        let field = FieldSchema::named("title", FieldKind::Text).with_validate("missing");
        let data = json!({});
        let err = invoke_validator(&field, None, &FieldHooks::new(), &ctx(&field, &data))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FormStateError::Fields(FieldsError::UnknownValidator { .. })
        ));
    }
}
