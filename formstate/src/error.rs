//! Error types for materialization

use formstate_fields::{FieldsError, HookError};
use thiserror::Error;

/// Result type for materialization
pub type Result<T> = std::result::Result<T, FormStateError>;

/// Failures that abort a materialization pass.
///
/// A validator returning a message is not an error; it is recorded on the
/// field's state. These variants cover hooks that fail outright and schemas
/// that reference hooks nobody registered.
#[derive(Debug, Error)]
pub enum FormStateError {
    /// A default-value supplier returned an error
    #[error("default supplier for '{path}' failed: {source}")]
    DefaultSupplier {
        path: String,
        #[source]
        source: HookError,
    },

    /// A validator returned an error
    #[error("validator for '{path}' failed: {source}")]
    Validator {
        path: String,
        #[source]
        source: HookError,
    },

    /// Schema or hook registry problem
    #[error(transparent)]
    Fields(#[from] FieldsError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FormStateError::Validator {
            path: "items.0.label".into(),
            source: "lookup timed out".into(),
        };
        assert_eq!(
            err.to_string(),
            "validator for 'items.0.label' failed: lookup timed out"
        );
    }

    #[test]
    fn test_fields_error_is_transparent() {
        let err: FormStateError = FieldsError::UnknownSupplier {
            name: "tomorrow".into(),
            path: "due".into(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown default supplier 'tomorrow' on field 'due'");
    }
}
