//! Error types for the fields registry

use thiserror::Error;

/// Result type for fields operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in field registry operations
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Collection not found by slug
    #[error("collection not found: {slug}")]
    CollectionNotFound { slug: String },

    /// Two collection files declare the same slug
    #[error("duplicate collection slug: {slug}")]
    DuplicateCollection { slug: String },

    /// A data-bearing field declared without a name
    #[error("{kind} field under '{path}' has no name")]
    MissingName { kind: String, path: String },

    /// Two sibling fields resolve to the same path
    #[error("duplicate field name: {path}")]
    DuplicateFieldName { path: String },

    /// Two block variants share a slug within one blocks field
    #[error("duplicate block slug '{slug}' in field '{path}'")]
    DuplicateBlockSlug { path: String, slug: String },

    /// Schema references a validator that is not registered
    #[error("unknown validator '{name}' on field '{path}'")]
    UnknownValidator { name: String, path: String },

    /// Schema references a default supplier that is not registered
    #[error("unknown default supplier '{name}' on field '{path}'")]
    UnknownSupplier { name: String, path: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::CollectionNotFound {
            slug: "posts".into(),
        };
        assert_eq!(err.to_string(), "collection not found: posts");
    }

    #[test]
    fn test_unknown_validator_error() {
        let err = FieldsError::UnknownValidator {
            name: "slugify".into(),
            path: "meta.slug".into(),
        };
        assert!(err.to_string().contains("slugify"));
        assert!(err.to_string().contains("meta.slug"));
    }
}
