//! Per-call inputs to a materialization pass.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use formstate_fields::{FieldSchema, Operation, User};
use serde::{Deserialize, Serialize};

/// Stored UI preferences for one container field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPreferences {
    /// Ids of rows the user left collapsed. `None` means no choice was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<Vec<String>>,
}

/// Stored UI preferences for a document's edit view, keyed by container path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub fields: HashMap<String, FieldPreferences>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the collapsed row ids for a container.
    pub fn with_collapsed<I, S>(mut self, container_path: &str, row_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.insert(
            container_path.to_string(),
            FieldPreferences {
                collapsed: Some(row_ids.into_iter().map(Into::into).collect()),
            },
        );
        self
    }

    /// Collapsed row ids for a container, if a preference was ever recorded.
    pub fn collapsed_rows(&self, container_path: &str) -> Option<&[String]> {
        self.fields
            .get(container_path)
            .and_then(|prefs| prefs.collapsed.as_deref())
    }
}

/// Caller-side visibility evaluation.
///
/// Conditions are evaluated outside this crate; the walker only asks whether a
/// field passes and ANDs the answer with its parent's. `path` is the field's
/// path key, or the enclosing prefix for unnamed fields.
pub trait Visibility: Send + Sync {
    fn passes(&self, field: &FieldSchema, path: &str) -> bool;
}

/// Every field is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn passes(&self, _field: &FieldSchema, _path: &str) -> bool {
        true
    }
}

/// Precomputed visibility per path key. Paths not present are visible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityMap(HashMap<String, bool>);

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, passes: bool) -> Self {
        self.0.insert(path.to_string(), passes);
        self
    }
}

impl Visibility for VisibilityMap {
    fn passes(&self, _field: &FieldSchema, path: &str) -> bool {
        self.0.get(path).copied().unwrap_or(true)
    }
}

/// Contextual inputs for one materialization pass.
#[derive(Clone)]
pub struct MaterializeContext {
    /// Document id, absent on create.
    pub id: Option<String>,
    pub locale: String,
    pub operation: Operation,
    pub user: Option<User>,
    pub preferences: Preferences,
    visibility: Arc<dyn Visibility>,
}

impl MaterializeContext {
    /// A context for `operation` with locale `en`, no user and no preferences.
    pub fn new(operation: Operation) -> Self {
        Self {
            id: None,
            locale: "en".to_string(),
            operation,
            user: None,
            preferences: Preferences::default(),
            visibility: Arc::new(AlwaysVisible),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_visibility(mut self, visibility: impl Visibility + 'static) -> Self {
        self.visibility = Arc::new(visibility);
        self
    }

    pub fn visibility(&self) -> &dyn Visibility {
        self.visibility.as_ref()
    }
}

impl fmt::Debug for MaterializeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterializeContext")
            .field("id", &self.id)
            .field("locale", &self.locale)
            .field("operation", &self.operation)
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .field("preferences", &self.preferences)
            .finish_non_exhaustive()
    }
}
