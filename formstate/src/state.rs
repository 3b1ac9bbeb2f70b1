//! Output of a materialization pass.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::validate::ValidationOutcome;

/// UI metadata for one row of an array or blocks field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowMetadata {
    pub id: String,
    pub collapsed: bool,
    /// Block variant of the row; blocks fields only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    /// Invalid paths inside this row.
    pub child_error_paths: BTreeSet<String>,
}

/// UI state of a single path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    /// Current value. `None` when the document holds nothing and no default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_value: Option<Value>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub passes_condition: bool,
    /// The value is a row count, not data to submit.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_form_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<RowMetadata>>,
}

impl FieldState {
    /// A valid state whose initial value equals `value`.
    pub fn new(value: Option<Value>, passes_condition: bool) -> Self {
        Self {
            initial_value: value.clone(),
            value,
            valid: true,
            error_message: None,
            passes_condition,
            disable_form_data: false,
            rows: None,
        }
    }

    /// The value resolved when the state was created.
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial_value.as_ref()
    }

    pub(crate) fn with_outcome(mut self, outcome: ValidationOutcome) -> Self {
        self.valid = outcome.valid;
        self.error_message = outcome.error_message;
        self
    }
}

/// Path key → field state, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatFormState(IndexMap<String, FieldState>);

impl FlatFormState {
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (String, FieldState)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn get(&self, path: &str) -> Option<&FieldState> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path keys in write order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldState)> {
        self.0.iter().map(|(path, state)| (path.as_str(), state))
    }

    /// Paths whose state is invalid, in write order.
    pub fn invalid_paths(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, state)| !state.valid)
            .map(|(path, _)| path)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.0.values().all(|state| state.valid)
    }

    pub fn into_inner(self) -> IndexMap<String, FieldState> {
        self.0
    }
}

impl<'a> IntoIterator for &'a FlatFormState {
    type Item = (&'a String, &'a FieldState);
    type IntoIter = indexmap::map::Iter<'a, String, FieldState>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_state_mirrors_initial_value() {
        let state = FieldState::new(Some(json!("a")), true);
        assert_eq!(state.value, Some(json!("a")));
        assert_eq!(state.initial_value(), Some(&json!("a")));
        assert!(state.valid);
    }

    #[test]
    fn serializes_camel_case_and_skips_absent() {
        let state = FieldState::new(None, false).with_outcome(ValidationOutcome::invalid("Required"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            json!({"valid": false, "errorMessage": "Required", "passesCondition": false})
        );
    }

    #[test]
    fn flat_state_keeps_write_order() {
        let state = FlatFormState::from_entries(vec![
            ("b".to_string(), FieldState::new(Some(json!(1)), true)),
            ("a".to_string(), FieldState::new(Some(json!(2)), true)),
            (
                "c".to_string(),
                FieldState::new(None, true).with_outcome(ValidationOutcome::invalid("x")),
            ),
        ]);
        assert_eq!(state.paths().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(state.invalid_paths(), vec!["c"]);
        assert!(!state.is_valid());
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.starts_with("{\"b\":"));
    }
}
