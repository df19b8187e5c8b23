//! Choices and selections
//!
//! A choice is any JSON record. Choices are shared as [`ChoiceRef`] so that a
//! selection computed from a collection keeps pointing at the same records
//! after the collection grows.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rada_core::record::get_path;

/// A selectable record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Choice(Value);

/// Shared handle to a choice
pub type ChoiceRef = Arc<Choice>;

impl Choice {
    pub fn new(record: Value) -> Self {
        Self(record)
    }

    /// Read a (possibly dotted) path
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.0, path)
    }

    pub fn record(&self) -> &Value {
        &self.0
    }

    pub fn into_record(self) -> Value {
        self.0
    }
}

impl From<Value> for Choice {
    fn from(record: Value) -> Self {
        Self(record)
    }
}

/// Build shared choices from records
pub fn choices_from(records: impl IntoIterator<Item = Value>) -> Vec<ChoiceRef> {
    records.into_iter().map(|r| Arc::new(Choice(r))).collect()
}

/// Opaque payload produced by a rich text projector
///
/// The embedding UI downcasts it to its own element type.
pub type RichContent = Arc<dyn Any + Send + Sync>;

/// Display text of a choice
#[derive(Clone)]
pub enum ChoiceText {
    Plain(String),
    Rich(RichContent),
}

impl ChoiceText {
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            ChoiceText::Plain(text) => Some(text),
            ChoiceText::Rich(_) => None,
        }
    }

    pub fn is_rich(&self) -> bool {
        matches!(self, ChoiceText::Rich(_))
    }
}

impl std::fmt::Debug for ChoiceText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceText::Plain(text) => f.debug_tuple("Plain").field(text).finish(),
            ChoiceText::Rich(_) => write!(f, "Rich(..)"),
        }
    }
}

impl PartialEq for ChoiceText {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChoiceText::Plain(a), ChoiceText::Plain(b)) => a == b,
            (ChoiceText::Rich(a), ChoiceText::Rich(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for ChoiceText {
    fn from(text: &str) -> Self {
        ChoiceText::Plain(text.to_string())
    }
}

/// The choices matching the current field value
#[derive(Clone, Debug)]
pub enum Selection {
    Single(Option<ChoiceRef>),
    /// In field value order, unmatched ids dropped
    Multiple(Vec<ChoiceRef>),
}

impl Selection {
    /// Empty selection for the given mode
    pub fn empty(multiple: bool) -> Self {
        if multiple {
            Selection::Multiple(Vec::new())
        } else {
            Selection::Single(None)
        }
    }

    pub fn choices(&self) -> &[ChoiceRef] {
        match self {
            Selection::Single(Some(choice)) => std::slice::from_ref(choice),
            Selection::Single(None) => &[],
            Selection::Multiple(choices) => choices,
        }
    }

    pub fn single(&self) -> Option<&ChoiceRef> {
        match self {
            Selection::Single(choice) => choice.as_ref(),
            Selection::Multiple(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.choices().is_empty()
    }

    pub fn len(&self) -> usize {
        self.choices().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_choice_paths() {
        let choice = Choice::new(json!({ "id": 1, "author": { "name": "Ann" } }));
        assert_eq!(choice.get("author.name"), Some(&json!("Ann")));
        assert_eq!(choice.get("missing"), None);
    }

    #[test]
    fn test_selection_views() {
        let choices = choices_from([json!({ "id": "a" }), json!({ "id": "b" })]);
        let single = Selection::Single(Some(choices[0].clone()));
        assert_eq!(single.len(), 1);
        assert!(single.single().is_some());

        let multiple = Selection::Multiple(choices.clone());
        assert_eq!(multiple.choices().len(), 2);
        assert!(multiple.single().is_none());
        assert!(Selection::empty(false).is_empty());
    }

    #[test]
    fn test_choice_text_equality() {
        let rich: RichContent = Arc::new(42u8);
        assert_eq!(ChoiceText::from("a"), ChoiceText::Plain("a".into()));
        assert_eq!(ChoiceText::Rich(rich.clone()), ChoiceText::Rich(rich.clone()));
        assert_ne!(ChoiceText::Rich(rich), ChoiceText::Rich(Arc::new(42u8)));
    }
}
