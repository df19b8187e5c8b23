//! Projectors turn a choice into its value or its display text
//!
//! Each projector is a tagged variant: a dotted path read from the record, or
//! a caller function. Rich text is its own variant so that configurations
//! needing a plain companion can be rejected when the input is built.

use std::sync::Arc;

use serde_json::Value;

use rada_core::record::value_key;
use rada_core::RecordToString;

use crate::choice::{Choice, ChoiceText, RichContent};

/// Value projection function
pub type ValueFn = Arc<dyn Fn(&Choice) -> Value + Send + Sync>;

/// Plain text projection function
pub type TextFn = Arc<dyn Fn(&Choice) -> String + Send + Sync>;

/// Rich text projection function
pub type RichFn = Arc<dyn Fn(&Choice) -> RichContent + Send + Sync>;

/// Custom suggestion matcher: `(filter, choice) -> matches`
pub type MatchSuggestionFn = Arc<dyn Fn(&str, &Choice) -> bool + Send + Sync>;

/// Key read from records when no value path is configured
pub const DEFAULT_VALUE_PATH: &str = "id";

/// Key read from records when no text path is configured
pub const DEFAULT_TEXT_PATH: &str = "name";

/// How the value of a choice is obtained
#[derive(Clone)]
pub enum ValueProjector {
    Path(String),
    Func(ValueFn),
}

impl ValueProjector {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Choice) -> Value + Send + Sync + 'static,
    {
        ValueProjector::Func(Arc::new(f))
    }

    /// Project a choice, `null` when the path is missing
    pub fn project(&self, choice: &Choice) -> Value {
        match self {
            ValueProjector::Path(path) => choice.get(path).cloned().unwrap_or(Value::Null),
            ValueProjector::Func(f) => f(choice),
        }
    }

    /// Record key used when building synthetic choices
    pub fn key(&self) -> &str {
        match self {
            ValueProjector::Path(path) => path,
            ValueProjector::Func(_) => DEFAULT_VALUE_PATH,
        }
    }
}

impl Default for ValueProjector {
    fn default() -> Self {
        ValueProjector::Path(DEFAULT_VALUE_PATH.to_string())
    }
}

impl From<&str> for ValueProjector {
    fn from(path: &str) -> Self {
        ValueProjector::Path(path.to_string())
    }
}

impl std::fmt::Debug for ValueProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueProjector::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ValueProjector::Func(_) => write!(f, "Func(..)"),
        }
    }
}

/// How the display text of a choice is obtained
#[derive(Clone)]
pub enum TextProjector {
    Path(String),
    Func(TextFn),
    Rich(RichFn),
}

impl TextProjector {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Choice) -> String + Send + Sync + 'static,
    {
        TextProjector::Func(Arc::new(f))
    }

    pub fn rich<F>(f: F) -> Self
    where
        F: Fn(&Choice) -> RichContent + Send + Sync + 'static,
    {
        TextProjector::Rich(Arc::new(f))
    }

    /// Text from a record representation function
    pub fn representation(represent: RecordToString) -> Self {
        TextProjector::Func(Arc::new(move |choice: &Choice| represent(choice.record())))
    }

    pub fn project(&self, choice: &Choice) -> ChoiceText {
        match self {
            TextProjector::Path(path) => {
                ChoiceText::Plain(choice.get(path).map(value_key).unwrap_or_default())
            }
            TextProjector::Func(f) => ChoiceText::Plain(f(choice)),
            TextProjector::Rich(f) => ChoiceText::Rich(f(choice)),
        }
    }

    pub fn is_rich(&self) -> bool {
        matches!(self, TextProjector::Rich(_))
    }

    /// Record key used when building synthetic choices
    pub fn key(&self) -> &str {
        match self {
            TextProjector::Path(path) => path,
            _ => DEFAULT_TEXT_PATH,
        }
    }
}

impl Default for TextProjector {
    fn default() -> Self {
        TextProjector::Path(DEFAULT_TEXT_PATH.to_string())
    }
}

impl From<&str> for TextProjector {
    fn from(path: &str) -> Self {
        TextProjector::Path(path.to_string())
    }
}

impl std::fmt::Debug for TextProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextProjector::Path(path) => f.debug_tuple("Path").field(path).finish(),
            TextProjector::Func(_) => write!(f, "Func(..)"),
            TextProjector::Rich(_) => write!(f, "Rich(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_paths() {
        let choice = Choice::new(json!({ "id": 1, "foo": { "bar": "x" } }));
        assert_eq!(ValueProjector::default().project(&choice), json!(1));
        assert_eq!(ValueProjector::from("foo.bar").project(&choice), json!("x"));
        assert_eq!(ValueProjector::from("nope").project(&choice), Value::Null);
    }

    #[test]
    fn test_text_variants() {
        let choice = Choice::new(json!({ "id": 7, "first": "Ada", "last": "Lovelace" }));
        assert_eq!(
            TextProjector::from("first").project(&choice),
            ChoiceText::from("Ada")
        );
        let full = TextProjector::func(|c: &Choice| {
            format!(
                "{} {}",
                c.get("first").and_then(Value::as_str).unwrap_or_default(),
                c.get("last").and_then(Value::as_str).unwrap_or_default()
            )
        });
        assert_eq!(full.project(&choice), ChoiceText::from("Ada Lovelace"));
        assert_eq!(full.key(), DEFAULT_TEXT_PATH);

        let rich = TextProjector::rich(|_: &Choice| Arc::new(()) as RichContent);
        assert!(rich.is_rich());
        assert!(rich.project(&choice).is_rich());
    }

    #[test]
    fn test_numeric_text_is_stringified() {
        let choice = Choice::new(json!({ "id": 3, "name": 42 }));
        assert_eq!(TextProjector::default().project(&choice), ChoiceText::from("42"));
    }
}
