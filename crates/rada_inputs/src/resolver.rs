//! Choice resolution
//!
//! [`ChoiceResolver`] projects choices into values and text, and reconciles a
//! raw field value against the loaded collection. Ids are compared by their
//! string form, so `"1"` selects the choice whose id is `1`.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use rada_core::record::value_key;
use rada_core::{RecordToString, Translator};

use crate::choice::{Choice, ChoiceRef, ChoiceText, Selection};
use crate::error::{ChoiceError, Result};
use crate::projector::{MatchSuggestionFn, TextFn, TextProjector, ValueProjector};

/// Projects and matches choices for one input
#[derive(Clone)]
pub struct ChoiceResolver {
    option_value: ValueProjector,
    option_text: TextProjector,
    input_text: Option<TextFn>,
    match_suggestion: Option<MatchSuggestionFn>,
    translate_choice: bool,
    translator: Translator,
}

impl ChoiceResolver {
    pub fn builder(translator: Translator) -> ResolverBuilder {
        ResolverBuilder {
            translator,
            option_value: ValueProjector::default(),
            option_text: None,
            input_text: None,
            match_suggestion: None,
            translate_choice: None,
            representation: None,
            has_empty_text: false,
        }
    }

    /// Value of a choice
    pub fn resolve_value(&self, choice: &Choice) -> Value {
        self.option_value.project(choice)
    }

    /// String form of the value, used for comparisons
    pub fn value_key(&self, choice: &Choice) -> String {
        value_key(&self.resolve_value(choice))
    }

    /// Display text, translated when enabled
    pub fn resolve_text(&self, choice: &Choice) -> ChoiceText {
        match self.option_text.project(choice) {
            ChoiceText::Plain(text) if self.translate_choice => {
                ChoiceText::Plain(self.translator.translate_or_literal(&text))
            }
            text => text,
        }
    }

    /// Plain text for the editable text field
    pub fn input_text(&self, choice: &Choice) -> Result<String> {
        if let Some(input_text) = &self.input_text {
            return Ok(input_text(choice));
        }
        match self.resolve_text(choice) {
            ChoiceText::Plain(text) => Ok(text),
            ChoiceText::Rich(_) => Err(ChoiceError::RichTextWithoutInputText),
        }
    }

    /// Whether a choice matches the typed filter
    ///
    /// The default is a case-insensitive literal substring test on the plain
    /// text; rich text never matches without a custom matcher.
    pub fn matches(&self, filter: &str, choice: &Choice) -> bool {
        if let Some(match_suggestion) = &self.match_suggestion {
            return match_suggestion(filter, choice);
        }
        match self.resolve_text(choice) {
            ChoiceText::Plain(text) => contains_ignore_case(&text, filter),
            ChoiceText::Rich(_) => false,
        }
    }

    pub fn has_custom_matcher(&self) -> bool {
        self.match_suggestion.is_some()
    }

    pub fn translates_choices(&self) -> bool {
        self.translate_choice
    }

    pub fn value_projector(&self) -> &ValueProjector {
        &self.option_value
    }

    pub fn text_projector(&self) -> &TextProjector {
        &self.option_text
    }

    /// First choice whose value matches `value`
    ///
    /// Choices without a value never match, not even the empty sentinel.
    pub fn find(&self, choices: &[ChoiceRef], value: &Value) -> Option<ChoiceRef> {
        if value.is_null() {
            return None;
        }
        let key = value_key(value);
        choices
            .iter()
            .find(|choice| {
                let projected = self.resolve_value(choice);
                !projected.is_null() && value_key(&projected) == key
            })
            .cloned()
    }

    /// Reconcile a field value with the loaded choices
    ///
    /// Multi-select keeps the order of the value and drops ids that are not
    /// loaded; a scalar is treated as a one-element list.
    pub fn resolve_selection(&self, choices: &[ChoiceRef], value: &Value, multiple: bool) -> Selection {
        if !multiple {
            return Selection::Single(self.find(choices, value));
        }
        let values: &[Value] = match value {
            Value::Null => &[],
            Value::Array(items) => items,
            other => std::slice::from_ref(other),
        };
        let selected: Vec<ChoiceRef> = values
            .iter()
            .filter_map(|value| self.find(choices, value))
            .collect();
        if selected.len() < values.len() {
            trace!(
                requested = values.len(),
                found = selected.len(),
                "dropping values without a loaded choice"
            );
        }
        Selection::Multiple(selected)
    }

    /// Value equality of two selections, order and length sensitive
    pub fn selections_equal(&self, a: &Selection, b: &Selection) -> bool {
        match (a, b) {
            (Selection::Single(a), Selection::Single(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => self.value_key(a) == self.value_key(b),
                _ => false,
            },
            (Selection::Multiple(a), Selection::Multiple(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(a, b)| self.value_key(a) == self.value_key(b))
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for ChoiceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoiceResolver")
            .field("option_value", &self.option_value)
            .field("option_text", &self.option_text)
            .field("translate_choice", &self.translate_choice)
            .finish_non_exhaustive()
    }
}

/// Builder validating projector companions
pub struct ResolverBuilder {
    translator: Translator,
    option_value: ValueProjector,
    option_text: Option<TextProjector>,
    input_text: Option<TextFn>,
    match_suggestion: Option<MatchSuggestionFn>,
    translate_choice: Option<bool>,
    representation: Option<RecordToString>,
    has_empty_text: bool,
}

impl ResolverBuilder {
    pub fn option_value(mut self, projector: impl Into<ValueProjector>) -> Self {
        self.option_value = projector.into();
        self
    }

    pub fn option_text(mut self, projector: impl Into<TextProjector>) -> Self {
        self.option_text = Some(projector.into());
        self
    }

    pub fn maybe_option_text(mut self, projector: Option<TextProjector>) -> Self {
        self.option_text = projector;
        self
    }

    pub fn input_text(mut self, input_text: Option<TextFn>) -> Self {
        self.input_text = input_text;
        self
    }

    pub fn match_suggestion(mut self, matcher: Option<MatchSuggestionFn>) -> Self {
        self.match_suggestion = matcher;
        self
    }

    /// Explicit translation flag; defaults to `true`, `false` for references
    pub fn translate_choice(mut self, translate: Option<bool>) -> Self {
        self.translate_choice = translate;
        self
    }

    /// Choices come from a reference lookup represented by `representation`
    pub fn reference(mut self, representation: RecordToString) -> Self {
        self.representation = Some(representation);
        self
    }

    /// An empty pseudo-choice will be labelled by this resolver
    pub fn empty_text(mut self, has_empty_text: bool) -> Self {
        self.has_empty_text = has_empty_text;
        self
    }

    pub fn build(self) -> Result<ChoiceResolver> {
        let from_reference = self.representation.is_some();
        let option_text = match (self.option_text, self.representation) {
            (Some(text), _) => text,
            (None, Some(representation)) => TextProjector::representation(representation),
            (None, None) => TextProjector::default(),
        };

        if option_text.is_rich() {
            if self.input_text.is_none() {
                return Err(ChoiceError::RichTextWithoutInputText);
            }
            if self.match_suggestion.is_none() && !from_reference {
                return Err(ChoiceError::RichTextWithoutMatcher);
            }
            if self.has_empty_text {
                return Err(ChoiceError::RichTextWithEmptyText);
            }
        }

        Ok(ChoiceResolver {
            option_value: self.option_value,
            option_text,
            input_text: self.input_text,
            match_suggestion: self.match_suggestion,
            translate_choice: self.translate_choice.unwrap_or(!from_reference),
            translator: self.translator,
        })
    }
}

/// Case-insensitive literal substring test
pub(crate) fn contains_ignore_case(text: &str, needle: &str) -> bool {
    needle.is_empty() || text.to_lowercase().contains(&needle.to_lowercase())
}

/// Keeps the same `Arc<Selection>` while recomputed selections are equal
#[derive(Debug)]
pub struct SelectionMemo {
    current: Arc<Selection>,
}

impl SelectionMemo {
    pub fn new(multiple: bool) -> Self {
        Self {
            current: Arc::new(Selection::empty(multiple)),
        }
    }

    /// Store `next` if it differs by value; returns whether it changed
    pub fn update(&mut self, resolver: &ChoiceResolver, next: Selection) -> bool {
        if resolver.selections_equal(&self.current, &next) {
            return false;
        }
        self.current = Arc::new(next);
        true
    }

    pub fn current(&self) -> Arc<Selection> {
        Arc::clone(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{choices_from, RichContent};
    use rada_core::{MessageCatalog, RecordRepresentation};
    use serde_json::json;

    fn translator() -> Translator {
        Translator::new(Arc::new(
            MessageCatalog::english().with_message("gender.male", "Male"),
        ))
    }

    fn resolver() -> ChoiceResolver {
        ChoiceResolver::builder(translator()).build().unwrap()
    }

    #[test]
    fn test_find_compares_string_forms() {
        let choices = choices_from([json!({ "id": 1, "name": "One" }), json!({ "id": "2", "name": "Two" })]);
        let r = resolver();
        assert_eq!(r.find(&choices, &json!("1")).unwrap().get("name"), Some(&json!("One")));
        assert_eq!(r.find(&choices, &json!(2)).unwrap().get("name"), Some(&json!("Two")));
        assert!(r.find(&choices, &json!(3)).is_none());
        assert!(r.find(&choices, &Value::Null).is_none());
    }

    #[test]
    fn test_choice_without_value_never_matches_empty() {
        let choices = choices_from([json!({ "name": "Orphan" }), json!({ "id": "", "name": "None" })]);
        let r = resolver();
        assert_eq!(r.find(&choices, &json!("")).unwrap().get("name"), Some(&json!("None")));
        assert!(r.find(&choices[..1], &json!("")).is_none());
        assert!(r.resolve_selection(&choices[..1], &json!(""), false).single().is_none());
    }

    #[test]
    fn test_multi_selection_drops_unloaded_ids() {
        let choices = choices_from([json!({ "id": "b" })]);
        let r = resolver();
        let selection = r.resolve_selection(&choices, &json!(["a", "b"]), true);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.choices()[0].get("id"), Some(&json!("b")));
    }

    #[test]
    fn test_multi_selection_accepts_scalar() {
        let choices = choices_from([json!({ "id": "a" }), json!({ "id": "b" })]);
        let r = resolver();
        let selection = r.resolve_selection(&choices, &json!("b"), true);
        assert_eq!(selection.len(), 1);
        assert!(r.resolve_selection(&choices, &Value::Null, true).is_empty());
    }

    #[test]
    fn test_multi_selection_keeps_value_order() {
        let choices = choices_from([json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })]);
        let r = resolver();
        let selection = r.resolve_selection(&choices, &json!([3, 1]), true);
        let ids: Vec<_> = selection.choices().iter().map(|c| r.resolve_value(c)).collect();
        assert_eq!(ids, vec![json!(3), json!(1)]);
    }

    #[test]
    fn test_translation_defaults() {
        let choices = choices_from([json!({ "id": "M", "name": "gender.male" })]);
        let r = resolver();
        assert_eq!(r.resolve_text(&choices[0]), ChoiceText::from("Male"));

        let raw = ChoiceResolver::builder(translator())
            .translate_choice(Some(false))
            .build()
            .unwrap();
        assert_eq!(raw.resolve_text(&choices[0]), ChoiceText::from("gender.male"));

        let reference = ChoiceResolver::builder(translator())
            .option_text("name")
            .reference(RecordRepresentation::default().into_fn())
            .build()
            .unwrap();
        assert!(!reference.translates_choices());
    }

    #[test]
    fn test_reference_defaults_to_representation() {
        let r = ChoiceResolver::builder(translator())
            .reference(RecordRepresentation::Field("title".into()).into_fn())
            .build()
            .unwrap();
        let choice = Choice::new(json!({ "id": 4, "title": "Dune" }));
        assert_eq!(r.input_text(&choice).unwrap(), "Dune");
    }

    #[test]
    fn test_rich_text_needs_companions() {
        let rich = || TextProjector::rich(|_: &Choice| Arc::new(1u32) as RichContent);
        let input: TextFn = Arc::new(|c: &Choice| c.get("name").map(value_key).unwrap_or_default());
        let matcher: MatchSuggestionFn = Arc::new(|_: &str, _: &Choice| true);

        let err = ChoiceResolver::builder(translator()).option_text(rich()).build().unwrap_err();
        assert_eq!(err, ChoiceError::RichTextWithoutInputText);

        let err = ChoiceResolver::builder(translator())
            .option_text(rich())
            .input_text(Some(input.clone()))
            .build()
            .unwrap_err();
        assert_eq!(err, ChoiceError::RichTextWithoutMatcher);

        // references filter on the server
        assert!(ChoiceResolver::builder(translator())
            .option_text(rich())
            .input_text(Some(input.clone()))
            .reference(RecordRepresentation::default().into_fn())
            .build()
            .is_ok());

        let err = ChoiceResolver::builder(translator())
            .option_text(rich())
            .input_text(Some(input.clone()))
            .match_suggestion(Some(matcher.clone()))
            .empty_text(true)
            .build()
            .unwrap_err();
        assert_eq!(err, ChoiceError::RichTextWithEmptyText);

        let r = ChoiceResolver::builder(translator())
            .option_text(rich())
            .input_text(Some(input))
            .match_suggestion(Some(matcher))
            .build()
            .unwrap();
        let choice = Choice::new(json!({ "id": 1, "name": "Rich" }));
        assert_eq!(r.input_text(&choice).unwrap(), "Rich");
        assert!(r.resolve_text(&choice).is_rich());
    }

    #[test]
    fn test_default_matcher() {
        let r = resolver();
        let choice = Choice::new(json!({ "id": 1, "name": "Paris" }));
        assert!(r.matches("par", &choice));
        assert!(r.matches("", &choice));
        assert!(!r.matches("lyon", &choice));
        // literal, not a pattern
        assert!(!r.matches("P.ris", &choice));
    }

    #[test]
    fn test_selections_equal_by_value() {
        let r = resolver();
        let first = choices_from([json!({ "id": 1 }), json!({ "id": 2 })]);
        let second = choices_from([json!({ "id": "1" }), json!({ "id": "2" })]);
        assert!(r.selections_equal(
            &Selection::Multiple(first.clone()),
            &Selection::Multiple(second.clone())
        ));
        let reversed: Vec<_> = second.iter().rev().cloned().collect();
        assert!(!r.selections_equal(&Selection::Multiple(first.clone()), &Selection::Multiple(reversed)));
        assert!(!r.selections_equal(&Selection::Single(None), &Selection::Multiple(Vec::new())));
    }

    #[test]
    fn test_memo_keeps_reference_when_equal() {
        let r = resolver();
        let choices = choices_from([json!({ "id": 1 })]);
        let mut memo = SelectionMemo::new(false);
        assert!(memo.update(&r, Selection::Single(Some(choices[0].clone()))));
        let before = memo.current();

        let reloaded = choices_from([json!({ "id": 1 })]);
        assert!(!memo.update(&r, Selection::Single(Some(reloaded[0].clone()))));
        assert!(Arc::ptr_eq(&before, &memo.current()));

        assert!(memo.update(&r, Selection::Single(None)));
        assert!(!Arc::ptr_eq(&before, &memo.current()));
    }
}
