//! Read-only display of a choice value

use serde_json::Value;

use rada_core::Translator;

use crate::choice::{Choice, ChoiceText};
use crate::projector::{TextProjector, ValueProjector};

/// Shows the text of the choice matching a record value
///
/// Values are compared strictly: `"1"` does not show the choice whose id is
/// `1`.
#[derive(Clone, Debug)]
pub struct SelectField {
    option_value: ValueProjector,
    option_text: TextProjector,
    translate_choice: bool,
    empty_text: Option<String>,
}

impl SelectField {
    pub fn new() -> Self {
        Self {
            option_value: ValueProjector::default(),
            option_text: TextProjector::default(),
            translate_choice: true,
            empty_text: None,
        }
    }

    pub fn option_value(mut self, projector: impl Into<ValueProjector>) -> Self {
        self.option_value = projector.into();
        self
    }

    pub fn option_text(mut self, projector: impl Into<TextProjector>) -> Self {
        self.option_text = projector.into();
        self
    }

    pub fn translate_choice(mut self, translate: bool) -> Self {
        self.translate_choice = translate;
        self
    }

    /// Text shown when no choice matches
    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = Some(text.into());
        self
    }

    /// Text for `value`, or the empty text
    pub fn render(&self, choices: &[Choice], value: &Value, translator: &Translator) -> Option<ChoiceText> {
        let choice = choices
            .iter()
            .find(|choice| self.option_value.project(choice) == *value);
        match choice {
            Some(choice) => Some(match self.option_text.project(choice) {
                ChoiceText::Plain(text) if self.translate_choice => {
                    ChoiceText::Plain(translator.translate_or_literal(&text))
                }
                text => text,
            }),
            None => self
                .empty_text
                .as_deref()
                .map(|text| ChoiceText::Plain(translator.translate_or_literal(text))),
        }
    }
}

impl Default for SelectField {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rada_core::MessageCatalog;
    use serde_json::json;
    use std::sync::Arc;

    fn genders() -> Vec<Choice> {
        vec![
            Choice::new(json!({ "id": "M", "name": "gender.male" })),
            Choice::new(json!({ "id": "F", "name": "gender.female" })),
        ]
    }

    fn translator() -> Translator {
        Translator::new(Arc::new(
            MessageCatalog::english()
                .with_message("gender.male", "Male")
                .with_message("gender.female", "Female")
                .with_message("ra.field.none", "None"),
        ))
    }

    #[test]
    fn test_renders_translated_text() {
        let field = SelectField::new();
        assert_eq!(
            field.render(&genders(), &json!("F"), &translator()),
            Some(ChoiceText::from("Female"))
        );
        let raw = SelectField::new().translate_choice(false);
        assert_eq!(
            raw.render(&genders(), &json!("M"), &translator()),
            Some(ChoiceText::from("gender.male"))
        );
    }

    #[test]
    fn test_strict_equality_and_empty_text() {
        let choices = vec![Choice::new(json!({ "id": 1, "name": "One" }))];
        let field = SelectField::new();
        assert_eq!(field.render(&choices, &json!("1"), &translator()), None);

        let field = SelectField::new().empty_text("ra.field.none");
        assert_eq!(
            field.render(&choices, &json!("1"), &translator()),
            Some(ChoiceText::from("None"))
        );
    }
}
