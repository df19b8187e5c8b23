//! Suggestion filtering
//!
//! Reference sources filter on the server, so their choices pass through
//! untouched apart from the limit. Other sources are filtered here when a
//! custom matcher is configured or when suggestions are limited to the value.

use smallvec::SmallVec;

use crate::choice::{ChoiceRef, Selection};
use crate::resolver::ChoiceResolver;

/// Client-side suggestion filter
#[derive(Clone, Copy, Debug, Default)]
pub struct SuggestionEngine {
    limit_choices_to_value: bool,
    suggestion_limit: Option<usize>,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show only the selection while the filter names it
    pub fn limit_choices_to_value(mut self, limit: bool) -> Self {
        self.limit_choices_to_value = limit;
        self
    }

    /// Maximum number of suggestions
    pub fn suggestion_limit(mut self, limit: Option<usize>) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// Whether [`get_suggestions`](Self::get_suggestions) filters at all
    pub fn filters_client_side(&self, resolver: &ChoiceResolver, from_reference: bool) -> bool {
        !from_reference && (resolver.has_custom_matcher() || self.limit_choices_to_value)
    }

    /// Choices to suggest for `filter`
    ///
    /// Selected choices always match. When the filter is empty or equals the
    /// text of the single selection, the filter is ignored so that refocusing
    /// a filled input shows every choice.
    pub fn get_suggestions(
        &self,
        resolver: &ChoiceResolver,
        choices: &[ChoiceRef],
        selection: &Selection,
        filter: &str,
    ) -> Vec<ChoiceRef> {
        let selected: SmallVec<[String; 4]> = selection
            .choices()
            .iter()
            .map(|choice| resolver.value_key(choice))
            .collect();

        let names_selection = selection.single().is_some_and(|choice| {
            filter.is_empty() || resolver.input_text(choice).is_ok_and(|text| text == filter)
        });

        let matched: Vec<ChoiceRef> = if names_selection {
            if self.limit_choices_to_value {
                choices
                    .iter()
                    .filter(|choice| selected.contains(&resolver.value_key(choice)))
                    .cloned()
                    .collect()
            } else {
                choices.to_vec()
            }
        } else {
            choices
                .iter()
                .filter(|choice| {
                    selected.contains(&resolver.value_key(choice)) || resolver.matches(filter, choice)
                })
                .cloned()
                .collect()
        };

        self.limit(matched)
    }

    /// Truncate to the configured limit
    pub fn limit(&self, mut suggestions: Vec<ChoiceRef>) -> Vec<ChoiceRef> {
        if let Some(limit) = self.suggestion_limit {
            suggestions.truncate(limit);
        }
        suggestions
    }
}
