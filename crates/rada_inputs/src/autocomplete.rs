//! Autocomplete input binding
//!
//! [`AutocompleteInput`] keeps a text field, a choice source and a form field
//! consistent with each other. It is headless: the embedding UI forwards
//! events (`on_input_change`, `on_change`, `on_blur`, `on_focus`), calls
//! [`tick`](AutocompleteInput::tick) from its event loop, and renders what
//! the read side returns.
//!
//! ```ignore
//! let mut input = AutocompleteInput::new(
//!     AutocompleteOptions::from_defaults(&ctx.config().inputs).option_text("title"),
//!     ReferenceChoices::new(&ctx, "authors"),
//!     FieldHandle::register(&form, "author_id", FieldOptions::default()),
//!     &ctx,
//!     Instant::now(),
//! )?;
//!
//! input.on_input_change("tol", InputChangeReason::Input, Instant::now());
//! input.tick(Instant::now());
//! for suggestion in input.suggestions() { /* render */ }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use rada_core::record::{get_path, is_truthy, set_path, value_key};
use rada_core::{AdminContext, BoundField, ChangeRecords, InputDefaults, Translator};

use crate::choice::{Choice, ChoiceRef, ChoiceText, Selection};
use crate::create::{CreateAffordance, CreateOutcome, CreateRequest, CreateSupport};
use crate::debounce::{default_filter_to_query, FilterDebouncer, FilterDispatch, FilterToQueryFn, SetFilterFn};
use crate::error::{ChoiceError, Result};
use crate::projector::{MatchSuggestionFn, TextFn, TextProjector, ValueProjector};
use crate::resolver::{contains_ignore_case, ChoiceResolver, SelectionMemo};
use crate::source::ChoiceSource;
use crate::suggestions::SuggestionEngine;

/// Predicate disabling choices
pub type OptionDisabledFn = Arc<dyn Fn(&Choice) -> bool + Send + Sync>;

/// Predicate deciding whether suggestions are shown for the typed text
pub type ShouldRenderSuggestionsFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options of an [`AutocompleteInput`]
#[derive(Clone)]
pub struct AutocompleteOptions {
    option_value: ValueProjector,
    option_text: Option<TextProjector>,
    input_text: Option<TextFn>,
    match_suggestion: Option<MatchSuggestionFn>,
    translate_choice: Option<bool>,
    multiple: bool,
    clear_on_blur: bool,
    debounce: Duration,
    loading_delay: Duration,
    empty_value: Value,
    empty_text: Option<String>,
    suggestion_limit: Option<usize>,
    limit_choices_to_value: bool,
    should_render_suggestions: Option<ShouldRenderSuggestionsFn>,
    filter_to_query: FilterToQueryFn,
    set_filter: Option<SetFilterFn>,
    create: Option<CreateAffordance>,
    create_label: Option<String>,
    create_item_label: String,
    create_hint_label: Option<String>,
    create_value: String,
    create_hint_value: String,
    disable_value: String,
    get_option_disabled: Option<OptionDisabledFn>,
}

impl AutocompleteOptions {
    /// Options seeded from the admin configuration
    pub fn from_defaults(defaults: &InputDefaults) -> Self {
        Self {
            option_value: ValueProjector::default(),
            option_text: None,
            input_text: None,
            match_suggestion: None,
            translate_choice: None,
            multiple: false,
            clear_on_blur: defaults.clear_on_blur,
            debounce: defaults.debounce(),
            loading_delay: defaults.loading_delay(),
            empty_value: defaults.empty_value.clone(),
            empty_text: None,
            suggestion_limit: defaults.suggestion_limit,
            limit_choices_to_value: false,
            should_render_suggestions: None,
            filter_to_query: default_filter_to_query(),
            set_filter: None,
            create: None,
            create_label: None,
            create_item_label: defaults.create_item_label.clone(),
            create_hint_label: None,
            create_value: defaults.create_value.clone(),
            create_hint_value: defaults.create_hint_value.clone(),
            disable_value: defaults.disable_value.clone(),
            get_option_disabled: None,
        }
    }

    pub fn option_value(mut self, projector: impl Into<ValueProjector>) -> Self {
        self.option_value = projector.into();
        self
    }

    pub fn option_text(mut self, projector: impl Into<TextProjector>) -> Self {
        self.option_text = Some(projector.into());
        self
    }

    /// Plain text for the text field, required with rich option text
    pub fn input_text<F>(mut self, f: F) -> Self
    where
        F: Fn(&Choice) -> String + Send + Sync + 'static,
    {
        self.input_text = Some(Arc::new(f));
        self
    }

    pub fn match_suggestion<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Choice) -> bool + Send + Sync + 'static,
    {
        self.match_suggestion = Some(Arc::new(f));
        self
    }

    pub fn translate_choice(mut self, translate: bool) -> Self {
        self.translate_choice = Some(translate);
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn clear_on_blur(mut self, clear: bool) -> Self {
        self.clear_on_blur = clear;
        self
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn loading_delay(mut self, delay: Duration) -> Self {
        self.loading_delay = delay;
        self
    }

    /// Value written when the input is cleared; must not be `null`
    pub fn empty_value(mut self, value: Value) -> Self {
        self.empty_value = value;
        self
    }

    /// Label of a "no value" choice offered on optional single inputs
    pub fn empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = Some(text.into());
        self
    }

    pub fn suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = Some(limit);
        self
    }

    pub fn limit_choices_to_value(mut self, limit: bool) -> Self {
        self.limit_choices_to_value = limit;
        self
    }

    pub fn should_render_suggestions<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.should_render_suggestions = Some(Arc::new(f));
        self
    }

    pub fn filter_to_query<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        self.filter_to_query = Arc::new(f);
        self
    }

    /// Receive debounced filter text instead of the source
    pub fn set_filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.set_filter = Some(Arc::new(f));
        self
    }

    pub fn on_create<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> CreateOutcome + Send + Sync + 'static,
    {
        self.create = Some(CreateAffordance::callback(f));
        self
    }

    /// Creation handled by an embedded surface
    pub fn create_surface(mut self) -> Self {
        self.create = Some(CreateAffordance::Surface);
        self
    }

    pub fn create_label(mut self, label: impl Into<String>) -> Self {
        self.create_label = Some(label.into());
        self
    }

    pub fn create_item_label(mut self, label: impl Into<String>) -> Self {
        self.create_item_label = label.into();
        self
    }

    pub fn create_hint_label(mut self, label: impl Into<String>) -> Self {
        self.create_hint_label = Some(label.into());
        self
    }

    pub fn disable_value(mut self, path: impl Into<String>) -> Self {
        self.disable_value = path.into();
        self
    }

    pub fn get_option_disabled<F>(mut self, f: F) -> Self
    where
        F: Fn(&Choice) -> bool + Send + Sync + 'static,
    {
        self.get_option_disabled = Some(Arc::new(f));
        self
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self::from_defaults(&InputDefaults::default())
    }
}

impl std::fmt::Debug for AutocompleteOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutocompleteOptions")
            .field("option_value", &self.option_value)
            .field("option_text", &self.option_text)
            .field("multiple", &self.multiple)
            .field("debounce", &self.debounce)
            .field("empty_value", &self.empty_value)
            .field("empty_text", &self.empty_text)
            .field("create", &self.create)
            .finish_non_exhaustive()
    }
}

/// Why the text field changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputChangeReason {
    /// The user typed
    Input,
    /// The widget rewrote the text, usually after a selection
    Reset,
    /// The clear button was pressed
    Clear,
}

/// A selection event from the widget
#[derive(Clone, Debug)]
pub enum ChangeEvent {
    Select(ChoiceRef),
    /// Full list of a multi-select input
    SelectMany(Vec<ChoiceRef>),
    /// Free text submitted as a new choice
    CreateOption(String),
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionKind {
    Choice,
    /// The "no value" choice
    Empty,
    Create,
    CreateHint,
}

/// One entry of the suggestion list
#[derive(Clone, Debug)]
pub struct Suggestion {
    pub choice: ChoiceRef,
    pub text: ChoiceText,
    pub disabled: bool,
    pub kind: SuggestionKind,
}

enum Picked {
    One(ChoiceRef),
    Many(Vec<ChoiceRef>),
    Nothing,
}

/// Headless autocomplete bound to a form field
pub struct AutocompleteInput {
    options: AutocompleteOptions,
    source: Box<dyn ChoiceSource>,
    field: Box<dyn BoundField>,
    translator: Translator,
    resolver: ChoiceResolver,
    engine: SuggestionEngine,
    debouncer: FilterDebouncer,
    dispatch: FilterDispatch,
    create: CreateSupport,
    selection: SelectionMemo,
    filter_value: String,
    last_value: Value,
    focused: bool,
    filter_changed_at: Instant,
}

impl AutocompleteInput {
    /// Build an input, rejecting inconsistent options
    pub fn new(
        options: AutocompleteOptions,
        source: impl ChoiceSource + 'static,
        field: impl BoundField + 'static,
        ctx: &AdminContext,
        now: Instant,
    ) -> Result<Self> {
        if options.empty_value.is_null() {
            return Err(ChoiceError::NullEmptyValue);
        }
        let mut source: Box<dyn ChoiceSource> = Box::new(source);
        let field: Box<dyn BoundField> = Box::new(field);
        let translator = ctx.translator().clone();

        let mut resolver = ChoiceResolver::builder(translator.clone())
            .option_value(options.option_value.clone())
            .maybe_option_text(options.option_text.clone())
            .input_text(options.input_text.clone())
            .match_suggestion(options.match_suggestion.clone())
            .translate_choice(options.translate_choice)
            .empty_text(options.empty_text.is_some());
        if source.is_from_reference() {
            let resource = source.resource().unwrap_or_default();
            resolver = resolver.reference(ctx.get_record_representation(resource));
        }
        let resolver = resolver.build()?;

        let create = CreateSupport::new(options.create.clone(), translator.clone())
            .create_label(options.create_label.clone())
            .create_item_label(options.create_item_label.clone())
            .create_hint_label(options.create_hint_label.clone())
            .ids(options.create_value.clone(), options.create_hint_value.clone())
            .keys(resolver.value_projector().key(), resolver.text_projector().key());
        let engine = SuggestionEngine::new()
            .limit_choices_to_value(options.limit_choices_to_value)
            .suggestion_limit(options.suggestion_limit);
        let debouncer = FilterDebouncer::new(options.debounce);
        let dispatch = FilterDispatch::new(options.set_filter.clone(), options.filter_to_query.clone());

        let last_value = field.value();
        source.track_value(&last_value);
        let multiple = options.multiple;

        let mut input = Self {
            options,
            source,
            field,
            translator,
            resolver,
            engine,
            debouncer,
            dispatch,
            create,
            selection: SelectionMemo::new(multiple),
            filter_value: String::new(),
            last_value,
            focused: false,
            filter_changed_at: now,
        };
        input.refresh_selection(true);
        Ok(input)
    }

    // ---- events ----

    /// The text field changed
    pub fn on_input_change(&mut self, text: &str, reason: InputChangeReason, now: Instant) {
        match reason {
            InputChangeReason::Clear => self.set_filter_text(String::new(), now),
            InputChangeReason::Reset => {
                if !self.query_matches_selection(text) {
                    self.set_filter_text(text.to_string(), now);
                }
            }
            InputChangeReason::Input => {
                // the widget echoes the create item label when it is highlighted
                if self.create.is_enabled() && text == self.create.item_label(&self.filter_value) {
                    trace!(text, "ignoring create item label");
                    return;
                }
                self.set_filter_text(text.to_string(), now);
            }
        }
    }

    /// A choice was picked, created or cleared
    pub fn on_change(&mut self, event: ChangeEvent, now: Instant) -> Result<()> {
        match event {
            ChangeEvent::Select(choice) => {
                if self.create.is_create_item(&choice) {
                    let filter = self.filter_value.clone();
                    return self.start_create(&filter, now);
                }
                if self.option_disabled(&choice) {
                    trace!("ignoring disabled choice");
                    return Ok(());
                }
                self.pick(Picked::One(choice), now);
            }
            ChangeEvent::SelectMany(choices) => {
                if choices.iter().any(|c| self.create.is_create_item(c)) {
                    let filter = self.filter_value.clone();
                    return self.start_create(&filter, now);
                }
                let choices = choices
                    .into_iter()
                    .filter(|c| !self.option_disabled(c))
                    .collect();
                self.pick(Picked::Many(choices), now);
            }
            ChangeEvent::CreateOption(text) => return self.start_create(&text, now),
            ChangeEvent::Clear => self.pick(Picked::Nothing, now),
        }
        Ok(())
    }

    pub fn on_focus(&mut self) {
        self.focused = true;
    }

    /// Leaving the input restores the text of the selection
    pub fn on_blur(&mut self, now: Instant) {
        self.focused = false;
        if self.options.clear_on_blur {
            let text = if self.options.multiple {
                String::new()
            } else {
                self.selection_text()
            };
            if text != self.filter_value {
                trace!(%text, "restoring text on blur");
                self.filter_value = text;
                self.debouncer.push("", now);
                self.filter_changed_at = now;
            }
        }
        self.field.on_blur();
    }

    /// Drive timers and background work
    ///
    /// Sends the debounced filter, applies deferred creations, runs source
    /// loads and picks up external field changes.
    pub fn tick(&mut self, now: Instant) {
        if let Some(text) = self.debouncer.poll(now) {
            self.dispatch.dispatch(&text, self.source.as_mut());
        }
        if self.create.poll_deferred() {
            self.apply_created(now);
        }
        self.source.poll();
        let changed = self.sync_field(now);
        self.refresh_selection(changed);
    }

    /// Answer from a creation surface
    pub fn complete_create(&mut self, choice: Choice, now: Instant) -> Result<()> {
        self.create.complete(choice)?;
        self.apply_created(now);
        Ok(())
    }

    pub fn cancel_create(&mut self) {
        self.create.cancel();
    }

    // ---- read side ----

    /// Choices matching the field value, reference-stable while unchanged
    pub fn selection(&self) -> Arc<Selection> {
        self.selection.current()
    }

    /// Typed filter text
    pub fn filter_value(&self) -> &str {
        &self.filter_value
    }

    /// Text shown in the text field
    pub fn display_text(&self) -> &str {
        &self.filter_value
    }

    /// Labels of the selected choices, for chips
    pub fn selected_labels(&self) -> Vec<ChoiceText> {
        self.selection
            .current()
            .choices()
            .iter()
            .map(|choice| self.label_for(choice, true))
            .collect()
    }

    pub fn value(&self) -> Value {
        self.field.value()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Pending with nothing loaded, and the last filter change is old enough
    pub fn is_loading(&self, now: Instant) -> bool {
        self.source.is_pending()
            && self.source.choices().is_empty()
            && now.saturating_duration_since(self.filter_changed_at) >= self.options.loading_delay
    }

    /// Field validation error, else the source load error
    pub fn error(&self) -> Option<String> {
        self.field
            .error()
            .map(|key| self.translator.translate_or_literal(&key))
            .or_else(|| self.source.error())
    }

    pub fn is_creating(&self) -> bool {
        self.create.is_creating()
    }

    pub fn create_request(&self) -> Option<&CreateRequest> {
        self.create.request()
    }

    pub fn option_disabled(&self, choice: &Choice) -> bool {
        self.create.is_hint_item(choice)
            || is_truthy(choice.get(&self.options.disable_value))
            || self.options.get_option_disabled.as_ref().is_some_and(|f| f(choice))
    }

    /// Suggestion list for the current filter text
    pub fn suggestions(&self) -> Vec<Suggestion> {
        if let Some(should_render) = &self.options.should_render_suggestions {
            if !should_render(&self.filter_value) {
                return Vec::new();
            }
        }
        let choices = self.choices();
        let selection = self.selection.current();
        let from_reference = self.source.is_from_reference();

        let mut items = if self.engine.filters_client_side(&self.resolver, from_reference) {
            self.engine
                .get_suggestions(&self.resolver, &choices, &selection, &self.filter_value)
        } else if from_reference {
            self.engine.limit(choices.clone())
        } else {
            self.engine.limit(self.default_filter(&choices, &selection))
        };

        let names_choice = self.names_existing_choice(&self.filter_value, &choices);
        if let Some(item) = self.create.suggestion_item(&self.filter_value, names_choice) {
            items.push(item);
        }

        items
            .into_iter()
            .map(|choice| Suggestion {
                text: self.label_for(&choice, true),
                disabled: self.option_disabled(&choice),
                kind: self.kind_of(&choice),
                choice,
            })
            .collect()
    }

    // ---- internals ----

    fn choices(&self) -> Vec<ChoiceRef> {
        let mut choices = self.source.choices();
        if let Some(empty) = self.empty_choice() {
            choices.insert(0, empty);
        }
        choices
    }

    fn empty_choice(&self) -> Option<ChoiceRef> {
        let empty_text = self.options.empty_text.as_deref()?;
        if self.options.multiple || self.field.is_required() {
            return None;
        }
        let mut record = Value::Object(Map::new());
        set_path(&mut record, self.resolver.value_projector().key(), self.options.empty_value.clone());
        set_path(
            &mut record,
            self.resolver.text_projector().key(),
            Value::String(self.translator.translate_or_literal(empty_text)),
        );
        Some(Arc::new(Choice::new(record)))
    }

    fn is_empty_choice(&self, choice: &Choice) -> bool {
        self.options.empty_text.is_some()
            && get_path(choice.record(), self.resolver.value_projector().key())
                .is_some_and(|value| value_key(value) == value_key(&self.options.empty_value))
    }

    fn kind_of(&self, choice: &Choice) -> SuggestionKind {
        if self.create.is_create_item(choice) {
            SuggestionKind::Create
        } else if self.create.is_hint_item(choice) {
            SuggestionKind::CreateHint
        } else if self.is_empty_choice(choice) {
            SuggestionKind::Empty
        } else {
            SuggestionKind::Choice
        }
    }

    /// List text (possibly rich) or text field text of a choice
    fn label_for(&self, choice: &Choice, list_item: bool) -> ChoiceText {
        if let Some(label) = self.create.synthetic_label(choice) {
            return ChoiceText::Plain(label);
        }
        if self.is_empty_choice(choice) {
            let key = self.resolver.text_projector().key();
            return ChoiceText::Plain(choice.get(key).map(value_key).unwrap_or_default());
        }
        if list_item {
            return self.resolver.resolve_text(choice);
        }
        // rich text without input_text is rejected when the input is built
        ChoiceText::Plain(self.resolver.input_text(choice).unwrap_or_default())
    }

    fn plain_label(&self, choice: &Choice) -> String {
        match self.label_for(choice, false) {
            ChoiceText::Plain(text) => text,
            ChoiceText::Rich(_) => String::new(),
        }
    }

    fn selection_text(&self) -> String {
        self.selection
            .current()
            .single()
            .map(|choice| self.plain_label(choice))
            .unwrap_or_default()
    }

    fn query_matches_selection(&self, text: &str) -> bool {
        self.selection
            .current()
            .choices()
            .iter()
            .any(|choice| self.plain_label(choice) == text)
    }

    fn names_existing_choice(&self, text: &str, choices: &[ChoiceRef]) -> bool {
        self.query_matches_selection(text) || choices.iter().any(|choice| self.plain_label(choice) == text)
    }

    /// Case-insensitive substring filter on the text field label; the text of
    /// the single selection does not filter, and a multi-select input hides
    /// what is already selected
    fn default_filter(&self, choices: &[ChoiceRef], selection: &Selection) -> Vec<ChoiceRef> {
        let choices: Vec<ChoiceRef> = if self.options.multiple {
            let selected: FxHashSet<String> = selection
                .choices()
                .iter()
                .map(|choice| self.resolver.value_key(choice))
                .collect();
            choices
                .iter()
                .filter(|choice| !selected.contains(&self.resolver.value_key(choice)))
                .cloned()
                .collect()
        } else {
            choices.to_vec()
        };
        let names_selection = selection
            .single()
            .is_some_and(|choice| self.plain_label(choice) == self.filter_value);
        if names_selection || self.filter_value.is_empty() {
            return choices;
        }
        choices
            .iter()
            .filter(|choice| contains_ignore_case(&self.plain_label(choice), &self.filter_value))
            .cloned()
            .collect()
    }

    fn set_filter_text(&mut self, text: String, now: Instant) {
        self.debouncer.push(text.clone(), now);
        self.filter_value = text;
        self.filter_changed_at = now;
    }

    /// Pick up a field value written by someone else
    fn sync_field(&mut self, now: Instant) -> bool {
        let value = self.field.value();
        if value == self.last_value {
            return false;
        }
        debug!(%value, "field value changed");
        self.source.track_value(&value);
        self.last_value = value;
        self.debouncer.cancel();
        self.filter_value.clear();
        self.filter_changed_at = now;
        self.dispatch.dispatch("", self.source.as_mut());
        true
    }

    /// Recompute the selection; single inputs show its text when it changed
    fn refresh_selection(&mut self, force_text: bool) {
        let choices = self.choices();
        let next = self
            .resolver
            .resolve_selection(&choices, &self.last_value, self.options.multiple);
        let changed = self.selection.update(&self.resolver, next);
        if changed {
            debug!(selected = self.selection.current().len(), "selection changed");
        }
        if !self.options.multiple && (changed || force_text) {
            self.filter_value = self.selection_text();
        }
    }

    fn start_create(&mut self, filter: &str, now: Instant) -> Result<()> {
        self.create.start(filter)?;
        self.apply_created(now);
        Ok(())
    }

    fn apply_created(&mut self, now: Instant) {
        let Some(choice) = self.create.take_created() else {
            return;
        };
        self.source.append(Arc::clone(&choice));
        self.pick(Picked::One(choice), now);
    }

    fn pick(&mut self, picked: Picked, now: Instant) {
        let (value, records) = if self.options.multiple {
            self.multiple_change(picked)
        } else {
            self.single_change(picked)
        };
        self.field.on_change(value, records);
        let changed = self.sync_field(now);
        self.refresh_selection(changed);
    }

    fn single_change(&self, picked: Picked) -> (Value, ChangeRecords) {
        let choice = match picked {
            Picked::One(choice) => Some(choice),
            Picked::Many(choices) => choices.into_iter().last(),
            Picked::Nothing => None,
        };
        match choice {
            Some(choice) => {
                let value = self.resolver.resolve_value(&choice);
                let value = if value.is_null() {
                    self.options.empty_value.clone()
                } else {
                    value
                };
                (value, ChangeRecords::One(choice.record().clone()))
            }
            None => (self.options.empty_value.clone(), ChangeRecords::None),
        }
    }

    fn multiple_change(&self, picked: Picked) -> (Value, ChangeRecords) {
        let choices = match picked {
            Picked::Many(choices) => choices,
            Picked::One(choice) => {
                // appended to the raw value so ids that are not loaded survive;
                // anything but an array starts a new sequence
                let (mut values, mut records) = match self.field.value() {
                    Value::Array(values) => {
                        let records = self
                            .selection
                            .current()
                            .choices()
                            .iter()
                            .map(|c| c.record().clone())
                            .collect();
                        (values, records)
                    }
                    _ => (Vec::new(), Vec::new()),
                };
                values.push(self.resolver.resolve_value(&choice));
                records.push(choice.record().clone());
                return (Value::Array(values), ChangeRecords::Many(records));
            }
            Picked::Nothing => Vec::new(),
        };
        let values = choices.iter().map(|c| self.resolver.resolve_value(c)).collect();
        let records = choices.iter().map(|c| c.record().clone()).collect();
        (Value::Array(values), ChangeRecords::Many(records))
    }
}

impl std::fmt::Debug for AutocompleteInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutocompleteInput")
            .field("options", &self.options)
            .field("filter_value", &self.filter_value)
            .field("value", &self.last_value)
            .field("selection", &self.selection)
            .field("create", &self.create)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rada_core::{AdminConfig, FieldHandle, FieldOptions, FormState};
    use serde_json::json;

    use crate::source::InlineChoices;

    fn cities() -> InlineChoices {
        InlineChoices::new([
            json!({ "id": 1, "name": "Paris" }),
            json!({ "id": 2, "name": "Lyon" }),
        ])
    }

    fn input(options: AutocompleteOptions, record: Value) -> AutocompleteInput {
        let form = FormState::shared(record);
        let field = FieldHandle::register(&form, "city", FieldOptions::default());
        AutocompleteInput::new(options, cities(), field, &AdminContext::default(), Instant::now())
            .unwrap()
    }

    #[test]
    fn test_options_from_config() {
        let config = AdminConfig::from_toml_str("[inputs]\ndebounce_ms = 400\nsuggestion_limit = 1\n").unwrap();
        let options = AutocompleteOptions::from_defaults(&config.inputs);
        assert_eq!(options.debounce, Duration::from_millis(400));
        assert_eq!(options.suggestion_limit, Some(1));

        let input = input(options, json!({}));
        assert_eq!(input.suggestions().len(), 1);
    }

    #[test]
    fn test_reset_with_selection_text_keeps_filter() {
        let mut input = input(AutocompleteOptions::default(), json!({ "city": 1 }));
        let now = Instant::now();
        input.on_input_change("Paris", InputChangeReason::Reset, now);
        assert!(!input.debouncer.is_pending());
        input.on_input_change("Pa", InputChangeReason::Reset, now);
        assert_eq!(input.filter_value(), "Pa");
        input.on_input_change("", InputChangeReason::Clear, now);
        assert_eq!(input.filter_value(), "");
    }

    #[test]
    fn test_create_label_echo_is_ignored() {
        let mut input = input(
            AutocompleteOptions::default().on_create(|_| CreateOutcome::Cancelled),
            json!({}),
        );
        let now = Instant::now();
        input.on_input_change("Nice", InputChangeReason::Input, now);
        input.on_input_change("Create Nice", InputChangeReason::Input, now);
        assert_eq!(input.filter_value(), "Nice");
    }

    #[test]
    fn test_default_filter_ignores_selection_text() {
        let mut input = input(AutocompleteOptions::default(), json!({ "city": 2 }));
        assert_eq!(input.display_text(), "Lyon");
        assert_eq!(input.suggestions().len(), 2);

        input.on_input_change("pa", InputChangeReason::Input, Instant::now());
        let texts: Vec<_> = input.suggestions().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec![ChoiceText::from("Paris")]);
    }

    #[test]
    fn test_should_render_suggestions() {
        let mut input = input(
            AutocompleteOptions::default().should_render_suggestions(|text| text.len() >= 2),
            json!({}),
        );
        assert!(input.suggestions().is_empty());
        input.on_input_change("Ly", InputChangeReason::Input, Instant::now());
        assert_eq!(input.suggestions().len(), 1);
    }

    #[test]
    fn test_multi_blur_clears_typed_text() {
        let mut input = input(AutocompleteOptions::default().multiple(true), json!({ "city": [1] }));
        let now = Instant::now();
        input.on_input_change("ly", InputChangeReason::Input, now);
        input.on_blur(now);
        assert_eq!(input.filter_value(), "");
        assert_eq!(input.selection().len(), 1);
    }

    #[test]
    fn test_select_many_replaces_value() {
        let mut input = input(AutocompleteOptions::default().multiple(true), json!({ "city": [] }));
        let all: Vec<ChoiceRef> = input.suggestions().into_iter().map(|s| s.choice).collect();
        input
            .on_change(ChangeEvent::SelectMany(all.into_iter().rev().collect()), Instant::now())
            .unwrap();
        assert_eq!(input.value(), json!([2, 1]));
    }

    #[test]
    fn test_multi_hides_selected_suggestions() {
        let mut input = input(AutocompleteOptions::default().multiple(true), json!({ "city": [1] }));
        let ids: Vec<_> = input.suggestions().iter().map(|s| s.choice.record()["id"].clone()).collect();
        assert_eq!(ids, vec![json!(2)]);

        input.on_input_change("y", InputChangeReason::Input, Instant::now());
        let ids: Vec<_> = input.suggestions().iter().map(|s| s.choice.record()["id"].clone()).collect();
        assert_eq!(ids, vec![json!(2)]);
        input.on_input_change("par", InputChangeReason::Input, Instant::now());
        assert!(input.suggestions().is_empty());
    }

    #[test]
    fn test_add_one_to_scalar_multi_value_starts_a_list() {
        let mut input = input(AutocompleteOptions::default().multiple(true), json!({ "city": 1 }));
        let lyon = input.suggestions().into_iter().find(|s| s.choice.record()["id"] == json!(2)).unwrap();
        input.on_change(ChangeEvent::Select(lyon.choice), Instant::now()).unwrap();
        assert_eq!(input.value(), json!([2]));
        assert_eq!(input.selection().len(), 1);
    }
}
