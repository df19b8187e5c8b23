//! Rada Inputs
//!
//! Headless choice inputs: resolving a field value against a loaded list of
//! choices, suggesting choices for typed text, debouncing remote filtering and
//! creating new choices inline.
//!
//! # Features
//!
//! - **Projectors**: choice value and text from dotted paths or functions,
//!   with rich text validated against its plain companions
//! - **Resolution**: single and multiple selections, ids compared by their
//!   string form, reference-stable while unchanged
//! - **Suggestions**: client-side matching, server-side pass-through, limits
//! - **Debounce**: trailing-edge filter dispatch driven by the event loop
//! - **Creation**: callback (immediate or deferred) or embedded surface
//!
//! # Example
//!
//! ```rust
//! use std::time::Instant;
//!
//! use rada_core::{AdminContext, FieldHandle, FieldOptions, FormState};
//! use rada_inputs::{AutocompleteInput, AutocompleteOptions, ChangeEvent, InlineChoices};
//! use serde_json::json;
//!
//! let ctx = AdminContext::default();
//! let form = FormState::shared(json!({ "gender": "M" }));
//! let field = FieldHandle::register(&form, "gender", FieldOptions::default());
//! let choices = InlineChoices::new([
//!     json!({ "id": "M", "name": "Male" }),
//!     json!({ "id": "F", "name": "Female" }),
//! ]);
//!
//! let now = Instant::now();
//! let mut input = AutocompleteInput::new(AutocompleteOptions::default(), choices, field, &ctx, now)?;
//! assert_eq!(input.display_text(), "Male");
//!
//! let female = input.suggestions()[1].choice.clone();
//! input.on_change(ChangeEvent::Select(female), now)?;
//! assert_eq!(input.value(), json!("F"));
//! # Ok::<(), rada_inputs::ChoiceError>(())
//! ```

pub mod autocomplete;
pub mod choice;
pub mod create;
pub mod debounce;
pub mod error;
pub mod projector;
pub mod resolver;
pub mod select_field;
pub mod source;
pub mod suggestions;

pub use autocomplete::{
    AutocompleteInput, AutocompleteOptions, ChangeEvent, InputChangeReason, Suggestion,
    SuggestionKind,
};
pub use choice::{choices_from, Choice, ChoiceRef, ChoiceText, RichContent, Selection};
pub use create::{CreateAffordance, CreateOutcome, CreateRequest, CreateState, CreateSupport};
pub use debounce::{FilterDebouncer, FilterDispatch, DEFAULT_DEBOUNCE};
pub use error::{ChoiceError, Result};
pub use projector::{MatchSuggestionFn, TextProjector, ValueProjector};
pub use resolver::{ChoiceResolver, SelectionMemo};
pub use select_field::SelectField;
pub use source::{ChoiceSource, InlineChoices, ReferenceChoices};
pub use suggestions::SuggestionEngine;
