//! Error types for rada_inputs

use thiserror::Error;

/// Configuration and creation errors of choice inputs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    /// Rich option text needs a plain projection for the text field
    #[error("When option_text renders rich content, input_text must be provided (used for the text input)")]
    RichTextWithoutInputText,

    /// Rich option text needs a matcher for filtering
    #[error("When option_text renders rich content, match_suggestion must be provided (used to match the user input with a choice)")]
    RichTextWithoutMatcher,

    /// Rich option text cannot label the empty choice
    #[error("Rich option_text is not supported together with empty_text")]
    RichTextWithEmptyText,

    /// `null` cannot tell "cleared" from "unset"
    #[error("empty_value cannot be null; map the empty string to null when writing the record instead")]
    NullEmptyValue,

    /// The create item was picked but nothing can create a choice
    #[error("To create a new choice, configure an on_create callback or a create surface")]
    NoCreateHandler,

    /// `complete_create` called while no creation is in progress
    #[error("No choice creation is in progress")]
    NotCreating,
}

/// Result type for rada_inputs operations
pub type Result<T> = std::result::Result<T, ChoiceError>;
