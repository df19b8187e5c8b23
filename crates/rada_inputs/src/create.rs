//! Inline creation of choices
//!
//! When the typed text matches nothing, a synthetic "create" item is offered.
//! Picking it hands the text to the configured affordance:
//!
//! - `Callback`: `on_create(filter)` answers right away, later through a
//!   oneshot channel, or cancels.
//! - `Surface`: an embedded dialog reads [`CreateRequest`] and answers with
//!   `complete` or `cancel`.
//!
//! ```text
//! Idle --start--> Creating --resolved--> CreatedPendingSelection --take--> Idle
//!                    |
//!                    +--cancel / sender dropped--> Idle
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, warn};

use rada_core::record::{get_path, set_path, value_key};
use rada_core::{TranslateOptions, Translator};

use crate::choice::{Choice, ChoiceRef};
use crate::error::{ChoiceError, Result};
use crate::projector::{DEFAULT_TEXT_PATH, DEFAULT_VALUE_PATH};

/// Default id of the create item
pub const DEFAULT_CREATE_VALUE: &str = "@@ra-create";

/// Default id of the create hint item
pub const DEFAULT_CREATE_HINT_VALUE: &str = "@@ra-create-hint";

/// Default label key of the create item when text was typed
pub const DEFAULT_CREATE_ITEM_LABEL: &str = "ra.action.create_item";

/// Label key of the create item when nothing was typed
pub const DEFAULT_CREATE_LABEL: &str = "ra.action.create";

/// Answer of an `on_create` callback
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Choice),
    /// Resolved later through the sender half
    Deferred(oneshot::Receiver<Choice>),
    Cancelled,
}

impl CreateOutcome {
    /// A deferred outcome and the sender that resolves it
    pub fn deferred() -> (oneshot::Sender<Choice>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, CreateOutcome::Deferred(rx))
    }
}

/// Creation callback receiving the typed filter
pub type OnCreateFn = Arc<dyn Fn(&str) -> CreateOutcome + Send + Sync>;

/// How new choices get created
#[derive(Clone)]
pub enum CreateAffordance {
    Callback(OnCreateFn),
    /// An embedded surface answers through `complete_create`/`cancel_create`
    Surface,
}

impl CreateAffordance {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str) -> CreateOutcome + Send + Sync + 'static,
    {
        CreateAffordance::Callback(Arc::new(f))
    }
}

impl std::fmt::Debug for CreateAffordance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateAffordance::Callback(_) => write!(f, "Callback(..)"),
            CreateAffordance::Surface => write!(f, "Surface"),
        }
    }
}

/// What a creation surface should prefill
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRequest {
    pub filter: String,
}

#[derive(Clone, Debug, Default)]
pub enum CreateState {
    #[default]
    Idle,
    Creating(CreateRequest),
    CreatedPendingSelection(ChoiceRef),
}

/// Create item injection and the creation state machine
pub struct CreateSupport {
    affordance: Option<CreateAffordance>,
    translator: Translator,
    create_label: Option<String>,
    create_item_label: String,
    create_hint_label: Option<String>,
    create_value: String,
    create_hint_value: String,
    value_key: String,
    text_key: String,
    state: CreateState,
    deferred: Option<oneshot::Receiver<Choice>>,
}

impl CreateSupport {
    pub fn new(affordance: Option<CreateAffordance>, translator: Translator) -> Self {
        Self {
            affordance,
            translator,
            create_label: None,
            create_item_label: DEFAULT_CREATE_ITEM_LABEL.to_string(),
            create_hint_label: None,
            create_value: DEFAULT_CREATE_VALUE.to_string(),
            create_hint_value: DEFAULT_CREATE_HINT_VALUE.to_string(),
            value_key: DEFAULT_VALUE_PATH.to_string(),
            text_key: DEFAULT_TEXT_PATH.to_string(),
            state: CreateState::Idle,
            deferred: None,
        }
    }

    /// Offer creation even when nothing was typed
    pub fn create_label(mut self, label: Option<String>) -> Self {
        self.create_label = label;
        self
    }

    pub fn create_item_label(mut self, label: impl Into<String>) -> Self {
        self.create_item_label = label.into();
        self
    }

    /// Disabled hint shown when nothing was typed
    pub fn create_hint_label(mut self, label: Option<String>) -> Self {
        self.create_hint_label = label;
        self
    }

    pub fn ids(mut self, create_value: impl Into<String>, create_hint_value: impl Into<String>) -> Self {
        self.create_value = create_value.into();
        self.create_hint_value = create_hint_value.into();
        self
    }

    /// Record keys of synthetic items
    pub fn keys(mut self, value_key: impl Into<String>, text_key: impl Into<String>) -> Self {
        self.value_key = value_key.into();
        self.text_key = text_key.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.affordance.is_some()
    }

    pub fn state(&self) -> &CreateState {
        &self.state
    }

    pub fn is_creating(&self) -> bool {
        matches!(self.state, CreateState::Creating(_))
    }

    /// The creation in progress
    pub fn request(&self) -> Option<&CreateRequest> {
        match &self.state {
            CreateState::Creating(request) => Some(request),
            _ => None,
        }
    }

    /// Label of the create item for `filter`
    pub fn item_label(&self, filter: &str) -> String {
        if filter.is_empty() {
            let key = self.create_label.as_deref().unwrap_or(DEFAULT_CREATE_LABEL);
            return self.translator.translate_or_literal(key);
        }
        self.translator.translate(
            &self.create_item_label,
            &TranslateOptions::fallback(&self.create_item_label).param("item", filter),
        )
    }

    fn synthetic(&self, id: &str, label: String) -> ChoiceRef {
        let mut record = Value::Object(Map::new());
        set_path(&mut record, &self.value_key, Value::String(id.to_string()));
        set_path(&mut record, &self.text_key, Value::String(label));
        Arc::new(Choice::new(record))
    }

    /// Synthetic create item for `filter`
    pub fn create_item(&self, filter: &str) -> ChoiceRef {
        self.synthetic(&self.create_value, self.item_label(filter))
    }

    /// Disabled hint item, when a hint label is configured
    pub fn hint_item(&self) -> Option<ChoiceRef> {
        let label = self.create_hint_label.as_deref()?;
        Some(self.synthetic(&self.create_hint_value, self.translator.translate_or_literal(label)))
    }

    fn synthetic_id(&self, choice: &Choice) -> Option<String> {
        get_path(choice.record(), &self.value_key).map(value_key)
    }

    pub fn is_create_item(&self, choice: &Choice) -> bool {
        self.synthetic_id(choice).as_deref() == Some(self.create_value.as_str())
    }

    pub fn is_hint_item(&self, choice: &Choice) -> bool {
        self.synthetic_id(choice).as_deref() == Some(self.create_hint_value.as_str())
    }

    /// Label stored on a synthetic item
    pub fn synthetic_label(&self, choice: &Choice) -> Option<String> {
        if !self.is_create_item(choice) && !self.is_hint_item(choice) {
            return None;
        }
        Some(get_path(choice.record(), &self.text_key).map(value_key).unwrap_or_default())
    }

    /// Item to append to the suggestions, if any
    ///
    /// With an empty filter the create item needs a `create_label`, otherwise
    /// the hint is offered. With a filter, the create item is offered unless
    /// the text already names a choice.
    pub fn suggestion_item(&self, filter: &str, names_existing_choice: bool) -> Option<ChoiceRef> {
        if !self.is_enabled() {
            return None;
        }
        if filter.is_empty() {
            return match self.create_label {
                Some(_) => Some(self.create_item("")),
                None => self.hint_item(),
            };
        }
        (!names_existing_choice).then(|| self.create_item(filter))
    }

    /// The create item was picked with `filter` typed
    pub fn start(&mut self, filter: &str) -> Result<()> {
        let affordance = self.affordance.clone().ok_or(ChoiceError::NoCreateHandler)?;
        self.deferred = None;
        let request = CreateRequest {
            filter: filter.to_string(),
        };
        match affordance {
            CreateAffordance::Surface => {
                debug!(filter, "creation requested from surface");
                self.state = CreateState::Creating(request);
            }
            CreateAffordance::Callback(on_create) => match on_create(filter) {
                CreateOutcome::Created(choice) => {
                    debug!(filter, "choice created");
                    self.state = CreateState::CreatedPendingSelection(Arc::new(choice));
                }
                CreateOutcome::Deferred(receiver) => {
                    debug!(filter, "choice creation deferred");
                    self.deferred = Some(receiver);
                    self.state = CreateState::Creating(request);
                }
                CreateOutcome::Cancelled => {
                    debug!(filter, "choice creation cancelled");
                    self.state = CreateState::Idle;
                }
            },
        }
        Ok(())
    }

    /// Check a deferred creation; returns whether a choice is ready
    pub fn poll_deferred(&mut self) -> bool {
        let Some(receiver) = self.deferred.as_mut() else {
            return false;
        };
        match receiver.try_recv() {
            Ok(choice) => {
                debug!("deferred choice created");
                self.deferred = None;
                self.state = CreateState::CreatedPendingSelection(Arc::new(choice));
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                warn!("choice creation dropped without a result");
                self.deferred = None;
                self.state = CreateState::Idle;
                false
            }
        }
    }

    /// Answer from a creation surface
    pub fn complete(&mut self, choice: Choice) -> Result<()> {
        if !self.is_creating() {
            return Err(ChoiceError::NotCreating);
        }
        self.deferred = None;
        self.state = CreateState::CreatedPendingSelection(Arc::new(choice));
        Ok(())
    }

    pub fn cancel(&mut self) {
        if self.is_creating() {
            debug!("choice creation cancelled");
        }
        self.deferred = None;
        self.state = CreateState::Idle;
    }

    /// Take the created choice, returning to `Idle`
    pub fn take_created(&mut self) -> Option<ChoiceRef> {
        match std::mem::take(&mut self.state) {
            CreateState::CreatedPendingSelection(choice) => Some(choice),
            other => {
                self.state = other;
                None
            }
        }
    }
}

impl std::fmt::Debug for CreateSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSupport")
            .field("affordance", &self.affordance)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rada_core::MessageCatalog;
    use serde_json::json;

    fn translator() -> Translator {
        Translator::new(Arc::new(MessageCatalog::english()))
    }

    fn with_callback<F>(f: F) -> CreateSupport
    where
        F: Fn(&str) -> CreateOutcome + Send + Sync + 'static,
    {
        CreateSupport::new(Some(CreateAffordance::callback(f)), translator())
    }

    #[test]
    fn test_create_item_label() {
        let create = with_callback(|_| CreateOutcome::Cancelled);
        let item = create.create_item("Paris");
        assert_eq!(item.get("id"), Some(&json!(DEFAULT_CREATE_VALUE)));
        assert_eq!(item.get("name"), Some(&json!("Create Paris")));
        assert!(create.is_create_item(&item));
        assert_eq!(create.synthetic_label(&item).as_deref(), Some("Create Paris"));
    }

    #[test]
    fn test_injection_rules() {
        let create = with_callback(|_| CreateOutcome::Cancelled);
        assert!(create.suggestion_item("", false).is_none());
        assert!(create.suggestion_item("Paris", true).is_none());
        assert!(create.suggestion_item("Pa", false).is_some());

        let labelled = with_callback(|_| CreateOutcome::Cancelled).create_label(Some("Add".into()));
        let item = labelled.suggestion_item("", false).unwrap();
        assert_eq!(item.get("name"), Some(&json!("Add")));

        let hinted = with_callback(|_| CreateOutcome::Cancelled)
            .create_hint_label(Some("Start typing to create".into()));
        let hint = hinted.suggestion_item("", false).unwrap();
        assert!(hinted.is_hint_item(&hint));

        let disabled = CreateSupport::new(None, translator()).create_label(Some("Add".into()));
        assert!(disabled.suggestion_item("", false).is_none());
        assert!(disabled.suggestion_item("x", false).is_none());
    }

    #[test]
    fn test_custom_keys() {
        let create = with_callback(|_| CreateOutcome::Cancelled).keys("foo.bar", "label");
        let item = create.create_item("x");
        assert_eq!(item.get("foo.bar"), Some(&json!(DEFAULT_CREATE_VALUE)));
        assert!(create.is_create_item(&item));
    }

    #[test]
    fn test_immediate_creation() {
        let mut create = with_callback(|filter| {
            CreateOutcome::Created(Choice::new(json!({ "id": "x", "name": filter })))
        });
        create.start("New").unwrap();
        let choice = create.take_created().unwrap();
        assert_eq!(choice.get("name"), Some(&json!("New")));
        assert!(matches!(create.state(), CreateState::Idle));
    }

    #[test]
    fn test_deferred_creation() {
        let sender = Arc::new(std::sync::Mutex::new(None));
        let slot = sender.clone();
        let mut create = with_callback(move |_| {
            let (tx, outcome) = CreateOutcome::deferred();
            *slot.lock().unwrap() = Some(tx);
            outcome
        });
        create.start("New").unwrap();
        assert!(create.is_creating());
        assert!(!create.poll_deferred());

        let tx = sender.lock().unwrap().take().unwrap();
        tx.send(Choice::new(json!({ "id": "x" }))).unwrap();
        assert!(create.poll_deferred());
        assert!(create.take_created().is_some());
    }

    #[test]
    fn test_dropped_sender_returns_to_idle() {
        let mut create = with_callback(|_| CreateOutcome::deferred().1);
        create.start("New").unwrap();
        assert!(!create.poll_deferred());
        assert!(matches!(create.state(), CreateState::Idle));
    }

    #[test]
    fn test_surface_round_trip() {
        let mut create = CreateSupport::new(Some(CreateAffordance::Surface), translator());
        assert_eq!(create.complete(Choice::new(json!({}))), Err(ChoiceError::NotCreating));
        create.start("Ne").unwrap();
        assert_eq!(create.request(), Some(&CreateRequest { filter: "Ne".into() }));
        create.cancel();
        assert!(create.request().is_none());

        create.start("New").unwrap();
        create.complete(Choice::new(json!({ "id": 9 }))).unwrap();
        assert_eq!(create.take_created().unwrap().get("id"), Some(&json!(9)));
    }

    #[test]
    fn test_no_handler() {
        let mut create = CreateSupport::new(None, translator());
        assert_eq!(create.start("x"), Err(ChoiceError::NoCreateHandler));
    }
}
