//! Form state
//!
//! A form owns one node per registered field, keyed by its `source` path in
//! the edited record. Inputs never touch the form directly: they go through a
//! [`FieldHandle`], the form-side implementation of the [`BoundField`]
//! contract (current value, change, blur, error, required flag).
//!
//! ```ignore
//! let form = FormState::shared(json!({ "gender": "F" }));
//! let field = FieldHandle::register(&form, "gender", FieldOptions::default().required());
//!
//! field.value();                // "F"
//! change_by_source(&form, "gender", json!("M"))?;  // external change
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::error::{CoreError, Result};
use crate::record::{get_path, set_path};

new_key_type! {
    /// Unique identifier for a registered field
    pub struct FieldId;
}

/// Validation function: returns an error message key when the value is invalid
pub type Validator = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Records that accompany a change, as selected by the input
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ChangeRecords {
    /// Cleared single-select input (reported as an empty string upstream)
    #[default]
    None,
    /// The record behind a single value
    One(Value),
    /// The records behind a multi-select value, in value order
    Many(Vec<Value>),
}

/// Listener notified after every change of a field
pub type ChangeListener = Arc<dyn Fn(&Value, &ChangeRecords) + Send + Sync>;

/// A listener call produced by a write, run once the form is unlocked
pub struct ChangeNotice {
    listener: ChangeListener,
    value: Value,
    records: ChangeRecords,
}

impl ChangeNotice {
    pub fn notify(self) {
        (self.listener)(&self.value, &self.records);
    }
}

impl std::fmt::Debug for ChangeNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotice")
            .field("value", &self.value)
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

/// Contract between an input and the form-state layer
pub trait BoundField: Send {
    /// Current value of the field
    fn value(&self) -> Value;
    /// Write a new value, along with the records it was picked from
    fn on_change(&mut self, value: Value, records: ChangeRecords);
    /// The input lost focus
    fn on_blur(&mut self);
    /// Validation error, only once the field was touched
    fn error(&self) -> Option<String>;
    fn is_required(&self) -> bool;
}

/// Message key returned by [`required`]
pub const REQUIRED_MESSAGE: &str = "ra.validation.required";

/// Validator rejecting empty strings, `null` and empty arrays
pub fn required() -> Validator {
    Arc::new(|value: &Value| {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        empty.then(|| REQUIRED_MESSAGE.to_string())
    })
}

/// Registration options for a field
#[derive(Clone, Default)]
pub struct FieldOptions {
    /// Value used when the record has nothing at `source`
    pub default_value: Option<Value>,
    pub validators: Vec<Validator>,
    pub is_required: bool,
    pub on_change: Option<ChangeListener>,
}

impl FieldOptions {
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Mark as required and add the [`required`] validator
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self.validators.push(required());
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &ChangeRecords) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }
}

/// Internal field storage
struct FieldNode {
    source: String,
    value: Value,
    initial: Value,
    validators: SmallVec<[Validator; 2]>,
    is_required: bool,
    on_change: Option<ChangeListener>,
    touched: bool,
    error: Option<String>,
    /// Bumped on every write, including writes of an equal value
    version: u64,
}

impl FieldNode {
    fn validate(&mut self) {
        self.error = self.validators.iter().find_map(|v| v(&self.value));
    }
}

/// State of one form
pub struct FormState {
    record: Value,
    fields: SlotMap<FieldId, FieldNode>,
    by_source: FxHashMap<String, FieldId>,
}

/// Shared form state for inputs holding handles
pub type SharedFormState = Arc<Mutex<FormState>>;

impl FormState {
    /// Create a form editing `record`
    pub fn new(record: Value) -> Self {
        Self {
            record,
            fields: SlotMap::with_key(),
            by_source: FxHashMap::default(),
        }
    }

    /// Create a form wrapped for sharing with field handles
    pub fn shared(record: Value) -> SharedFormState {
        Arc::new(Mutex::new(Self::new(record)))
    }

    /// Register a field; registering the same source twice returns the same id
    pub fn register(&mut self, source: &str, options: FieldOptions) -> FieldId {
        if let Some(&id) = self.by_source.get(source) {
            return id;
        }
        let initial = get_path(&self.record, source)
            .filter(|v| !v.is_null())
            .cloned()
            .or(options.default_value)
            .unwrap_or(Value::Null);
        let mut node = FieldNode {
            source: source.to_string(),
            value: initial.clone(),
            initial,
            validators: options.validators.into_iter().collect(),
            is_required: options.is_required,
            on_change: options.on_change,
            touched: false,
            error: None,
            version: 0,
        };
        node.validate();
        let id = self.fields.insert(node);
        self.by_source.insert(source.to_string(), id);
        id
    }

    pub fn field_id(&self, source: &str) -> Option<FieldId> {
        self.by_source.get(source).copied()
    }

    pub fn value(&self, id: FieldId) -> Option<&Value> {
        self.fields.get(id).map(|n| &n.value)
    }

    /// Write a value and run validators
    ///
    /// The field's change listener is not called here: the returned notice
    /// must be notified after the form lock is released.
    #[must_use]
    pub fn set_value(&mut self, id: FieldId, value: Value, records: ChangeRecords) -> Option<ChangeNotice> {
        let node = self.fields.get_mut(id)?;
        node.value = value;
        node.version += 1;
        node.validate();
        tracing::trace!(source = %node.source, version = node.version, "field changed");
        let listener = node.on_change.clone()?;
        Some(ChangeNotice {
            listener,
            value: node.value.clone(),
            records,
        })
    }

    /// Programmatic change addressed by source path
    #[must_use = "the change listener only runs when the notice is notified"]
    pub fn set_value_by_source(&mut self, source: &str, value: Value) -> Result<Option<ChangeNotice>> {
        let id = self
            .field_id(source)
            .ok_or_else(|| CoreError::UnknownField(source.to_string()))?;
        Ok(self.set_value(id, value, ChangeRecords::None))
    }

    pub fn touch(&mut self, id: FieldId) {
        if let Some(node) = self.fields.get_mut(id) {
            node.touched = true;
        }
    }

    pub fn is_touched(&self, id: FieldId) -> bool {
        self.fields.get(id).is_some_and(|n| n.touched)
    }

    /// Error message key, hidden until the field is touched
    pub fn error(&self, id: FieldId) -> Option<&str> {
        self.fields
            .get(id)
            .filter(|n| n.touched)
            .and_then(|n| n.error.as_deref())
    }

    pub fn is_required(&self, id: FieldId) -> bool {
        self.fields.get(id).is_some_and(|n| n.is_required)
    }

    pub fn version(&self, id: FieldId) -> Option<u64> {
        self.fields.get(id).map(|n| n.version)
    }

    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|n| n.error.is_none())
    }

    /// Restore every field to its initial value
    pub fn reset(&mut self) {
        for node in self.fields.values_mut() {
            node.value = node.initial.clone();
            node.touched = false;
            node.version += 1;
            node.validate();
        }
    }

    /// The edited record with every field value written back
    pub fn values(&self) -> Value {
        let mut out = match &self.record {
            Value::Object(_) => self.record.clone(),
            _ => Value::Object(Map::new()),
        };
        for node in self.fields.values() {
            set_path(&mut out, &node.source, node.value.clone());
        }
        out
    }
}

fn lock(form: &SharedFormState) -> MutexGuard<'_, FormState> {
    form.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Programmatic change of a shared form, notifying the listener unlocked
pub fn change_by_source(form: &SharedFormState, source: &str, value: Value) -> Result<()> {
    let notice = lock(form).set_value_by_source(source, value)?;
    if let Some(notice) = notice {
        notice.notify();
    }
    Ok(())
}

/// A field of a shared form, as seen by an input
#[derive(Clone)]
pub struct FieldHandle {
    form: SharedFormState,
    id: FieldId,
}

impl FieldHandle {
    /// Register `source` on the form and return its handle
    pub fn register(form: &SharedFormState, source: &str, options: FieldOptions) -> Self {
        let id = lock(form).register(source, options);
        Self {
            form: form.clone(),
            id,
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn is_touched(&self) -> bool {
        lock(&self.form).is_touched(self.id)
    }
}

impl BoundField for FieldHandle {
    fn value(&self) -> Value {
        lock(&self.form).value(self.id).cloned().unwrap_or(Value::Null)
    }

    fn on_change(&mut self, value: Value, records: ChangeRecords) {
        let notice = lock(&self.form).set_value(self.id, value, records);
        if let Some(notice) = notice {
            notice.notify();
        }
    }

    fn on_blur(&mut self) {
        lock(&self.form).touch(self.id);
    }

    fn error(&self) -> Option<String> {
        lock(&self.form).error(self.id).map(str::to_string)
    }

    fn is_required(&self) -> bool {
        lock(&self.form).is_required(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_reads_record_then_default() {
        let mut form = FormState::new(json!({ "author": { "id": 3 } }));
        let author = form.register("author.id", FieldOptions::default());
        let tags = form.register("tags", FieldOptions::default().default_value(json!([])));
        assert_eq!(form.value(author), Some(&json!(3)));
        assert_eq!(form.value(tags), Some(&json!([])));
        assert_eq!(form.register("tags", FieldOptions::default()), tags);
    }

    #[test]
    fn test_required_error_after_touch() {
        let form = FormState::shared(json!({}));
        let mut field = FieldHandle::register(&form, "gender", FieldOptions::default().required());
        assert!(field.is_required());
        assert_eq!(field.error(), None);

        field.on_blur();
        assert_eq!(field.error().as_deref(), Some(REQUIRED_MESSAGE));

        field.on_change(json!("F"), ChangeRecords::One(json!({ "id": "F" })));
        assert_eq!(field.error(), None);
        assert!(lock(&form).is_valid());
    }

    #[test]
    fn test_change_listener_receives_records() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let form = FormState::shared(json!({}));
        let mut field = FieldHandle::register(
            &form,
            "tags",
            FieldOptions::default().on_change(move |value, records| {
                seen_clone
                    .lock()
                    .unwrap()
                    .push((value.clone(), records.clone()));
            }),
        );
        field.on_change(json!(["a"]), ChangeRecords::Many(vec![json!({ "id": "a" })]));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(json!(["a"]), ChangeRecords::Many(vec![json!({ "id": "a" })]))]
        );
    }

    #[test]
    fn test_reset_and_values() {
        let form = FormState::shared(json!({ "title": "Hello", "meta": { "tag": "x" } }));
        let field = FieldHandle::register(&form, "meta.tag", FieldOptions::default());
        {
            let mut state = lock(&form);
            assert!(state.set_value_by_source("meta.tag", json!("y")).unwrap().is_none());
            assert_eq!(
                state.values(),
                json!({ "title": "Hello", "meta": { "tag": "y" } })
            );
            let before = state.version(field.id()).unwrap();
            state.reset();
            assert!(state.version(field.id()).unwrap() > before);
        }
        assert_eq!(field.value(), json!("x"));
        assert!(change_by_source(&form, "missing", json!(1)).is_err());
    }

    #[test]
    fn test_listener_runs_with_form_unlocked() {
        let form = FormState::shared(json!({ "gender": "F" }));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (form_clone, seen_clone) = (form.clone(), seen.clone());
        let mut field = FieldHandle::register(
            &form,
            "gender",
            FieldOptions::default().on_change(move |_, _| {
                let values = form_clone.try_lock().map(|state| state.values());
                seen_clone.lock().unwrap().push(values.ok());
            }),
        );

        field.on_change(json!("M"), ChangeRecords::One(json!({ "id": "M" })));
        change_by_source(&form, "gender", json!("F")).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some(json!({ "gender": "M" })), Some(json!({ "gender": "F" }))]
        );
    }
}
