//! Choice sources
//!
//! A source owns the collection an input picks from. [`InlineChoices`] is a
//! fixed list provided by the caller; [`ReferenceChoices`] pages through a
//! resource of the data provider and filters on the server.

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use rada_core::record::{get_path, value_key};
use rada_core::{
    AdminContext, DataProvider, DataProviderError, DataResult, Fetch, GetListParams, ListPage,
    Pagination, Record, Sort,
};

use crate::choice::{choices_from, ChoiceRef};

/// Contract between an input and the collection it picks from
pub trait ChoiceSource: Send {
    /// Current collection, appended choices included
    fn choices(&self) -> Vec<ChoiceRef>;

    /// A load is in flight or scheduled
    fn is_pending(&self) -> bool;

    /// Last load error
    fn error(&self) -> Option<String>;

    /// Replace the filter sent with the next load
    fn set_filters(&mut self, query: Value);

    /// Choices are fetched by reference and filtered remotely
    fn is_from_reference(&self) -> bool {
        false
    }

    /// Choices are a fixed list; filters are ignored
    fn is_inline(&self) -> bool {
        false
    }

    /// Resource name for reference sources
    fn resource(&self) -> Option<&str> {
        None
    }

    /// Add a newly created choice to the local collection
    fn append(&mut self, choice: ChoiceRef);

    /// The bound field value changed; load the records it points to
    fn track_value(&mut self, _value: &Value) {}

    /// Run scheduled loads
    fn poll(&mut self) {}
}

#[derive(Debug, Default)]
struct InlineState {
    choices: Vec<ChoiceRef>,
    pending: bool,
    error: Option<String>,
}

/// Caller-provided list of choices
///
/// Clones share the same list, so the embedding code keeps a handle to load
/// choices later or to observe appended ones.
#[derive(Clone, Debug, Default)]
pub struct InlineChoices {
    state: Arc<RwLock<InlineState>>,
}

impl InlineChoices {
    pub fn new(records: impl IntoIterator<Item = Value>) -> Self {
        let state = InlineState {
            choices: choices_from(records),
            ..InlineState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Empty list whose owner is still loading it
    pub fn pending() -> Self {
        let choices = Self::default();
        choices.set_pending(true);
        choices
    }

    /// Replace the list and clear the pending flag
    pub fn set_choices(&self, records: impl IntoIterator<Item = Value>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.choices = choices_from(records);
        state.pending = false;
    }

    pub fn set_pending(&self, pending: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).pending = pending;
    }

    pub fn set_error(&self, error: Option<String>) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).error = error;
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChoiceSource for InlineChoices {
    fn choices(&self) -> Vec<ChoiceRef> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).choices.clone()
    }

    fn is_pending(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).pending
    }

    fn error(&self) -> Option<String> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).error.clone()
    }

    fn set_filters(&mut self, _query: Value) {}

    fn is_inline(&self) -> bool {
        true
    }

    fn append(&mut self, choice: ChoiceRef) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .choices
            .push(choice);
    }
}

/// Paged lookup of a resource
///
/// Loads start and settle on [`poll`](ChoiceSource::poll); until a load
/// settles the previous collection is served. A filter change replaces the
/// load in flight, so a late answer for an older filter is never applied.
/// Besides the current page, the records behind the tracked field value are
/// fetched with `get_many` so the selection survives a filter that excludes
/// it.
pub struct ReferenceChoices {
    provider: Arc<dyn DataProvider>,
    resource: String,
    permanent_filter: Map<String, Value>,
    params: GetListParams,
    page: Vec<ChoiceRef>,
    total: usize,
    referenced: Vec<ChoiceRef>,
    tracked: Vec<Value>,
    appended: Vec<ChoiceRef>,
    list_stale: bool,
    referenced_stale: bool,
    list_fetch: Option<Fetch<ListPage>>,
    referenced_fetch: Option<Fetch<Vec<Record>>>,
    error: Option<DataProviderError>,
}

impl ReferenceChoices {
    pub fn new(ctx: &AdminContext, resource: impl Into<String>) -> Self {
        Self {
            provider: Arc::clone(ctx.data_provider()),
            resource: resource.into(),
            permanent_filter: Map::new(),
            params: GetListParams {
                filter: Value::Object(Map::new()),
                ..GetListParams::default()
            },
            page: Vec::new(),
            total: 0,
            referenced: Vec::new(),
            tracked: Vec::new(),
            appended: Vec::new(),
            list_stale: true,
            referenced_stale: false,
            list_fetch: None,
            referenced_fetch: None,
            error: None,
        }
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.params.pagination = Pagination { page: 1, per_page };
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.params.sort = sort;
        self
    }

    /// Filter applied to every load, on top of the typed query
    pub fn filter(mut self, filter: Value) -> Self {
        if let Value::Object(map) = filter {
            self.permanent_filter = map.clone();
            self.params.filter = Value::Object(map);
        }
        self
    }

    /// Total number of records matching the last load
    pub fn total(&self) -> usize {
        self.total
    }

    /// Parameters of the next list load
    pub fn params(&self) -> &GetListParams {
        &self.params
    }

    fn apply_page(&mut self, result: DataResult<ListPage>) {
        match result {
            Ok(page) => {
                debug!(resource = %self.resource, count = page.data.len(), total = page.total, "loaded choices");
                self.page = choices_from(page.data);
                self.total = page.total;
                self.error = None;
            }
            Err(error) => {
                warn!(resource = %self.resource, %error, "failed to load choices");
                self.error = Some(error);
            }
        }
    }

    fn apply_referenced(&mut self, result: DataResult<Vec<Record>>) {
        match result {
            Ok(records) => self.referenced = choices_from(records),
            Err(error) => {
                warn!(resource = %self.resource, %error, "failed to load referenced records");
                self.error = Some(error);
            }
        }
    }

    /// Tracked ids that the current page does not hold
    fn missing_ids(&self) -> Vec<Value> {
        let loaded: FxHashSet<String> = self.page.iter().filter_map(id_key).collect();
        self.tracked
            .iter()
            .filter(|id| !loaded.contains(&value_key(id)))
            .cloned()
            .collect()
    }
}

fn id_key(choice: &ChoiceRef) -> Option<String> {
    get_path(choice.record(), "id").map(value_key)
}

impl ChoiceSource for ReferenceChoices {
    fn choices(&self) -> Vec<ChoiceRef> {
        let mut seen = FxHashSet::default();
        self.page
            .iter()
            .chain(&self.referenced)
            .chain(&self.appended)
            .filter(|choice| id_key(choice).map_or(true, |id| seen.insert(id)))
            .cloned()
            .collect()
    }

    fn is_pending(&self) -> bool {
        self.list_stale
            || self.referenced_stale
            || self.list_fetch.is_some()
            || self.referenced_fetch.is_some()
    }

    fn error(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    fn set_filters(&mut self, query: Value) {
        let mut filter = match query {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in &self.permanent_filter {
            filter.insert(key.clone(), value.clone());
        }
        self.params.filter = Value::Object(filter);
        self.params.pagination.page = 1;
        self.list_stale = true;
    }

    fn is_from_reference(&self) -> bool {
        true
    }

    fn resource(&self) -> Option<&str> {
        Some(&self.resource)
    }

    fn append(&mut self, choice: ChoiceRef) {
        self.appended.push(choice);
    }

    fn track_value(&mut self, value: &Value) {
        let ids: Vec<Value> = match value {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            Value::String(s) if s.is_empty() => Vec::new(),
            other => vec![other.clone()],
        };
        if ids != self.tracked {
            self.tracked = ids;
            self.referenced_stale = true;
        }
    }

    fn poll(&mut self) {
        if self.list_stale {
            self.list_stale = false;
            if self.list_fetch.is_some() {
                debug!(resource = %self.resource, "superseding load in flight");
            }
            self.list_fetch = Some(self.provider.get_list(&self.resource, &self.params));
        }
        if let Some(fetch) = self.list_fetch.take() {
            match fetch.try_settle() {
                Ok(result) => {
                    self.apply_page(result);
                    self.referenced_stale = true;
                }
                Err(fetch) => self.list_fetch = Some(fetch),
            }
        }

        // the missing ids depend on the page, so wait for it
        if self.referenced_stale && self.list_fetch.is_none() {
            self.referenced_stale = false;
            let missing = self.missing_ids();
            if missing.is_empty() {
                self.referenced.clear();
                self.referenced_fetch = None;
            } else {
                self.referenced_fetch = Some(self.provider.get_many(&self.resource, &missing));
            }
        }
        if let Some(fetch) = self.referenced_fetch.take() {
            match fetch.try_settle() {
                Ok(result) => self.apply_referenced(result),
                Err(fetch) => self.referenced_fetch = Some(fetch),
            }
        }
    }
}

impl std::fmt::Debug for ReferenceChoices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceChoices")
            .field("resource", &self.resource)
            .field("params", &self.params)
            .field("loaded", &self.page.len())
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}
