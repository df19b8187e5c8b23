//! Debounced filter dispatch
//!
//! Typing pushes the filter text into a [`FilterDebouncer`]; the text reaches
//! the choice source only once the input has been quiet for the whole window.
//! The debouncer holds no timer: the event loop drives it with
//! [`poll`](FilterDebouncer::poll).

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::source::ChoiceSource;

/// Default quiet period before a typed filter is sent
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Caller override receiving the raw filter text
pub type SetFilterFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Turns filter text into the query sent to a remote source
pub type FilterToQueryFn = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// `{"q": text}`
pub fn default_filter_to_query() -> FilterToQueryFn {
    Arc::new(|text: &str| json!({ "q": text }))
}

#[derive(Clone, Debug)]
struct PendingFilter {
    text: String,
    deadline: Instant,
}

/// Trailing-edge debouncer for filter text
#[derive(Clone, Debug)]
pub struct FilterDebouncer {
    window: Duration,
    pending: Option<PendingFilter>,
}

impl FilterDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `text`, superseding any pending text and restarting the window
    pub fn push(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        trace!(%text, "filter scheduled");
        self.pending = Some(PendingFilter {
            text,
            deadline: now + self.window,
        });
    }

    /// Text whose window has elapsed at `now`
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take().map(|p| p.text),
            _ => None,
        }
    }

    /// Drop the pending text, returning it
    pub fn cancel(&mut self) -> Option<String> {
        self.pending.take().map(|p| p.text)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending text fires
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }
}

impl Default for FilterDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

/// Where filter text goes once debounced
///
/// A caller `set_filter` takes precedence. Otherwise inline sources ignore
/// the text and remote sources receive `filter_to_query(text)`.
#[derive(Clone)]
pub struct FilterDispatch {
    set_filter: Option<SetFilterFn>,
    filter_to_query: FilterToQueryFn,
}

impl FilterDispatch {
    pub fn new(set_filter: Option<SetFilterFn>, filter_to_query: FilterToQueryFn) -> Self {
        Self {
            set_filter,
            filter_to_query,
        }
    }

    pub fn dispatch(&self, text: &str, source: &mut dyn ChoiceSource) {
        if let Some(set_filter) = &self.set_filter {
            debug!(%text, "filter sent to caller");
            set_filter(text);
            return;
        }
        if source.is_inline() {
            return;
        }
        let query = (self.filter_to_query)(text);
        debug!(%text, %query, "filter sent to source");
        source.set_filters(query);
    }
}

impl Default for FilterDispatch {
    fn default() -> Self {
        Self::new(None, default_filter_to_query())
    }
}

impl std::fmt::Debug for FilterDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterDispatch")
            .field("set_filter", &self.set_filter.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::ChoiceRef;
    use crate::source::InlineChoices;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        queries: Vec<Value>,
    }

    impl ChoiceSource for RecordingSource {
        fn choices(&self) -> Vec<ChoiceRef> {
            Vec::new()
        }
        fn is_pending(&self) -> bool {
            false
        }
        fn error(&self) -> Option<String> {
            None
        }
        fn set_filters(&mut self, query: Value) {
            self.queries.push(query);
        }
        fn append(&mut self, _choice: ChoiceRef) {}
    }

    #[test]
    fn test_trailing_edge() {
        let start = Instant::now();
        let mut debouncer = FilterDebouncer::default();
        debouncer.push("a", start);
        debouncer.push("ab", start + Duration::from_millis(100));
        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(350)),
            Some("ab".to_string())
        );
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = FilterDebouncer::new(Duration::from_millis(10));
        debouncer.push("x", start);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.cancel(), Some("x".to_string()));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_dispatch_to_remote_source() {
        let mut source = RecordingSource::default();
        FilterDispatch::default().dispatch("par", &mut source);
        assert_eq!(source.queries, vec![json!({ "q": "par" })]);

        let custom = FilterDispatch::new(None, Arc::new(|text: &str| json!({ "title_like": text })));
        custom.dispatch("x", &mut source);
        assert_eq!(source.queries[1], json!({ "title_like": "x" }));
    }

    #[test]
    fn test_caller_set_filter_wins() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let dispatch = FilterDispatch::new(
            Some(Arc::new(move |text: &str| sink.lock().unwrap().push(text.to_string()))),
            default_filter_to_query(),
        );
        let mut source = RecordingSource::default();
        dispatch.dispatch("abc", &mut source);
        assert!(source.queries.is_empty());
        assert_eq!(*seen.lock().unwrap(), vec!["abc".to_string()]);
    }

    #[test]
    fn test_inline_source_ignores_filter() {
        let mut source = InlineChoices::new([json!({ "id": 1 })]);
        FilterDispatch::default().dispatch("zzz", &mut source);
        assert_eq!(source.choices().len(), 1);
    }
}
