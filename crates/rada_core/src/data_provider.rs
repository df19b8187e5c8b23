//! Data provider contract
//!
//! The data provider is the only collaborator that talks to a backend. The
//! framework calls it with a resource name and typed parameters; the shipped
//! [`MemoryDataProvider`] answers from in-memory collections and the legacy
//! single-function shape is normalized once by [`convert_legacy_data_provider`].
//!
//! Calls never block the caller. Each returns a [`Fetch`] that is either
//! settled already or completes later through a oneshot channel; callers
//! check it with [`Fetch::try_settle`] on their next poll.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::error::DataProviderError;
use crate::record::{get_path, value_key, Record};

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: "id".to_string(),
            order: SortOrder::Asc,
        }
    }
}

/// Pagination parameters (1-based page)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

/// Parameters of a `get_list` call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GetListParams {
    pub pagination: Pagination,
    pub sort: Sort,
    /// Filter object, `{"q": "..."}` for full-text search
    pub filter: Value,
}

/// One page of records
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    pub data: Vec<Record>,
    pub total: usize,
}

pub type DataResult<T> = std::result::Result<T, DataProviderError>;

/// Response of a provider call
#[derive(Debug)]
pub enum Fetch<T> {
    /// Answered synchronously
    Ready(DataResult<T>),
    /// In flight; the provider sends the result when the backend answers
    Pending(oneshot::Receiver<DataResult<T>>),
}

impl<T> Fetch<T> {
    /// A pending fetch and the sender that settles it
    pub fn deferred() -> (oneshot::Sender<DataResult<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::Pending(rx))
    }

    /// Take the result if the fetch has settled, or get the fetch back
    ///
    /// A provider that drops the sender settles the fetch as a request error.
    pub fn try_settle(self) -> std::result::Result<DataResult<T>, Self> {
        match self {
            Self::Ready(result) => Ok(result),
            Self::Pending(mut rx) => match rx.try_recv() {
                Ok(result) => Ok(result),
                Err(TryRecvError::Empty) => Err(Self::Pending(rx)),
                Err(TryRecvError::Closed) => Ok(Err(DataProviderError::Request(
                    "provider dropped the request".into(),
                ))),
            },
        }
    }

    /// The result, if already settled
    pub fn ready(self) -> Option<DataResult<T>> {
        self.try_settle().ok()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl<T> From<DataResult<T>> for Fetch<T> {
    fn from(result: DataResult<T>) -> Self {
        Self::Ready(result)
    }
}

/// Provider contract
pub trait DataProvider: Send + Sync {
    /// Fetch a filtered, sorted page of records
    fn get_list(&self, resource: &str, params: &GetListParams) -> Fetch<ListPage>;

    /// Fetch records by id, in no particular order; unknown ids are skipped
    fn get_many(&self, resource: &str, ids: &[Value]) -> Fetch<Vec<Record>>;

    /// Create a record and return it with its id
    fn create(&self, resource: &str, data: Record) -> Fetch<Record>;
}

/// Provider used when none is configured: every list is empty
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyDataProvider;

impl DataProvider for EmptyDataProvider {
    fn get_list(&self, _resource: &str, _params: &GetListParams) -> Fetch<ListPage> {
        Ok(ListPage::default()).into()
    }

    fn get_many(&self, _resource: &str, _ids: &[Value]) -> Fetch<Vec<Record>> {
        Ok(Vec::new()).into()
    }

    fn create(&self, resource: &str, _data: Record) -> Fetch<Record> {
        Err(DataProviderError::Unsupported(format!("create on {resource}"))).into()
    }
}

/// In-memory provider with full-text `q` search, field filters and paging
#[derive(Debug, Default)]
pub struct MemoryDataProvider {
    collections: RwLock<IndexMap<String, Vec<Record>>>,
}

impl MemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource with its records
    pub fn with_resource(self, resource: impl Into<String>, records: Vec<Record>) -> Self {
        if let Ok(mut collections) = self.collections.write() {
            collections.insert(resource.into(), records);
        }
        self
    }

    fn matches(record: &Record, filter: &Value) -> bool {
        let Value::Object(filter) = filter else {
            return true;
        };
        filter.iter().all(|(key, expected)| {
            if key == "q" {
                let needle = value_key(expected).to_lowercase();
                return needle.is_empty() || record_contains(record, &needle);
            }
            match get_path(record, key) {
                Some(actual) => value_key(actual) == value_key(expected),
                None => false,
            }
        })
    }
}

fn record_contains(record: &Record, needle: &str) -> bool {
    match record {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Object(map) => map.values().any(|v| record_contains(v, needle)),
        Value::Array(items) => items.iter().any(|v| record_contains(v, needle)),
        _ => false,
    }
}

fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => {
            let x = a.map(value_key).unwrap_or_default();
            let y = b.map(value_key).unwrap_or_default();
            x.cmp(&y)
        }
    }
}

impl MemoryDataProvider {
    fn list(&self, resource: &str, params: &GetListParams) -> DataResult<ListPage> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DataProviderError::Request("collection lock poisoned".into()))?;
        let records = collections
            .get(resource)
            .ok_or_else(|| DataProviderError::UnknownResource(resource.to_string()))?;

        let mut matching: Vec<Record> = records
            .iter()
            .filter(|r| Self::matches(r, &params.filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare_for_sort(
                get_path(a, &params.sort.field),
                get_path(b, &params.sort.field),
            );
            match params.sort.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len();
        let per_page = params.pagination.per_page.max(1);
        let start = params.pagination.page.saturating_sub(1) * per_page;
        let data = matching.into_iter().skip(start).take(per_page).collect();
        Ok(ListPage { data, total })
    }

    fn many(&self, resource: &str, ids: &[Value]) -> DataResult<Vec<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DataProviderError::Request("collection lock poisoned".into()))?;
        let records = collections
            .get(resource)
            .ok_or_else(|| DataProviderError::UnknownResource(resource.to_string()))?;
        let wanted: Vec<String> = ids.iter().map(value_key).collect();
        Ok(records
            .iter()
            .filter(|r| {
                get_path(r, "id").is_some_and(|id| wanted.contains(&value_key(id)))
            })
            .cloned()
            .collect())
    }

    fn insert(&self, resource: &str, mut data: Record) -> DataResult<Record> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| DataProviderError::Request("collection lock poisoned".into()))?;
        let records = collections.entry(resource.to_string()).or_default();
        if get_path(&data, "id").is_none() {
            let next_id = records
                .iter()
                .filter_map(|r| get_path(r, "id").and_then(Value::as_i64))
                .max()
                .map_or(1, |max| max + 1);
            if let Value::Object(map) = &mut data {
                map.insert("id".to_string(), json!(next_id));
            } else {
                return Err(DataProviderError::Malformed("record must be an object".into()));
            }
        }
        records.push(data.clone());
        Ok(data)
    }
}

impl DataProvider for MemoryDataProvider {
    fn get_list(&self, resource: &str, params: &GetListParams) -> Fetch<ListPage> {
        self.list(resource, params).into()
    }

    fn get_many(&self, resource: &str, ids: &[Value]) -> Fetch<Vec<Record>> {
        self.many(resource, ids).into()
    }

    fn create(&self, resource: &str, data: Record) -> Fetch<Record> {
        self.insert(resource, data).into()
    }
}

/// Legacy single-function provider: `(verb, resource, params) -> response`
///
/// Verbs are `GET_LIST`, `GET_MANY` and `CREATE`; responses carry a `data`
/// field and, for lists, a `total`.
pub type LegacyDataProvider =
    Arc<dyn Fn(&str, &str, Value) -> DataResult<Value> + Send + Sync>;

struct LegacyDataProviderAdapter {
    call: LegacyDataProvider,
}

impl LegacyDataProviderAdapter {
    fn data(response: &Value, verb: &str) -> DataResult<Value> {
        response
            .get("data")
            .cloned()
            .ok_or_else(|| DataProviderError::Malformed(format!("{verb} response has no data")))
    }

    fn records(response: &Value, verb: &str) -> DataResult<Vec<Record>> {
        match Self::data(response, verb)? {
            Value::Array(items) => Ok(items),
            _ => Err(DataProviderError::Malformed(format!(
                "{verb} response data is not an array"
            ))),
        }
    }
}

impl LegacyDataProviderAdapter {
    fn list(&self, resource: &str, params: &GetListParams) -> DataResult<ListPage> {
        let payload = serde_json::to_value(params)
            .map_err(|e| DataProviderError::Malformed(e.to_string()))?;
        let response = (self.call)("GET_LIST", resource, payload)?;
        let data = Self::records(&response, "GET_LIST")?;
        let total = response
            .get("total")
            .and_then(Value::as_u64)
            .map_or(data.len(), |t| t as usize);
        Ok(ListPage { data, total })
    }

    fn many(&self, resource: &str, ids: &[Value]) -> DataResult<Vec<Record>> {
        let response = (self.call)("GET_MANY", resource, json!({ "ids": ids }))?;
        Self::records(&response, "GET_MANY")
    }

    fn insert(&self, resource: &str, data: Record) -> DataResult<Record> {
        let response = (self.call)("CREATE", resource, json!({ "data": data }))?;
        Self::data(&response, "CREATE")
    }
}

impl DataProvider for LegacyDataProviderAdapter {
    fn get_list(&self, resource: &str, params: &GetListParams) -> Fetch<ListPage> {
        self.list(resource, params).into()
    }

    fn get_many(&self, resource: &str, ids: &[Value]) -> Fetch<Vec<Record>> {
        self.many(resource, ids).into()
    }

    fn create(&self, resource: &str, data: Record) -> Fetch<Record> {
        self.insert(resource, data).into()
    }
}

/// Normalize a legacy function provider into the canonical interface
pub fn convert_legacy_data_provider(call: LegacyDataProvider) -> Arc<dyn DataProvider> {
    Arc::new(LegacyDataProviderAdapter { call })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled<T>(fetch: Fetch<T>) -> DataResult<T> {
        fetch.ready().expect("memory providers answer synchronously")
    }

    fn provider() -> MemoryDataProvider {
        MemoryDataProvider::new().with_resource(
            "tags",
            vec![
                json!({ "id": 1, "name": "Rust" }),
                json!({ "id": 2, "name": "Ruby" }),
                json!({ "id": 3, "name": "Go", "published": true }),
            ],
        )
    }

    #[test]
    fn test_get_list_full_text() {
        let params = GetListParams {
            filter: json!({ "q": "ru" }),
            ..Default::default()
        };
        let page = settled(provider().get_list("tags", &params)).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0]["name"], "Rust");
    }

    #[test]
    fn test_get_list_field_filter_sort_and_page() {
        let params = GetListParams {
            filter: json!({ "published": true }),
            ..Default::default()
        };
        let page = settled(provider().get_list("tags", &params)).unwrap();
        assert_eq!(page.total, 1);

        let params = GetListParams {
            pagination: Pagination { page: 2, per_page: 2 },
            sort: Sort {
                field: "name".into(),
                order: SortOrder::Desc,
            },
            filter: Value::Null,
        };
        let page = settled(provider().get_list("tags", &params)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data, vec![json!({ "id": 3, "name": "Go", "published": true })]);
    }

    #[test]
    fn test_unknown_resource() {
        let err = settled(provider().get_list("posts", &GetListParams::default())).unwrap_err();
        assert_eq!(err, DataProviderError::UnknownResource("posts".into()));
    }

    #[test]
    fn test_get_many_and_create() {
        let provider = provider();
        let records = settled(provider.get_many("tags", &[json!("2"), json!(9)])).unwrap();
        assert_eq!(records.len(), 1);

        let created = settled(provider.create("tags", json!({ "name": "Zig" }))).unwrap();
        assert_eq!(created["id"], 4);
    }

    #[test]
    fn test_legacy_provider_is_normalized() {
        let legacy: LegacyDataProvider = Arc::new(|verb: &str, resource: &str, params: Value| match verb {
            "GET_LIST" => {
                assert_eq!(resource, "tags");
                assert_eq!(params["filter"]["q"], "x");
                Ok(json!({ "data": [{ "id": 1 }], "total": 10 }))
            }
            "CREATE" => Ok(json!({ "data": { "id": 5, "name": params["data"]["name"] } })),
            other => Err(DataProviderError::Unsupported(other.to_string())),
        });
        let provider = convert_legacy_data_provider(legacy);

        let params = GetListParams {
            filter: json!({ "q": "x" }),
            ..Default::default()
        };
        let page = settled(provider.get_list("tags", &params)).unwrap();
        assert_eq!(page.total, 10);
        assert_eq!(page.data.len(), 1);

        let created = settled(provider.create("tags", json!({ "name": "n" }))).unwrap();
        assert_eq!(created, json!({ "id": 5, "name": "n" }));

        assert!(matches!(
            settled(provider.get_many("tags", &[])),
            Err(DataProviderError::Unsupported(_))
        ));
    }

    #[test]
    fn test_deferred_fetch_settles_later() {
        let (tx, fetch) = Fetch::<ListPage>::deferred();
        assert!(fetch.is_pending());
        let fetch = fetch.try_settle().unwrap_err();

        tx.send(Ok(ListPage { data: vec![json!({ "id": 1 })], total: 1 })).unwrap();
        let page = fetch.try_settle().unwrap().unwrap();
        assert_eq!(page.total, 1);

        let (tx, fetch) = Fetch::<ListPage>::deferred();
        drop(tx);
        assert!(matches!(fetch.ready(), Some(Err(DataProviderError::Request(_)))));
    }
}
