//! Rada Core Runtime
//!
//! This crate provides the collaborators every Rada admin is composed from:
//!
//! - **Records**: JSON records addressed through dotted paths
//! - **Data Provider**: the only bridge to a backend, plus a legacy adapter
//! - **Auth Provider**: login/logout/permission checks, plus a legacy adapter
//! - **I18n**: message catalogs with `%{param}` interpolation and literal fallbacks
//! - **Store**: key/value preferences with subscriptions
//! - **Form State**: field values, validation and the `BoundField` contract inputs use
//! - **Admin Context**: the explicit composition root holding all of the above
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rada_core::{AdminContext, MemoryDataProvider, ResourceDefinition, RecordRepresentation};
//! use serde_json::json;
//!
//! let provider = MemoryDataProvider::new()
//!     .with_resource("authors", vec![json!({ "id": 1, "name": "Leo" })]);
//!
//! let ctx = AdminContext::builder()
//!     .data_provider(Arc::new(provider))
//!     .resource(
//!         ResourceDefinition::new("authors")
//!             .record_representation(RecordRepresentation::Field("name".into())),
//!     )
//!     .build();
//!
//! let represent = ctx.get_record_representation("authors");
//! assert_eq!(represent(&json!({ "id": 1, "name": "Leo" })), "Leo");
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod data_provider;
pub mod error;
pub mod form;
pub mod i18n;
pub mod logging;
pub mod record;
pub mod resource;
pub mod store;

pub use auth::{convert_legacy_auth_provider, AuthProvider, LegacyAuthProvider};
pub use config::{AdminConfig, InputDefaults};
pub use context::{AdminContext, AdminContextBuilder};
pub use data_provider::{
    convert_legacy_data_provider, DataProvider, DataResult, EmptyDataProvider, Fetch,
    GetListParams, LegacyDataProvider, ListPage, MemoryDataProvider, Pagination, Sort, SortOrder,
};
pub use error::{AuthError, CoreError, DataProviderError, Result};
pub use form::{
    change_by_source, required, BoundField, ChangeNotice, ChangeRecords, FieldHandle, FieldId,
    FieldOptions, FormState, SharedFormState, Validator,
};
pub use i18n::{I18nProvider, MessageCatalog, TranslateOptions, Translator};
pub use record::{get_path, set_path, value_key, Record};
pub use resource::{RecordRepresentation, RecordToString, ResourceDefinition, ResourceRegistry};
pub use store::{MemoryStore, Store, SubscriptionHandle};
