//! Admin composition root
//!
//! [`AdminContext`] gathers the collaborators every view and input needs:
//! data provider, auth provider, translation, store, resource definitions and
//! configuration. It is built once and passed down explicitly; nothing in the
//! framework reaches for a global.
//!
//! | option          | default                                  |
//! |-----------------|------------------------------------------|
//! | `data_provider` | [`EmptyDataProvider`] (every list empty) |
//! | `auth_provider` | none (no authentication)                 |
//! | `i18n_provider` | [`MessageCatalog::english`]              |
//! | `store`         | a fresh [`MemoryStore`]                  |
//! | `config`        | [`AdminConfig::default`]                 |
//!
//! Legacy function-shaped providers are converted once, in the builder.

use std::sync::Arc;

use crate::auth::{convert_legacy_auth_provider, AuthProvider, LegacyAuthProvider};
use crate::config::AdminConfig;
use crate::data_provider::{
    convert_legacy_data_provider, DataProvider, EmptyDataProvider, LegacyDataProvider,
};
use crate::i18n::{I18nProvider, MessageCatalog, Translator};
use crate::resource::{RecordToString, ResourceDefinition, ResourceRegistry};
use crate::store::{MemoryStore, Store};

/// Shared runtime context
#[derive(Clone)]
pub struct AdminContext {
    data_provider: Arc<dyn DataProvider>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    translator: Translator,
    store: Arc<dyn Store>,
    resources: Arc<ResourceRegistry>,
    config: Arc<AdminConfig>,
}

impl AdminContext {
    pub fn builder() -> AdminContextBuilder {
        AdminContextBuilder::default()
    }

    pub fn data_provider(&self) -> &Arc<dyn DataProvider> {
        &self.data_provider
    }

    pub fn auth_provider(&self) -> Option<&Arc<dyn AuthProvider>> {
        self.auth_provider.as_ref()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Text projection for records of `resource`
    pub fn get_record_representation(&self, resource: &str) -> RecordToString {
        self.resources.get_record_representation(resource)
    }
}

impl Default for AdminContext {
    fn default() -> Self {
        AdminContextBuilder::default().build()
    }
}

impl std::fmt::Debug for AdminContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminContext")
            .field("has_auth", &self.auth_provider.is_some())
            .field("translator", &self.translator)
            .field("resources", &self.resources.names().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`AdminContext`]
#[derive(Default)]
pub struct AdminContextBuilder {
    data_provider: Option<Arc<dyn DataProvider>>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    i18n_provider: Option<Arc<dyn I18nProvider>>,
    store: Option<Arc<dyn Store>>,
    resources: ResourceRegistry,
    config: AdminConfig,
}

impl AdminContextBuilder {
    pub fn data_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.data_provider = Some(provider);
        self
    }

    /// Use a legacy `(verb, resource, params)` provider
    pub fn legacy_data_provider(mut self, provider: LegacyDataProvider) -> Self {
        self.data_provider = Some(convert_legacy_data_provider(provider));
        self
    }

    pub fn auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    /// Use a legacy `(verb, params)` auth provider
    pub fn legacy_auth_provider(mut self, provider: LegacyAuthProvider) -> Self {
        self.auth_provider = Some(convert_legacy_auth_provider(provider));
        self
    }

    pub fn i18n_provider(mut self, provider: Arc<dyn I18nProvider>) -> Self {
        self.i18n_provider = Some(provider);
        self
    }

    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn resource(mut self, definition: ResourceDefinition) -> Self {
        self.resources.register(definition);
        self
    }

    pub fn config(mut self, config: AdminConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AdminContext {
        let locale = self.config.locale.clone();
        let i18n_provider = self.i18n_provider.unwrap_or_else(|| {
            if locale != "en" {
                tracing::debug!(%locale, "no i18n provider configured, using English messages");
            }
            Arc::new(MessageCatalog::english())
        });
        AdminContext {
            data_provider: self
                .data_provider
                .unwrap_or_else(|| Arc::new(EmptyDataProvider)),
            auth_provider: self.auth_provider,
            translator: Translator::new(i18n_provider),
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            resources: Arc::new(self.resources),
            config: Arc::new(self.config),
        }
    }
}
