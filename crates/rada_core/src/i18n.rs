//! Translation layer
//!
//! Messages are looked up by key and interpolated with `%{name}` parameters.
//! When a key has no translation the `_` option is used as a literal fallback,
//! and when that is missing too the key itself is returned:
//!
//! ```ignore
//! let translator = ctx.translator();
//! translator.translate("ra.action.create_item", &TranslateOptions::fallback("Create").param("item", "Paris"));
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Parameters passed along with a translation key
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslateOptions {
    /// Literal returned when the key has no translation (the `_` option)
    pub fallback: Option<String>,
    /// Interpolation parameters
    pub params: FxHashMap<String, String>,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options whose fallback is the given literal
    pub fn fallback(literal: impl Into<String>) -> Self {
        Self {
            fallback: Some(literal.into()),
            params: FxHashMap::default(),
        }
    }

    /// Add an interpolation parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Provider contract for the translation layer
pub trait I18nProvider: Send + Sync {
    /// Translate a key, falling back to the `_` literal then to the key
    fn translate(&self, key: &str, options: &TranslateOptions) -> String;

    /// Active locale
    fn locale(&self) -> &str;
}

/// Cheap handle to the active translation provider
#[derive(Clone)]
pub struct Translator {
    provider: Arc<dyn I18nProvider>,
}

impl Translator {
    pub fn new(provider: Arc<dyn I18nProvider>) -> Self {
        Self { provider }
    }

    /// Translate with explicit options
    pub fn translate(&self, key: &str, options: &TranslateOptions) -> String {
        self.provider.translate(key, options)
    }

    /// Translate, using the key itself as the literal fallback
    pub fn translate_or_literal(&self, key: &str) -> String {
        self.provider.translate(key, &TranslateOptions::fallback(key))
    }

    pub fn locale(&self) -> &str {
        self.provider.locale()
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("locale", &self.provider.locale())
            .finish()
    }
}

/// In-memory message catalog
#[derive(Clone, Debug)]
pub struct MessageCatalog {
    locale: String,
    messages: FxHashMap<String, String>,
}

impl MessageCatalog {
    /// Empty catalog for a locale
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            messages: FxHashMap::default(),
        }
    }

    /// English catalog with the framework messages
    pub fn english() -> Self {
        let mut catalog = Self::new("en");
        for (key, message) in DEFAULT_ENGLISH_MESSAGES {
            catalog.messages.insert(key.to_string(), message.to_string());
        }
        catalog
    }

    /// Add or override a message
    pub fn with_message(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }

    /// Number of known messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl I18nProvider for MessageCatalog {
    fn translate(&self, key: &str, options: &TranslateOptions) -> String {
        let template = match self.messages.get(key) {
            Some(message) => message.as_str(),
            None => options.fallback.as_deref().unwrap_or(key),
        };
        interpolate(template, &options.params)
    }

    fn locale(&self) -> &str {
        &self.locale
    }
}

/// Replace `%{name}` placeholders; unknown placeholders are left untouched
pub fn interpolate(template: &str, params: &FxHashMap<String, String>) -> String {
    if params.is_empty() || !template.contains("%{") {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("%{");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

const DEFAULT_ENGLISH_MESSAGES: &[(&str, &str)] = &[
    ("ra.action.create", "Create"),
    ("ra.action.create_item", "Create %{item}"),
    ("ra.action.clear_input_value", "Clear value"),
    ("ra.action.open", "Open"),
    ("ra.action.close", "Close"),
    ("ra.action.cancel", "Cancel"),
    ("ra.navigation.no_results", "No results found"),
    ("ra.validation.required", "Required"),
];
