//! Admin configuration
//!
//! Defaults for every input option live here, in one explicitly constructed
//! object owned by the composition root. Configuration can be written in TOML:
//!
//! ```toml
//! locale = "fr"
//!
//! [inputs]
//! debounce_ms = 400
//! suggestion_limit = 20
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Defaults applied to choice inputs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDefaults {
    /// Quiet period before a typed filter reaches the choice source
    pub debounce_ms: u64,
    /// Delay before a pending source is reported as loading
    pub loading_delay_ms: u64,
    /// Restore the selection text when a single-select input loses focus
    pub clear_on_blur: bool,
    /// Value written when a single-select input is cleared
    pub empty_value: serde_json::Value,
    /// Id of the synthetic "create" choice
    pub create_value: String,
    /// Id of the disabled "create" hint choice
    pub create_hint_value: String,
    /// Translation key of the "create <item>" label
    pub create_item_label: String,
    /// Maximum number of suggestions, unbounded when absent
    pub suggestion_limit: Option<usize>,
    /// Record path flagging a choice as disabled
    pub disable_value: String,
}

impl Default for InputDefaults {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            loading_delay_ms: 1000,
            clear_on_blur: true,
            empty_value: serde_json::Value::String(String::new()),
            create_value: "@@ra-create".to_string(),
            create_hint_value: "@@ra-create-hint".to_string(),
            create_item_label: "ra.action.create_item".to_string(),
            suggestion_limit: None,
            disable_value: "disabled".to_string(),
        }
    }
}

impl InputDefaults {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }
}

/// Top-level admin configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Application title
    pub title: String,
    /// Initial locale
    pub locale: String,
    /// Router base path
    pub basename: String,
    pub inputs: InputDefaults,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            title: "Rada Admin".to_string(),
            locale: "en".to_string(),
            basename: String::new(),
            inputs: InputDefaults::default(),
        }
    }
}

impl AdminConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
