//! Error types for rada_core

use thiserror::Error;

/// Errors raised by data providers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataProviderError {
    /// The requested resource is not known to the provider
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// The provider does not implement this verb
    #[error("Unsupported data provider method: {0}")]
    Unsupported(String),

    /// The provider returned a payload of the wrong shape
    #[error("Malformed data provider response: {0}")]
    Malformed(String),

    /// Transport or backend failure
    #[error("Data provider request failed: {0}")]
    Request(String),
}

/// Errors raised by auth providers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Credentials rejected or session expired
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated but not allowed
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Any other provider failure
    #[error("Auth provider error: {0}")]
    Other(String),
}

/// Errors that can occur while composing the admin runtime
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A field was looked up that was never registered
    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error(transparent)]
    DataProvider(#[from] DataProviderError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type for rada_core operations
pub type Result<T> = std::result::Result<T, CoreError>;
