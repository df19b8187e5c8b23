//! Auth provider contract and the legacy function adapter

use std::sync::Arc;

use serde_json::Value;

use crate::error::AuthError;

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Provider contract
pub trait AuthProvider: Send + Sync {
    fn login(&self, params: Value) -> AuthResult<()>;
    fn logout(&self) -> AuthResult<()>;
    fn check_auth(&self) -> AuthResult<()>;
    /// Decide whether a data provider error should log the user out
    fn check_error(&self, error: &Value) -> AuthResult<()>;
    fn get_permissions(&self) -> AuthResult<Value>;
}

/// Legacy single-function shape: `(verb, params) -> response`
///
/// Verbs are `AUTH_LOGIN`, `AUTH_LOGOUT`, `AUTH_CHECK`, `AUTH_ERROR` and
/// `AUTH_GET_PERMISSIONS`.
pub type LegacyAuthProvider = Arc<dyn Fn(&str, Value) -> AuthResult<Value> + Send + Sync>;

struct LegacyAuthProviderAdapter {
    call: LegacyAuthProvider,
}

impl AuthProvider for LegacyAuthProviderAdapter {
    fn login(&self, params: Value) -> AuthResult<()> {
        (self.call)("AUTH_LOGIN", params).map(|_| ())
    }

    fn logout(&self) -> AuthResult<()> {
        (self.call)("AUTH_LOGOUT", Value::Null).map(|_| ())
    }

    fn check_auth(&self) -> AuthResult<()> {
        (self.call)("AUTH_CHECK", Value::Null).map(|_| ())
    }

    fn check_error(&self, error: &Value) -> AuthResult<()> {
        (self.call)("AUTH_ERROR", error.clone()).map(|_| ())
    }

    fn get_permissions(&self) -> AuthResult<Value> {
        (self.call)("AUTH_GET_PERMISSIONS", Value::Null)
    }
}

/// Normalize a legacy function provider into the canonical interface
pub fn convert_legacy_auth_provider(call: LegacyAuthProvider) -> Arc<dyn AuthProvider> {
    Arc::new(LegacyAuthProviderAdapter { call })
}
