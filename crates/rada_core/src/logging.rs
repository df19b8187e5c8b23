//! Tracing setup for applications embedding the admin

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber honoring `RUST_LOG`
///
/// Falls back to `default_directive` (e.g. `"rada=info"`) when `RUST_LOG` is
/// unset. Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
