//! Logging setup for applications embedding Freo.
//!
//! Freo only emits `tracing` events. Installing a subscriber is the
//! application's call; [`init`] is a reasonable default.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a formatted stderr subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init() -> bool {
    init_with(DEFAULT_FILTER)
}

/// Like [`init`], with `fallback` as the filter when `RUST_LOG` is unset.
pub fn init_with(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let _ = init();
        assert!(!init(), "second install must be refused");
    }
}
