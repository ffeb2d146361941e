//! Logging setup.
//!
//! Events go through `tracing` to a formatted stderr subscriber. The level
//! is taken from `RUST_LOG`, defaulting to [`DEFAULT_FILTER`]. Panics are
//! reported as error events before the default hook runs, so a crash in
//! the checker task is visible in the same log as everything else.

use std::panic;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "todo_reminder=info";

/// Install the global subscriber and the panic hook.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok();
    if installed {
        install_panic_hook();
    }
}

/// Install a panic hook that logs panics as error events.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let location = format_panic_location(info.location());
        let payload = panic_payload(info.payload());
        tracing::error!(%location, "panic: {payload}");

        original_hook(info);
    }));

    tracing::debug!("panic hook installed");
}

/// Format a panic location for logging.
fn format_panic_location(location: Option<&panic::Location<'_>>) -> String {
    location.map_or_else(
        || "unknown".to_string(),
        |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
    )
}

fn panic_payload(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
