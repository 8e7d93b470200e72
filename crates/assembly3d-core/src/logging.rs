//! Logging and tracing setup for Assembly3D
//!
//! Structured logging goes through the `tracing` crate. Initialization is
//! idempotent: only the first call installs a subscriber.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the default tracing subscriber
pub fn init_default() {
    init_with_config(&LoggingConfig::default());
}

/// Initialize tracing from the logging section of the export config
///
/// `RUST_LOG` takes precedence over `config.level`.
pub fn init_with_config(config: &LoggingConfig) {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_ok()
    {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));

        let fmt_layer = fmt::layer().with_target(config.show_target);

        // A host may already have installed a global subscriber.
        let _ = tracing_subscriber::registry()
            .with(fmt_layer)
            .with(filter)
            .try_init();
    }
}

/// Whether a subscriber has been installed through this module
pub fn is_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::SeqCst)
}

/// Run `f` inside an `export` span and log how long it took
pub fn timed<T, F>(name: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let span = tracing::info_span!("export", step = %name);
    let _guard = span.enter();

    let start = std::time::Instant::now();
    let result = f();
    let duration = start.elapsed();

    tracing::debug!(duration_ms = %duration.as_millis(), "Step complete");

    result
}
