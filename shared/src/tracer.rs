use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// # TRACING INIT
///
/// Initializes the global `tracing` subscriber for a binary: a `fmt` layer
/// writing to stdout filtered by `RUST_LOG` (falling back to `info` for the
/// whole process if unset).
///
/// This should be the first thing a binary's `main` does, before any code
/// that calls into `tracing` macros runs.
///
/// # PANICS
///
/// panics if a global subscriber was already installed.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(service = service_name, "tracing initialized");
}
