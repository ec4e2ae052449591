//! Tracing subscriber bootstrap.
//!
//! Verbosity comes from `RUST_LOG` when set, otherwise from the configured
//! `log_level`.  All `log::` call sites are forwarded into the tracing
//! pipeline via `LogTracer`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_lowercase()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    tracing_log::LogTracer::init().ok();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "famulus starting");
}
