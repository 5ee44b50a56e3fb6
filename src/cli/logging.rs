//! Diagnostic tracing
//!
//! Reads `RUST_LOG`, defaulting to `warn`. `--debug` raises this crate to
//! `debug` unless `RUST_LOG` is set. Output goes to stderr so it never mixes
//! with the status table.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber
pub fn init(debug: bool) {
    let default = if debug { "warn,git_stack=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .compact(),
        )
        .init();
}
