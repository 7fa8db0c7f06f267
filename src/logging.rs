//! Logging init for the binary. The library only emits `tracing` events.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Directive used when `RUST_LOG` is not set.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "plugin_web=info,warn",
        1 => "plugin_web=debug,info",
        _ => "trace",
    }
}

/// Install a compact stderr subscriber. `RUST_LOG` overrides `verbosity`.
/// Calling it twice is a no-op.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}
