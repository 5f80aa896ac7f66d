use std::env;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "DUX_LOG";

/// Install the stderr subscriber. `DUX_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default.to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .init();
}
