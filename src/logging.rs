//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. `RUST_LOG` wins when set; otherwise
/// `verbose` raises the crate's default level to debug.
pub fn init(verbose: bool) {
    let default_directives = if verbose {
        "taskdeck=debug,tower_http=debug"
    } else {
        "taskdeck=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
