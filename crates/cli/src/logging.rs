//! Tracing setup for the binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "wr_core=info,wrf_runner=info";

/// Log to stderr. `RUST_LOG` overrides the default filter; `verbose` raises
/// it to debug, which includes every program output line.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("wr_core=debug,wrf_runner=debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
