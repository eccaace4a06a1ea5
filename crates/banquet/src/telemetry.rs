//! Log output setup.
//!
//! Banquet's crates only emit `tracing` events. Applications decide where
//! they go; [`init`] is the stock choice: human-readable lines on stderr,
//! filtered by `RUST_LOG` when it is set.
//!
//! Tokens and passwords never appear in any event field.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

/// Installs a global fmt subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset or unparseable,
/// e.g. `"banquet=info,warn"`.
///
/// # Errors
/// If a global subscriber is already installed.
pub fn init(default_filter: &str) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}
