//! Log output for the `thicket` binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "THICKET_LOG";

/// Filter used when `THICKET_LOG` is unset, by `-v` count.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "thicket=warn",
        1 => "thicket=debug",
        _ => "thicket=trace",
    }
}

/// Install the global subscriber. Logs go to stderr so they never mix with
/// command output.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}
