use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter when RUST_LOG is not set
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "warn" } else { "error" }
}

/// Installs the global subscriber writing to stderr.
///
/// The returned guard must be kept alive until exit so buffered lines are flushed.
pub fn init(verbose: bool, json: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(writer).with_target(false))
            .init();
    }

    guard
}
