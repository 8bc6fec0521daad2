//! Tracing setup for the binary.

use crate::error::{CliError, CliResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a compact stderr subscriber.
///
/// `RUST_LOG` takes precedence; otherwise engine events at `info`, or `debug`
/// with `verbose`.
pub fn init_tracing(verbose: bool) -> CliResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("anchorpatch_core=debug,anchorpatch=debug,warn")
            } else {
                EnvFilter::try_new("anchorpatch_core=info,anchorpatch=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
