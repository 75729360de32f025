//! Tracing subscriber setup. Logs go to stderr so stdout stays clean for
//! command output.

use tracing_subscriber::EnvFilter;

use crate::types::LogFormat;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,issue_mirror=debug"
    } else {
        "warn,issue_mirror=info"
    }
}

pub fn init_tracing(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
