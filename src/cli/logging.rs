//! Diagnostic logging to stderr
//!
//! Warnings (skipped records, stale responses, bad config values) are shown
//! by default; `--verbose` adds debug events. `CFADMIN_LOG` takes an
//! `EnvFilter` directive and overrides both.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CFADMIN_LOG";

fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "cfadmin=debug",
        (false, true) => "error",
        (false, false) => "warn",
    }
}

/// Install the global subscriber; a second call is a no-op
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, true), "cfadmin=debug");
        assert_eq!(default_directive(false, true), "error");
    }
}
