// Tracing setup shared by suites and the setup CLI

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info,playwright_rs=warn";

static INIT: Once = Once::new();

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, writing through the
/// test harness's captured output.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_test_writer()
            .try_init();
    });
}

/// Installs a `fmt` subscriber for command-line tools. Logs go to stderr so
/// stdout stays free for command output.
pub fn init_cli_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_init_is_idempotent_across_entry_points() {
        init_tracing();
        init_cli_tracing();
        init_tracing();
        assert!(INIT.is_completed());
    }
}
