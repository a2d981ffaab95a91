//! Log setup for the CLI.
//!
//! Filter precedence, highest first:
//! - `RUST_LOG` (for example `RUST_LOG=codepub=debug codepub publish`)
//! - `-v` (info) or `-vv` (debug) on the command line
//! - `[logging] default` in `.codepub.toml`, `warn` when unset

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Layer as _};

use crate::config::LoggingConfig;

/// Guards against installing the subscriber twice.
static INIT: Once = Once::new();

/// Filter directive for a verbosity count and config, ignoring `RUST_LOG`.
fn directive(verbose: u8, config: &LoggingConfig) -> String {
    return match verbose {
        0 => config.default.clone(),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    };
}

/// Install the stderr subscriber. Only the first call takes effect.
pub fn init(verbose: u8, config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(directive(verbose, config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(filter);

        // A subscriber installed elsewhere (tests) wins; nothing to report.
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
    return;
}
