//! File watcher: publishes on startup, then re-publishes on source changes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, OutputFormat};
use crate::config::Config;
use crate::diagnostics;
use crate::error::Error;

/// Debounce delay between filesystem events and re-publish.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that signals on changes outside `output_dir`.
///
/// Events whose paths all lie in the output directory are dropped.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    output_dir: PathBuf,
) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return !is_under(p, &output_dir))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Is `path` inside `dir` (or `dir` itself)?
fn is_under(path: &Path, dir: &Path) -> bool {
    return path.starts_with(dir);
}

/// Entry point for the watch command.
///
/// Publishes once, then watches the root and publishes again after each
/// burst of changes. Runs until the watcher channel closes.
///
/// # Errors
///
/// Returns `Error::Watch` if the root cannot be watched.
pub fn run(config: &Config) -> Result<ExitCode, Error> {
    eprintln!("watch: initial publish");
    let mut last_code = run_publish(config);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, config.output_dir.clone())?;
    let mode = if config.recurse {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&config.root, mode).map_err(|e| {
        return Error::Watch {
            reason: format!("cannot watch {}: {e}", config.root.display()),
        };
    })?;

    eprintln!("watch: monitoring {}, press Ctrl+C to stop", config.root.display());

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-publishing...");
        last_code = run_publish(config);
    }

    return Ok(last_code);
}

/// Publish once and print the report. Fatal errors are printed, not returned.
fn run_publish(config: &Config) -> ExitCode {
    return match commands::publish(config, OutputFormat::Text) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2_u8)
        },
    };
}
