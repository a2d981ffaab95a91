//! CLI command bodies: publish, file, deps.

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use crate::config::Config;
use crate::error::Error;
use crate::loader;
use crate::publisher::{BatchReport, FileOutcome, Publisher};
use crate::types::FileIdentity;

/// One file in the `--format json` report.
#[derive(Serialize)]
struct FileJson {
    /// Failure message, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Written page, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    /// Source file.
    source: String,
    /// `converted` or `failed`.
    status: &'static str,
}

/// How `publish` prints its report.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Machine-readable report on stdout.
    Json,
    /// One line per file plus a summary.
    #[default]
    Text,
}

/// Top-level `--format json` report.
#[derive(Serialize)]
struct ReportJson {
    /// Per-file outcomes in processing order.
    files: Vec<FileJson>,
    /// Directory the pages were written to.
    output_dir: String,
}

/// Discover files and print the dependency graph among them.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` or `Error::Io` from discovery.
pub fn deps(config: &Config) -> Result<ExitCode, Error> {
    let files = loader::discover(&config.root, &config.discovery())?;
    if files.is_empty() {
        println!("No files match under {}", config.root.display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut publisher = Publisher::new(config.publish_options());
    let graph = publisher.analyze(&files);
    let edges: usize = graph.keys().filter_map(|key| return graph.get(key).ok()).map(<[_]>::len).sum();
    print!("{graph}");
    println!();
    println!("{} files, {edges} dependencies", graph.len());
    return Ok(ExitCode::SUCCESS);
}

/// Exit code for a finished batch: 1 when any file failed.
fn exit_code_for(report: &BatchReport) -> ExitCode {
    if report.failure_count() > 0 {
        return ExitCode::from(1);
    }
    return ExitCode::SUCCESS;
}

/// Convert one file on its own and print the page path.
///
/// # Errors
///
/// Returns the file's read, parse, or write failure, or
/// `Error::DirectoryCreation` if the output directory cannot be created.
pub fn file(config: &Config, path: &Path) -> Result<ExitCode, Error> {
    let identity = FileIdentity::from_path(path)?;
    let mut publisher = Publisher::new(config.publish_options());
    let out = publisher.convert_file(&identity)?;
    println!("{}", out.display());
    return Ok(ExitCode::SUCCESS);
}

/// JSON view of one outcome.
fn file_json(outcome: &FileOutcome) -> FileJson {
    let source = outcome.source.to_string();
    return match &outcome.result {
        Ok(out) => FileJson {
            error: None,
            output: Some(out.display().to_string()),
            source,
            status: "converted",
        },
        Err(e) => FileJson {
            error: Some(e.to_string()),
            output: None,
            source,
            status: "failed",
        },
    };
}

/// Render a report as pretty JSON.
fn print_json(report: &BatchReport) {
    let json = ReportJson {
        files: report.outcomes.iter().map(file_json).collect(),
        output_dir: report.output_dir.display().to_string(),
    };
    // serde_json::to_string_pretty won't fail on this structure.
    let rendered = serde_json::to_string_pretty(&json).unwrap_or_default();
    println!("{rendered}");
    return;
}

/// Render a report as one line per file and a summary.
fn print_text(report: &BatchReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(out) => println!("-- Converted: {}", out.display()),
            Err(e) => println!("-- Failed:    {} ({e})", outcome.source),
        }
    }
    let failed = report.failure_count();
    let converted = report.outcomes.len().saturating_sub(failed);
    println!();
    if failed > 0 {
        println!("{converted} converted, {failed} failed");
    } else {
        println!("All {converted} files converted to {}", report.output_dir.display());
    }
    return;
}

/// Discover files under the configured root and convert them as one batch.
///
/// # Errors
///
/// Returns errors from discovery or `Error::DirectoryCreation`. Per-file
/// failures are reported, not returned.
pub fn publish(config: &Config, format: OutputFormat) -> Result<ExitCode, Error> {
    let files = loader::discover(&config.root, &config.discovery())?;
    if files.is_empty() {
        println!("Nothing to publish under {}", config.root.display());
        return Ok(ExitCode::SUCCESS);
    }
    let report = publish_files(config, &files)?;
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => print_text(&report),
    }
    return Ok(exit_code_for(&report));
}

/// Convert an already-discovered batch.
///
/// # Errors
///
/// Returns `Error::DirectoryCreation` if the output directory cannot be created.
pub fn publish_files(config: &Config, files: &[FileIdentity]) -> Result<BatchReport, Error> {
    let mut publisher = Publisher::new(config.publish_options());
    return publisher.convert_batch(files);
}
