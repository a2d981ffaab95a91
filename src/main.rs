mod annotator;
mod commands;
mod config;
mod diagnostics;
mod error;
mod grammar;
mod graph;
mod lexer;
mod linker;
mod loader;
mod logging;
mod parser;
mod publisher;
mod scope;
mod types;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use crate::commands::OutputFormat;
use crate::config::{Config, Overrides};

/// Command-line interface.
#[derive(Parser)]
#[command(
    name = "codepub",
    version,
    about = "Publish source files as cross-linked HTML pages with collapsible regions"
)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the dependency graph of the selected files
    Deps {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Convert one file on its own
    File {
        /// Tolerate syntax errors instead of failing the file
        #[arg(long)]
        lenient: bool,
        /// Output directory (default: from .codepub.toml, else ../ConvertedWebpages)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Source file to convert
        path: PathBuf,
    },
    /// Convert every selected file as one cross-linked batch
    Publish {
        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Publish, then re-publish whenever a source file changes
    Watch {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

/// File selection flags shared by the batch commands.
#[derive(Args)]
struct SelectionArgs {
    /// Tolerate syntax errors instead of failing the file
    #[arg(long)]
    lenient: bool,
    /// Output directory (default: from .codepub.toml, else ../ConvertedWebpages)
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Root directory to select files from
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Wildcard file name pattern; repeatable (default: *.* with a supported language)
    #[arg(short, long = "pattern")]
    patterns: Vec<String>,
    /// Walk subdirectories
    #[arg(short = 's', long)]
    recurse: bool,
    /// Regex the whole file name must match; repeatable
    #[arg(short, long = "regex")]
    regexes: Vec<String>,
}

impl SelectionArgs {
    /// Load the root's config and apply these flags on top.
    ///
    /// # Errors
    ///
    /// Returns config loading errors.
    fn into_config(self) -> Result<Config, error::Error> {
        let overrides = Overrides {
            lenient: self.lenient,
            output_dir: self.out,
            patterns: self.patterns,
            recurse: self.recurse,
            regexes: self.regexes,
        };
        return Config::load(&self.path)?.apply(overrides);
    }
}

/// Resolve config for a command, set up logging, and run it.
///
/// # Errors
///
/// Returns fatal errors from config loading or the command itself.
fn dispatch(command: Commands, verbose: u8) -> Result<ExitCode, error::Error> {
    return match command {
        Commands::Deps { selection } => {
            let config = selection.into_config()?;
            logging::init(verbose, &config.logging);
            commands::deps(&config)
        },
        Commands::File { lenient, out, path } => {
            let overrides = Overrides {
                lenient,
                output_dir: out,
                ..Overrides::default()
            };
            let root = path
                .parent()
                .filter(|dir| return !dir.as_os_str().is_empty())
                .map_or_else(|| return PathBuf::from("."), PathBuf::from);
            let config = Config::load(&root)?.apply(overrides)?;
            logging::init(verbose, &config.logging);
            commands::file(&config, &path)
        },
        Commands::Publish { format, selection } => {
            let config = selection.into_config()?;
            logging::init(verbose, &config.logging);
            commands::publish(&config, format)
        },
        Commands::Watch { selection } => {
            let config = selection.into_config()?;
            logging::init(verbose, &config.logging);
            watch::run(&config)
        },
    };
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    return match dispatch(cli.command, cli.verbose) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}
