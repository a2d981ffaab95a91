//! Batch orchestration: output directory, dependency graph for the batch, and
//! one page per source file.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::annotator::Annotator;
use crate::error::Error;
use crate::graph::{self, DependencyGraph};
use crate::linker::{CrossLinker, PAGE_SUFFIX};
use crate::parser;
use crate::scope::ScopeIndex;
use crate::types::{FileIdentity, ParsedFile};

/// Result of converting a whole batch, in processing order.
#[derive(Debug)]
pub struct BatchReport {
    /// One entry per distinct file in the batch.
    pub outcomes: Vec<FileOutcome>,
    /// Directory the pages were written to.
    pub output_dir: PathBuf,
}

impl BatchReport {
    /// Number of files that were not written.
    pub fn failure_count(&self) -> usize {
        return self.outcomes.iter().filter(|o| return o.result.is_err()).count();
    }

    /// Output paths of the files that succeeded, in processing order.
    pub fn written(&self) -> Vec<&Path> {
        return self
            .outcomes
            .iter()
            .filter_map(|o| return o.result.as_ref().ok().map(PathBuf::as_path))
            .collect();
    }
}

/// What `ensure_output_directory` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    /// The directory did not exist and was created.
    Created,
    /// The directory was already there. Nothing was attempted.
    Existing,
}

/// Per-file result of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    /// Written page, or why this file was skipped.
    pub result: Result<PathBuf, Error>,
    /// The source file.
    pub source: FileIdentity,
}

/// Where and how pages are written.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Relative location of sibling pages as seen from a page, ending in `/`.
    pub link_prefix: String,
    /// Absolute output directory.
    pub output_dir: PathBuf,
    /// Toggle script reference emitted in each page head.
    pub script_src: String,
    /// Fail files whose parse tree contains syntax errors.
    pub strict: bool,
}

impl PublishOptions {
    /// Defaults for an output directory: links go through `../<dir name>/`.
    pub fn new(output_dir: &Path) -> Self {
        let link_prefix = output_dir.file_name().map_or_else(
            || return "./".to_string(),
            |name| return format!("../{}/", name.to_string_lossy()),
        );
        return Self {
            link_prefix,
            output_dir: output_dir.to_path_buf(),
            script_src: "../script.js".to_string(),
            strict: true,
        };
    }
}

/// Converts batches of source files into cross-linked pages.
///
/// Graph, parse results, and the converted list belong to the current run and
/// are reset at the start of each conversion.
#[derive(Debug)]
pub struct Publisher {
    /// Pages written during the current run, in processing order.
    converted: Vec<PathBuf>,
    /// Dependencies among the files of the current run.
    graph: DependencyGraph,
    /// Output settings.
    options: PublishOptions,
    /// Parse outcomes from graph building, consumed when each page is rendered.
    parsed: HashMap<FileIdentity, Result<ParsedFile, Error>>,
}

impl Publisher {
    /// Reset state, then parse every file of `batch` and record its dependencies.
    ///
    /// Each batch member becomes a key even when it has no dependencies or
    /// fails to parse. Parse failures are kept and reported when the file is
    /// converted.
    pub fn analyze(&mut self, batch: &[FileIdentity]) -> &DependencyGraph {
        self.clear();
        for file in batch {
            self.graph.insert_file(file);
            let parsed = parser::parse_file(file.as_path(), self.options.strict);
            match &parsed {
                Ok(parsed) => {
                    for token in &parsed.dependency_tokens {
                        let target = graph::resolve_token(file, token);
                        if target != *file {
                            self.graph.add(file, &target);
                        }
                    }
                },
                Err(e) => tracing::warn!(%file, error = %e, "parse failed"),
            }
            self.parsed.insert(file.clone(), parsed);
        }
        return &self.graph;
    }

    /// Drop the graph, pending parse results, and the converted list.
    pub fn clear(&mut self) {
        self.converted.clear();
        self.graph.clear();
        self.parsed.clear();
        return;
    }

    /// Pages written by the most recent run.
    pub fn converted_files(&self) -> &[PathBuf] {
        return &self.converted;
    }

    /// Convert every file of `files` as one batch. Duplicates are converted once.
    ///
    /// A file that cannot be read, parsed, or written is recorded in the
    /// report and the batch continues.
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryCreation` if the output directory cannot be
    /// created. No file is processed in that case.
    pub fn convert_batch(&mut self, files: &[FileIdentity]) -> Result<BatchReport, Error> {
        ensure_output_directory(&self.options.output_dir)?;

        let mut seen = HashSet::new();
        let batch: Vec<FileIdentity> = files.iter().filter(|f| return seen.insert(*f)).cloned().collect();
        warn_on_name_collisions(&batch);

        self.analyze(&batch);
        let members: HashSet<FileIdentity> = batch.iter().cloned().collect();

        let mut outcomes = Vec::with_capacity(batch.len());
        for file in batch {
            let result = self.publish_one(&file, &members);
            match &result {
                Ok(out) => {
                    tracing::info!(source = %file, output = %out.display(), "converted");
                    self.converted.push(out.clone());
                },
                Err(e) => tracing::warn!(source = %file, error = %e, "conversion failed"),
            }
            outcomes.push(FileOutcome { result, source: file });
        }

        return Ok(BatchReport {
            outcomes,
            output_dir: self.options.output_dir.clone(),
        });
    }

    /// Convert a single file on its own. Its dependencies are outside the
    /// batch, so the page carries no dependency links.
    ///
    /// # Errors
    ///
    /// Returns `Error::DirectoryCreation` if the output directory cannot be
    /// created, or the file's own read, parse, or write failure.
    pub fn convert_file(&mut self, file: &FileIdentity) -> Result<PathBuf, Error> {
        ensure_output_directory(&self.options.output_dir)?;
        self.analyze(std::slice::from_ref(file));
        let members: HashSet<FileIdentity> = [file.clone()].into_iter().collect();
        let out = self.publish_one(file, &members)?;
        tracing::info!(source = %file, output = %out.display(), "converted");
        self.converted.push(out.clone());
        return Ok(out);
    }

    /// Dependencies recorded by the most recent run.
    pub fn graph(&self) -> &DependencyGraph {
        return &self.graph;
    }

    /// A publisher with empty state.
    pub fn new(options: PublishOptions) -> Self {
        return Self {
            converted: Vec::new(),
            graph: DependencyGraph::default(),
            options,
            parsed: HashMap::new(),
        };
    }

    /// Destination page for a source file: `<output dir>/<base name>.html`.
    pub fn output_path(&self, file: &FileIdentity) -> PathBuf {
        return self
            .options
            .output_dir
            .join(format!("{}{PAGE_SUFFIX}", file.base_name()));
    }

    /// Render and write one page.
    ///
    /// # Errors
    ///
    /// Returns the file's parse failure, or `Error::FileWrite`.
    fn publish_one(&mut self, file: &FileIdentity, members: &HashSet<FileIdentity>) -> Result<PathBuf, Error> {
        let parsed = match self.parsed.remove(file) {
            Some(outcome) => outcome?,
            None => parser::parse_file(file.as_path(), self.options.strict)?,
        };

        let scopes = ScopeIndex::build(&parsed.scope_tree);
        if scopes.is_empty() {
            tracing::debug!(%file, "no classes or functions");
        }
        let body = Annotator::new(&scopes).render(&parsed.source);

        let targets: &[FileIdentity] = if self.graph.has(file) { self.graph.get(file)? } else { &[] };
        let linker = CrossLinker::new(members, &self.options.link_prefix, &self.options.script_src);
        let page = linker.wrap(file, &body, targets);

        let out = self.output_path(file);
        std::fs::write(&out, page).map_err(|source| {
            return Error::FileWrite {
                path: out.clone(),
                source,
            };
        })?;
        return Ok(out);
    }
}

/// Create the output directory unless it already exists.
///
/// # Errors
///
/// Returns `Error::DirectoryCreation` if the directory is missing and cannot
/// be created (including when the path names an existing file).
pub fn ensure_output_directory(path: &Path) -> Result<DirectoryStatus, Error> {
    if path.is_dir() {
        return Ok(DirectoryStatus::Existing);
    }
    tracing::info!(path = %path.display(), "creating output directory");
    std::fs::create_dir_all(path).map_err(|source| {
        return Error::DirectoryCreation {
            path: path.to_path_buf(),
            source,
        };
    })?;
    return Ok(DirectoryStatus::Created);
}

/// Pages are named by base name, so two sources sharing one overwrite each other.
fn warn_on_name_collisions(batch: &[FileIdentity]) {
    let mut by_name: HashMap<String, &FileIdentity> = HashMap::new();
    for file in batch {
        if let Some(first) = by_name.insert(file.base_name(), file) {
            tracing::warn!(%first, second = %file, "files share a base name, later page overwrites earlier");
        }
    }
    return;
}
