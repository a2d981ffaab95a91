use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;
use crate::grammar;
use crate::types::{FileIdentity, normalize_path};

/// Pattern used when none is configured.
const MATCH_ALL: &str = "*.*";

/// Which files under a root are selected for publishing.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Directories never walked (the output directory, typically).
    pub exclude: Vec<PathBuf>,
    /// Shell-style file name patterns (`*`, `?`). Empty means `*.*` limited
    /// to files with a supported source language.
    pub patterns: Vec<String>,
    /// Walk subdirectories.
    pub recurse: bool,
    /// When non-empty, a file name must fully match at least one.
    pub regexes: Vec<String>,
}

/// Compiled form of a `Discovery`.
struct Matcher {
    /// Compiled wildcard patterns.
    patterns: Vec<Regex>,
    /// Compiled full-match regexes.
    regexes: Vec<Regex>,
    /// Only the default pattern is in effect: skip files no grammar handles.
    supported_only: bool,
}

impl Matcher {
    /// Compile patterns and regexes once per walk.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` for the first one that does not compile.
    fn compile(discovery: &Discovery) -> Result<Self, Error> {
        let patterns = if discovery.patterns.is_empty() {
            vec![wildcard_to_regex(MATCH_ALL)?]
        } else {
            discovery
                .patterns
                .iter()
                .map(|p| return wildcard_to_regex(p))
                .collect::<Result<Vec<_>, _>>()?
        };
        let regexes = discovery
            .regexes
            .iter()
            .map(|r| return compile_anchored(r, &format!("^(?:{r})$")))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Self {
            patterns,
            regexes,
            supported_only: discovery.patterns.is_empty(),
        });
    }

    /// Does a file pass the pattern, regex, and language filters?
    fn matches(&self, path: &Path) -> bool {
        let name = path.file_name().map(|n| return n.to_string_lossy()).unwrap_or_default();
        let name = name.as_ref();
        if self.supported_only && grammar::language_for_path(path).is_err() {
            return false;
        }
        let by_pattern = self.patterns.iter().any(|p| return p.is_match(name));
        let by_regex = self.regexes.is_empty() || self.regexes.iter().any(|r| return r.is_match(name));
        return by_pattern && by_regex;
    }
}

/// Compile a regex, reporting failures against the user's original text.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` if the regex does not compile.
fn compile_anchored(original: &str, anchored: &str) -> Result<Regex, Error> {
    return Regex::new(anchored).map_err(|e| {
        return Error::InvalidPattern {
            pattern: original.to_string(),
            reason: e.to_string(),
        };
    });
}

/// Find every file under `root` selected by `discovery`, sorted by path.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` if a pattern or regex does not compile,
/// or `Error::Io` if the root cannot be made absolute.
pub fn discover(root: &Path, discovery: &Discovery) -> Result<Vec<FileIdentity>, Error> {
    let matcher = Matcher::compile(discovery)?;
    let root = normalize_path(&std::path::absolute(root)?);
    let max_depth = if discovery.recurse { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| return !is_skipped_dir(e, &discovery.exclude))
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
    {
        if matcher.matches(entry.path()) {
            files.push(FileIdentity::from_absolute(entry.path()));
        }
    }

    files.sort();
    tracing::info!(root = %root.display(), count = files.len(), "discovered files");
    return Ok(files);
}

/// Hidden directories and excluded directories are pruned from the walk.
fn is_skipped_dir(entry: &DirEntry, exclude: &[PathBuf]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    let path = normalize_path(entry.path());
    return exclude.iter().any(|dir| return *dir == path);
}

/// Translate a shell-style wildcard into an anchored regex.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` if the translated regex does not compile.
fn wildcard_to_regex(pattern: &str) -> Result<Regex, Error> {
    let mut anchored = String::with_capacity(pattern.len().saturating_add(8));
    anchored.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => anchored.push_str(".*"),
            '?' => anchored.push('.'),
            other => anchored.push_str(&regex::escape(other.encode_utf8(&mut [0_u8; 4]))),
        }
    }
    anchored.push('$');
    return compile_anchored(pattern, &anchored);
}
