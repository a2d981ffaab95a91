/// Crate-level error types for codepub diagnostics.
use std::path::PathBuf;

/// All errors in codepub carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, pattern, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The output directory did not exist and could not be created.
    /// Fatal for a whole batch.
    #[error("cannot create output directory {}: {source}", path.display())]
    DirectoryCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// A source file could not be read. Local to one file.
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        /// Source file that failed to open.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// A rendered page could not be written. Local to one file.
    #[error("cannot write {}: {source}", path.display())]
    FileWrite {
        /// Destination page path.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// A discovery pattern or regex does not compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The pattern as written by the user.
        pattern: String,
        /// Compiler message from the regex engine.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// The parser could not produce a scope tree for a file. Distinct from a
    /// file that parsed cleanly and declares no classes or functions.
    #[error("scope extraction failed: {}: {reason}", file.display())]
    ScopeExtraction {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// Indexed access to the dependency graph for a file that was never added.
    #[error("no dependency entry for {}", file.display())]
    UnknownDependencyKey {
        /// The missing key.
        file: PathBuf,
    },

    /// No tree-sitter grammar registered for this file extension.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
