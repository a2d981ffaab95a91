/// Tree-sitter grammar resolution by file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// Source languages the publisher can parse for scopes and dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// C and C++, parsed with the C++ grammar.
    Cpp,
    /// Go.
    Go,
    /// Rust.
    Rust,
    /// TypeScript and plain JavaScript.
    TypeScript,
    /// TSX and JSX.
    Tsx,
}

impl SourceLanguage {
    /// Extensions tried, in order, when a dependency token names a file without one.
    pub const fn candidate_extensions(self) -> &'static [&'static str] {
        return match self {
            SourceLanguage::Cpp => &["h", "hpp", "hh", "hxx"],
            SourceLanguage::Go => &["go"],
            SourceLanguage::Rust => &["rs"],
            SourceLanguage::Tsx | SourceLanguage::TypeScript => &["ts", "tsx", "js", "jsx"],
        };
    }

    /// The tree-sitter grammar for this language.
    pub fn grammar(self) -> Language {
        return match self {
            SourceLanguage::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            SourceLanguage::Go => tree_sitter_go::LANGUAGE.into(),
            SourceLanguage::Rust => tree_sitter_rust::LANGUAGE.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        };
    }
}

/// Map a file extension to its source language.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions.
pub fn language_for_path(path: &Path) -> Result<SourceLanguage, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    return match ext {
        "c" | "cc" | "cpp" | "cxx" | "h" | "hh" | "hpp" | "hxx" => Ok(SourceLanguage::Cpp),
        "go" => Ok(SourceLanguage::Go),
        "js" | "ts" => Ok(SourceLanguage::TypeScript),
        "jsx" | "tsx" => Ok(SourceLanguage::Tsx),
        "rs" => Ok(SourceLanguage::Rust),
        _ => Err(Error::UnsupportedLanguage {
            ext: ext.to_string(),
        }),
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn headers_and_sources_share_the_cpp_grammar() {
        for name in ["a.h", "a.hpp", "a.cpp", "a.cc", "a.c"] {
            let lang = language_for_path(Path::new(name)).unwrap();
            assert_eq!(lang, SourceLanguage::Cpp, "{name}");
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = language_for_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage { ext } if ext == "txt"));
    }
}
