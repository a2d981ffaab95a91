use crate::config::CONFIG_FILE;
use crate::error::Error;

/// ANSI bold, applied to markdown headings on stderr.
const BOLD: &str = "\x1b[1m";

/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Render an error as a structured markdown diagnostic: what happened, then
/// how to fix it when there is something the user can do.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DirectoryCreation { path, source } => format!(
            "\
# Error: Output Directory

Cannot create `{}`: {source}

Nothing was converted.

## Fix

Pick a writable location:

    codepub publish --out path/to/pages
",
            path.display()
        ),
        Error::FileRead { path, source } => format!(
            "\
# Error: Unreadable Source

Cannot read `{}`: {source}
",
            path.display()
        ),
        Error::FileWrite { path, source } => format!(
            "\
# Error: Unwritable Page

Cannot write `{}`: {source}
",
            path.display()
        ),
        Error::InvalidPattern { pattern, reason } => format!(
            "\
# Error: Invalid Pattern

`{pattern}` does not compile: {reason}

## Fix

Wildcards (`--pattern`) accept `*` and `?`. Regexes (`--regex`) must match
the whole file name, for example:

    codepub publish --regex '.*\\.(h|cpp)'
"
        ),
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::ScopeExtraction { file, reason } => render_scope_extraction(file, reason),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid Config

`{CONFIG_FILE}` is malformed:

{e}
"
        ),
        Error::UnknownDependencyKey { file } => format!(
            "\
# Error: Unknown Dependency Key

`{}` was never added to the dependency graph.
",
            file.display()
        ),
        Error::UnsupportedLanguage { ext } => render_unsupported_language(ext),
        Error::Watch { reason } => format!(
            "\
# Error: Watch

{reason}
"
        ),
    };
}

/// Parse failure, with the lenient escape hatch.
fn render_scope_extraction(file: &std::path::Path, reason: &str) -> String {
    return format!(
        "\
# Error: Scope Extraction Failed

Could not extract classes and functions from `{}`: {reason}

## Fix

Fix the syntax error, or publish anyway without trusting the regions:

    codepub file {} --lenient
",
        file.display(),
        file.display()
    );
}

/// Unknown extension, with the supported list.
fn render_unsupported_language(ext: &str) -> String {
    return format!(
        "\
# Error: Unsupported Language

No tree-sitter grammar for `.{ext}` files.

## Supported extensions

- `.h`, `.hh`, `.hpp`, `.hxx`, `.c`, `.cc`, `.cpp`, `.cxx` (C/C++)
- `.go` (Go)
- `.rs` (Rust)
- `.ts`, `.tsx`, `.js`, `.jsx` (TypeScript/JavaScript)

## Fix

Narrow the selection, for example:

    codepub publish --pattern '*.h' --pattern '*.cpp'
"
    );
}
