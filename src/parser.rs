//! Parser collaborator: reads one file and extracts its dependency tokens and scope tree.
//!
//! Every call owns its own tree-sitter parser and tree. Nothing is shared
//! between calls, so files can be parsed from any thread in any order.

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::Error;
use crate::grammar::{self, SourceLanguage};
use crate::types::{NodeKind, ParsedFile, ScopeNode};

/// Maximum source file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Dispatch to the dependency-token collector for a language.
fn collect_dependency_tokens(node: Node<'_>, source: &str, language: SourceLanguage, tokens: &mut Vec<String>) {
    if let Some(token) = dependency_token(node, source, language) {
        tokens.push(token);
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_dependency_tokens(child, source, language, tokens);
    }
    return;
}

/// Recursively attach class, function, and namespace nodes to the nearest
/// interesting ancestor. Nodes of any other kind are transparent.
fn collect_scopes(node: Node<'_>, language: SourceLanguage, parent: &mut ScopeNode) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let Some(kind) = scope_kind(child, language) else {
            collect_scopes(child, language, parent);
            continue;
        };
        let mut scope = ScopeNode::new(kind, one_based_start(child), one_based_end(child));
        collect_scopes(child, language, &mut scope);
        parent.children.push(scope);
    }
    return;
}

// ── Dependencies ───────────────────────────────────────────────────────

/// Extract the quoted path of an include/import node, if `node` is one.
fn dependency_token(node: Node<'_>, source: &str, language: SourceLanguage) -> Option<String> {
    let path_node = match (language, node.kind()) {
        (SourceLanguage::Cpp, "preproc_include") => {
            let path = node.child_by_field_name("path")?;
            // `<vector>` is a system include, never a file in the batch.
            if path.kind() != "string_literal" {
                return None;
            }
            path
        },
        (SourceLanguage::Go, "import_spec") => node.child_by_field_name("path")?,
        (SourceLanguage::Tsx | SourceLanguage::TypeScript, "export_statement" | "import_statement") => {
            node.child_by_field_name("source")?
        },
        _ => return None,
    };

    let text = path_node.utf8_text(source.as_bytes()).ok()?;
    let token = text.trim_matches(|c: char| return matches!(c, '"' | '\'' | '`'));
    if token.is_empty() {
        return None;
    }
    return Some(token.to_string());
}

// ── Scopes ─────────────────────────────────────────────────────────────

/// Line of the first syntax error in the tree, if any.
fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(one_based_start(node));
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    return children.into_iter().find_map(first_error_line);
}

/// Does the node carry a `{`-delimited body? Forward declarations have none,
/// and tuple or unit bodies (`struct Meters(u32);`) give the annotator no
/// braces to anchor region markers on.
fn has_brace_body(node: Node<'_>) -> bool {
    return node
        .child_by_field_name("body")
        .and_then(|body| return body.child(0))
        .is_some_and(|open| return open.kind() == "{");
}

/// One-based last line of a node.
fn one_based_end(node: Node<'_>) -> usize {
    return node.end_position().row.saturating_add(1);
}

/// One-based first line of a node.
fn one_based_start(node: Node<'_>) -> usize {
    return node.start_position().row.saturating_add(1);
}

/// Read and parse a source file into dependency tokens and a scope tree.
/// Bytes that are not valid UTF-8 are replaced, not rejected.
///
/// # Errors
///
/// Returns `Error::FileRead` if the file cannot be read,
/// `Error::UnsupportedLanguage` for unknown extensions,
/// or `Error::ScopeExtraction` if no usable tree can be built.
pub fn parse_file(path: &Path, strict: bool) -> Result<ParsedFile, Error> {
    let language = grammar::language_for_path(path)?;
    let bytes = std::fs::read(path).map_err(|source| {
        return Error::FileRead {
            path: path.to_path_buf(),
            source,
        };
    })?;
    let source = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(file = %path.display(), "not valid UTF-8, invalid bytes replaced");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        },
    };
    return parse_source(path, source, language, strict);
}

/// Parse already-loaded source text.
///
/// With `strict`, a tree containing syntax errors is a failure. Without it,
/// error nodes are tolerated and whatever scopes survive are kept.
///
/// # Errors
///
/// Returns `Error::ScopeExtraction` if the source is too large, the grammar
/// cannot be loaded, tree-sitter returns no tree, or (strict only) the tree
/// contains syntax errors.
pub fn parse_source(path: &Path, source: String, language: SourceLanguage, strict: bool) -> Result<ParsedFile, Error> {
    let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
    if source_len > MAX_FILE_SIZE {
        return Err(Error::ScopeExtraction {
            file: path.to_path_buf(),
            reason: format!("file too large ({source_len} bytes, max {MAX_FILE_SIZE})"),
        });
    }

    let tree = parse_tree(path, &source, language)?;
    let root = tree.root_node();

    if let Some(line) = first_error_line(root) {
        if strict {
            return Err(Error::ScopeExtraction {
                file: path.to_path_buf(),
                reason: format!("syntax error at line {line}"),
            });
        }
        tracing::warn!(file = %path.display(), line, "syntax error tolerated, scopes may be incomplete");
    }

    let mut dependency_tokens = Vec::new();
    collect_dependency_tokens(root, &source, language, &mut dependency_tokens);

    let mut scope_tree = ScopeNode::global(source.lines().count());
    collect_scopes(root, language, &mut scope_tree);

    tracing::debug!(
        file = %path.display(),
        dependencies = dependency_tokens.len(),
        top_level_scopes = scope_tree.children.len(),
        "parsed"
    );

    return Ok(ParsedFile {
        dependency_tokens,
        scope_tree,
        source,
    });
}

/// Parse source into a tree-sitter tree with a parser owned by this call.
///
/// # Errors
///
/// Returns `Error::ScopeExtraction` if the language cannot be set or parsing fails.
fn parse_tree(path: &Path, source: &str, language: SourceLanguage) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser.set_language(&language.grammar()).map_err(|e| {
        return Error::ScopeExtraction {
            file: path.to_path_buf(),
            reason: e.to_string(),
        };
    })?;

    return parser.parse(source, None).ok_or_else(|| {
        return Error::ScopeExtraction {
            file: path.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    });
}

/// Classify a node as a class, function, or namespace scope for `language`.
fn scope_kind(node: Node<'_>, language: SourceLanguage) -> Option<NodeKind> {
    let kind = match (language, node.kind()) {
        (SourceLanguage::Cpp, "class_specifier" | "struct_specifier" | "union_specifier")
        | (SourceLanguage::Rust, "enum_item" | "impl_item" | "struct_item" | "trait_item" | "union_item")
        | (
            SourceLanguage::Tsx | SourceLanguage::TypeScript,
            "abstract_class_declaration" | "class_declaration" | "interface_declaration",
        ) => NodeKind::Class,
        (SourceLanguage::Cpp, "function_definition")
        | (SourceLanguage::Go, "function_declaration" | "method_declaration")
        | (SourceLanguage::Rust, "function_item")
        | (
            SourceLanguage::Tsx | SourceLanguage::TypeScript,
            "function_declaration" | "generator_function_declaration" | "method_definition",
        ) => NodeKind::Function,
        (SourceLanguage::Cpp, "namespace_definition")
        | (SourceLanguage::Rust, "mod_item")
        | (SourceLanguage::Tsx | SourceLanguage::TypeScript, "internal_module") => NodeKind::Namespace,
        (SourceLanguage::Go, "type_spec") => return go_type_spec_kind(node),
        _ => return None,
    };

    // `class Foo;`, `struct Unit;`, `struct Meters(u32);`, `mod tests;` have no region.
    if !has_brace_body(node) {
        return None;
    }
    return Some(kind);
}

/// Go declares structs and interfaces through `type X struct { ... }`.
fn go_type_spec_kind(node: Node<'_>) -> Option<NodeKind> {
    let ty = node.child_by_field_name("type")?;
    return match ty.kind() {
        "interface_type" | "struct_type" => Some(NodeKind::Class),
        _ => None,
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;

    fn parse(name: &str, source: &str) -> ParsedFile {
        let path = Path::new(name);
        let language = grammar::language_for_path(path).unwrap();
        return parse_source(path, source.to_string(), language, true).unwrap();
    }

    #[test]
    fn cpp_quoted_includes_are_dependency_tokens() {
        let parsed = parse(
            "Converter.cpp",
            "#include \"Converter.h\"\n#include <vector>\n#include \"../Util/Util.h\"\n",
        );
        assert_eq!(parsed.dependency_tokens, vec!["Converter.h", "../Util/Util.h"]);
    }

    #[test]
    fn cpp_methods_nest_inside_classes() {
        let source = "\
namespace app {
class Widget {
public:
  int size() const {
    return 3;
  }
};
}
int main() {
  return 0;
}
";
        let parsed = parse("widget.cpp", source);
        let root = &parsed.scope_tree;
        assert_eq!(root.kind, NodeKind::Global);
        assert_eq!(root.children.len(), 2);

        let namespace = &root.children[0];
        assert_eq!(namespace.kind, NodeKind::Namespace);
        let class = &namespace.children[0];
        assert_eq!((class.kind, class.start_line, class.end_line), (NodeKind::Class, 2, 7));
        let method = &class.children[0];
        assert_eq!((method.kind, method.start_line, method.end_line), (NodeKind::Function, 4, 6));

        let main = &root.children[1];
        assert_eq!((main.kind, main.start_line, main.end_line), (NodeKind::Function, 9, 11));
    }

    #[test]
    fn cpp_forward_declarations_are_not_scopes() {
        let parsed = parse("fwd.h", "class Later;\nstruct Point { int x; };\n");
        assert_eq!(parsed.scope_tree.children.len(), 1);
        assert_eq!(parsed.scope_tree.children[0].start_line, 2);
    }

    #[test]
    fn zero_scopes_is_success_not_failure() {
        let parsed = parse("consts.h", "#define LIMIT 4\nint limit = LIMIT;\n");
        assert!(parsed.scope_tree.children.is_empty());
        assert!(parsed.dependency_tokens.is_empty());
    }

    #[test]
    fn strict_mode_rejects_syntax_errors() {
        let path = Path::new("broken.cpp");
        let result = parse_source(path, "class {{{ int\n".to_string(), SourceLanguage::Cpp, true);
        assert!(matches!(result, Err(Error::ScopeExtraction { .. })));
    }

    #[test]
    fn lenient_mode_keeps_partial_tree() {
        let path = Path::new("broken.cpp");
        let source = "int ok() {\n  return 1;\n}\nclass {{{ int\n".to_string();
        let parsed = parse_source(path, source, SourceLanguage::Cpp, false).unwrap();
        assert_eq!(parsed.scope_tree.kind, NodeKind::Global);
    }

    #[test]
    fn typescript_imports_and_classes() {
        let source = "\
import { helper } from \"./helper\";
export class Service {
  run(): number {
    return helper();
  }
}
";
        let parsed = parse("service.ts", source);
        assert_eq!(parsed.dependency_tokens, vec!["./helper"]);
        let class = &parsed.scope_tree.children[0];
        assert_eq!(class.kind, NodeKind::Class);
        assert_eq!(class.children[0].kind, NodeKind::Function);
    }

    #[test]
    fn go_structs_and_methods() {
        let source = "\
package shapes

import \"fmt\"

type Square struct {
\tside int
}

func (s Square) Describe() string {
\treturn fmt.Sprint(s.side)
}
";
        let parsed = parse("shapes.go", source);
        assert_eq!(parsed.dependency_tokens, vec!["fmt"]);
        let kinds: Vec<NodeKind> = parsed.scope_tree.children.iter().map(|c| return c.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Class, NodeKind::Function]);
    }

    #[test]
    fn rust_tuple_and_unit_structs_are_not_scopes() {
        let source = "\
pub struct Meters(pub u32);
pub struct Marker;
pub struct Point {
    x: i32,
}
fn main() {
    let _ = Meters(3);
}
";
        let parsed = parse("lib.rs", source);
        let spans: Vec<(NodeKind, usize)> = parsed
            .scope_tree
            .children
            .iter()
            .map(|c| return (c.kind, c.start_line))
            .collect();
        assert_eq!(spans, vec![(NodeKind::Class, 3), (NodeKind::Function, 6)]);
    }

    #[test]
    fn latin1_bytes_are_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.cpp");
        std::fs::write(&path, b"// caf\xe9 author\nint f() { return 1; }\n").unwrap();

        let parsed = parse_file(&path, true).unwrap();
        assert!(parsed.source.starts_with("// caf\u{fffd} author"));
        assert_eq!(parsed.scope_tree.children.len(), 1);
    }

    #[test]
    fn unreadable_file_is_a_read_failure() {
        let result = parse_file(Path::new("/definitely/not/here.cpp"), true);
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }
}
