/// Core domain types for publishing: file identities, scope trees, and spans.
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A normalized absolute path. The unit of identity for dependency graph keys,
/// batch membership, and output naming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIdentity(
    /// The absolute, lexically normalized path.
    PathBuf,
);

impl FileIdentity {
    /// The path being identified.
    pub fn as_path(&self) -> &Path {
        return &self.0;
    }

    /// Final path component, used for page titles, link labels, and output names.
    pub fn base_name(&self) -> String {
        return self
            .0
            .file_name()
            .map(|name| return name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    /// Identity of a path, made absolute against the current directory and normalized.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the current directory cannot be determined.
    pub fn from_path(path: &Path) -> Result<Self, crate::error::Error> {
        let absolute = std::path::absolute(path)?;
        return Ok(Self(normalize_path(&absolute)));
    }

    /// Identity of a path that is already absolute. Only normalizes.
    pub fn from_absolute(path: &Path) -> Self {
        return Self(normalize_path(path));
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0.display());
    }
}

/// Syntactic category of a node in a parsed scope tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Class-like declaration with a body (class, struct, trait, interface, impl).
    Class,
    /// Function or method with a body.
    Function,
    /// Root of the tree, spanning the whole file.
    Global,
    /// Namespace or module block. Not annotated, only carries nesting.
    Namespace,
}

/// Output of the parser collaborator for one file. Owned by the caller, so
/// extraction carries no shared state between files.
#[derive(Debug)]
pub struct ParsedFile {
    /// Raw quoted strings from include/import statements, in source order.
    pub dependency_tokens: Vec<String>,
    /// Scope tree rooted at a `NodeKind::Global` node.
    pub scope_tree: ScopeNode,
    /// Full file text as read from disk.
    pub source: String,
}

/// Region kinds that receive collapsible markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// A class-like region.
    Class,
    /// A function region.
    Function,
}

impl ScopeKind {
    /// CSS class name of the region marker and toggle target.
    pub const fn tag(self) -> &'static str {
        return match self {
            ScopeKind::Class => "class",
            ScopeKind::Function => "function",
        };
    }
}

/// One node of a parsed scope tree. Depth is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeNode {
    /// Nested scopes in source order.
    pub children: Vec<ScopeNode>,
    /// One-based line of the node's last character.
    pub end_line: usize,
    /// What the node declares.
    pub kind: NodeKind,
    /// One-based line of the node's first character.
    pub start_line: usize,
}

impl ScopeNode {
    /// Root node for a file with `line_count` lines.
    pub const fn global(line_count: usize) -> Self {
        return Self {
            children: Vec::new(),
            end_line: line_count,
            kind: NodeKind::Global,
            start_line: 1,
        };
    }

    /// Leaf node with the given kind and line range.
    pub const fn new(kind: NodeKind, start_line: usize, end_line: usize) -> Self {
        return Self {
            children: Vec::new(),
            end_line,
            kind,
            start_line,
        };
    }

    /// Builder-style child attachment, mostly for tests and fixtures.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        return self;
    }
}

/// A class or function interval. `start_line >= 1` and `end_line >= start_line`
/// hold by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeSpan {
    /// One-based closing line.
    pub end_line: usize,
    /// Region kind.
    pub kind: ScopeKind,
    /// One-based opening line.
    pub start_line: usize,
}

impl ScopeSpan {
    /// Build a span, rejecting zero or inverted line ranges.
    pub const fn new(kind: ScopeKind, start_line: usize, end_line: usize) -> Option<Self> {
        if start_line == 0 || end_line < start_line {
            return None;
        }
        return Some(Self {
            end_line,
            kind,
            start_line,
        });
    }
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            let can_pop = matches!(
                components.last(),
                Some(c) if !matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
            );
            if can_pop {
                components.pop();
            } else if !matches!(components.last(), Some(Component::RootDir)) {
                components.push(component);
            }
        },
        other => components.push(other),
    }
    return;
}
