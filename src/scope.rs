//! Flattening of a parsed scope tree into per-kind line intervals.

use crate::types::{NodeKind, ScopeKind, ScopeNode, ScopeSpan};

/// Class and function intervals of one file. Built once per parse and never
/// merged across files. Spans may nest or overlap freely.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScopeIndex {
    /// Class spans in pre-order traversal order.
    classes: Vec<ScopeSpan>,
    /// Function spans in pre-order traversal order.
    functions: Vec<ScopeSpan>,
}

impl ScopeIndex {
    /// Visit every node of `tree` regardless of depth and record a span for
    /// each class or function node. Traversal is pre-order, parents before
    /// children, siblings in source order.
    pub fn build(tree: &ScopeNode) -> Self {
        let mut index = Self::default();
        index.visit(tree);
        return index;
    }

    /// Class spans in traversal order.
    pub fn classes(&self) -> &[ScopeSpan] {
        return &self.classes;
    }

    /// Function spans in traversal order.
    pub fn functions(&self) -> &[ScopeSpan] {
        return &self.functions;
    }

    /// True when the file declares no classes and no functions.
    pub fn is_empty(&self) -> bool {
        return self.classes.is_empty() && self.functions.is_empty();
    }

    /// Every span, classes first then functions. This is the marker insertion order.
    pub fn spans(&self) -> impl Iterator<Item = &ScopeSpan> {
        return self.classes.iter().chain(self.functions.iter());
    }

    /// Record `node` if it is a class or function, then descend.
    fn visit(&mut self, node: &ScopeNode) {
        let kind = match node.kind {
            NodeKind::Class => Some(ScopeKind::Class),
            NodeKind::Function => Some(ScopeKind::Function),
            NodeKind::Global | NodeKind::Namespace => None,
        };

        if let Some(kind) = kind {
            match ScopeSpan::new(kind, node.start_line, node.end_line) {
                None => tracing::debug!(
                    start = node.start_line,
                    end = node.end_line,
                    "skipping scope with invalid line range"
                ),
                Some(span) if kind == ScopeKind::Class => self.classes.push(span),
                Some(span) => self.functions.push(span),
            }
        }

        for child in &node.children {
            self.visit(child);
        }
        return;
    }
}
