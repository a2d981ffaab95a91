//! Line-by-line rendering of source text: HTML escaping plus collapsible
//! comment, class, and function region markers.
//!
//! Markers for a line are planned as insertions against the escaped text and
//! applied in one pass. At a shared position they are emitted by phase:
//! comment close, scope closes, scope opens, closes of spans opened on the
//! same line, comment open. Within a phase, class spans come before function
//! spans, each in scope-tree traversal order.

use std::collections::HashMap;

use crate::lexer::{self, CommentKind, LineScan};
use crate::scope::ScopeIndex;
use crate::types::{ScopeKind, ScopeSpan};

/// Closing marker shared by every region kind.
const CLOSE_MARKER: &str = "</div>";

/// Opening marker for comment regions.
const COMMENT_MARKER: &str = r#"<div class="comments">"#;

/// Region tag for comments, matching the toggle button target.
pub const COMMENTS_TAG: &str = "comments";

/// Ordering of markers that land on the same byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    /// End of a comment region at end of line.
    CommentClose,
    /// End of a scope opened on an earlier line.
    ScopeClose,
    /// Start of a class or function region.
    ScopeOpen,
    /// End of a scope that also opened on this line.
    InlineScopeClose,
    /// Start of a comment region.
    CommentOpen,
}

/// A marker to splice into the escaped line.
#[derive(Debug)]
struct Insertion {
    /// Tie-breaker at equal positions.
    phase: Phase,
    /// Byte offset into the escaped line.
    position: usize,
    /// Marker text.
    text: &'static str,
}

/// Stateful renderer for one file. Carries open block comments across lines.
#[derive(Debug)]
pub struct Annotator {
    /// Spans keyed by their closing line, in marker insertion order.
    closes: HashMap<usize, Vec<ScopeSpan>>,
    /// Whether a `/*` region is open from an earlier line.
    in_block_comment: bool,
    /// Spans keyed by their opening line, in marker insertion order.
    opens: HashMap<usize, Vec<ScopeSpan>>,
}

impl Annotator {
    /// Transform one line. `number` is one-based and must increase by one per call.
    pub fn annotate_line(&mut self, number: usize, raw: &str) -> String {
        let escaped = escape_html(raw);
        let scan = lexer::scan_line(&escaped);
        let end = escaped.len();

        let mut insertions = Vec::new();
        self.plan_comment(&scan, end, &mut insertions);
        self.plan_scopes(number, &scan, end, &mut insertions);

        return apply_insertions(&escaped, insertions);
    }

    /// Index the spans of one file by opening and closing line.
    pub fn new(scopes: &ScopeIndex) -> Self {
        let mut opens: HashMap<usize, Vec<ScopeSpan>> = HashMap::new();
        let mut closes: HashMap<usize, Vec<ScopeSpan>> = HashMap::new();
        for span in scopes.spans() {
            opens.entry(span.start_line).or_default().push(*span);
            closes.entry(span.end_line).or_default().push(*span);
        }
        return Self {
            closes,
            in_block_comment: false,
            opens,
        };
    }

    /// Plan the comment region markers for a line.
    fn plan_comment(&mut self, scan: &LineScan, end: usize, insertions: &mut Vec<Insertion>) {
        if self.in_block_comment {
            // Inside an open block only its end matters; a `//` here opens nothing.
            if scan.trailing_block_close.is_some() {
                insertions.push(Insertion {
                    phase: Phase::CommentClose,
                    position: end,
                    text: CLOSE_MARKER,
                });
                self.in_block_comment = false;
            }
            return;
        }

        let Some(open) = scan.comment else {
            return;
        };
        insertions.push(Insertion {
            phase: Phase::CommentOpen,
            position: open.position,
            text: COMMENT_MARKER,
        });

        let closes_here = match open.kind {
            CommentKind::Block => scan.closes_own_block(),
            CommentKind::Line => true,
        };
        if closes_here {
            insertions.push(Insertion {
                phase: Phase::CommentClose,
                position: end,
                text: CLOSE_MARKER,
            });
        } else {
            self.in_block_comment = true;
        }
        return;
    }

    /// Plan class and function markers for spans opening or closing on this line.
    fn plan_scopes(&self, number: usize, scan: &LineScan, end: usize, insertions: &mut Vec<Insertion>) {
        for span in self.opens.get(&number).map(Vec::as_slice).unwrap_or_default() {
            let position = scan.brace_open.map_or(end, |brace| return brace.saturating_add(1));
            insertions.push(Insertion {
                phase: Phase::ScopeOpen,
                position,
                text: scope_marker(span.kind),
            });
        }

        for span in self.closes.get(&number).map(Vec::as_slice).unwrap_or_default() {
            let Some(position) = scan.brace_close else {
                tracing::debug!(line = number, kind = span.kind.tag(), "no closing brace on scope end line");
                continue;
            };
            let phase = if span.start_line == number {
                Phase::InlineScopeClose
            } else {
                Phase::ScopeClose
            };
            insertions.push(Insertion {
                phase,
                position,
                text: CLOSE_MARKER,
            });
        }
        return;
    }

    /// Transform every line of `source`. Output has exactly one entry per input line.
    pub fn render(mut self, source: &str) -> Vec<String> {
        return source
            .lines()
            .enumerate()
            .map(|(idx, line)| return self.annotate_line(idx.saturating_add(1), line))
            .collect();
    }
}

/// Splice planned markers into the escaped line.
fn apply_insertions(escaped: &str, mut insertions: Vec<Insertion>) -> String {
    if insertions.is_empty() {
        return escaped.to_string();
    }

    // Stable: equal (position, phase) keep their planning order.
    insertions.sort_by_key(|insertion| return (insertion.position, insertion.phase));

    let extra: usize = insertions.iter().map(|insertion| return insertion.text.len()).sum();
    let mut out = String::with_capacity(escaped.len().saturating_add(extra));
    let mut cursor = 0_usize;
    for insertion in &insertions {
        out.push_str(escaped.get(cursor..insertion.position).unwrap_or_default());
        out.push_str(insertion.text);
        cursor = insertion.position;
    }
    out.push_str(escaped.get(cursor..).unwrap_or_default());
    return out;
}

/// Replace every `<` with `&lt;` and every `>` with `&gt;`.
pub fn escape_html(line: &str) -> String {
    return line.replace('<', "&lt;").replace('>', "&gt;");
}

/// Opening marker for a scope kind.
const fn scope_marker(kind: ScopeKind) -> &'static str {
    return match kind {
        ScopeKind::Class => r#"<div class="class">"#,
        ScopeKind::Function => r#"<div class="function">"#,
    };
}
