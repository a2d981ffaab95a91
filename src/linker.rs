//! Cross-linking of dependencies within a batch, and the HTML document shell.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::annotator::{COMMENTS_TAG, escape_html};
use crate::types::{FileIdentity, ScopeKind};

/// Toggle buttons in display order: (region tag, label).
const TOGGLES: [(&str, &str); 3] = [
    (COMMENTS_TAG, "Comments"),
    (ScopeKind::Class.tag(), "Classes"),
    (ScopeKind::Function.tag(), "Functions"),
];

/// Suffix of every published page.
pub const PAGE_SUFFIX: &str = ".html";

/// Wraps annotated bodies in a page and links the dependencies that are
/// published in the same batch.
#[derive(Debug)]
pub struct CrossLinker<'a> {
    /// Files converted together in this run.
    batch: &'a HashSet<FileIdentity>,
    /// Relative location of published pages, ending in `/`.
    link_prefix: String,
    /// Reference to the toggle script, emitted verbatim in the head.
    script_src: String,
}

/// One rendered dependency hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyLink {
    /// Target page, `<prefix><base name>.html`.
    pub href: String,
    /// Visible text, the target's base name.
    pub label: String,
}

impl<'a> CrossLinker<'a> {
    /// Links for every target that is a member of the batch, in target order.
    /// Targets outside the batch are omitted without error.
    pub fn links(&self, targets: &[FileIdentity]) -> Vec<DependencyLink> {
        return targets
            .iter()
            .filter(|target| return self.batch.contains(*target))
            .map(|target| {
                let base = target.base_name();
                return DependencyLink {
                    href: format!("{}{base}{PAGE_SUFFIX}", self.link_prefix),
                    label: base,
                };
            })
            .collect();
    }

    /// A linker for one batch.
    pub fn new(batch: &'a HashSet<FileIdentity>, link_prefix: &str, script_src: &str) -> Self {
        let mut link_prefix = link_prefix.to_string();
        if !link_prefix.is_empty() && !link_prefix.ends_with('/') {
            link_prefix.push('/');
        }
        return Self {
            batch,
            link_prefix,
            script_src: script_src.to_string(),
        };
    }

    /// Build the full page for `file`: head, toggle bar, dependency list
    /// (only when at least one target resolves within the batch), and the
    /// annotated body in a `<pre>` block.
    pub fn wrap(&self, file: &FileIdentity, body: &[String], targets: &[FileIdentity]) -> String {
        let title = escape_attribute(&file.base_name());
        let body_len: usize = body.iter().map(|line| return line.len().saturating_add(1)).sum();
        let mut page = String::with_capacity(body_len.saturating_add(1024));

        write_head(&mut page, &title, &escape_attribute(&self.script_src));
        write_toggles(&mut page);

        let links = self.links(targets);
        if links.is_empty() {
            tracing::debug!(%file, "no dependencies in batch, skipping dependency links");
        } else {
            write_dependency_links(&mut page, &links);
        }

        page.push_str("    <pre>\n");
        for line in body {
            page.push_str(line);
            page.push('\n');
        }
        page.push_str("    </pre>\n  </body>\n</html>\n");
        return page;
    }
}

/// Dependency list header and one anchor per link.
fn write_dependency_links(page: &mut String, links: &[DependencyLink]) {
    page.push_str("    <h3>Dependencies:\n");
    for link in links {
        let _ = writeln!(
            page,
            "      <a href=\"{}\">{}</a>&nbsp;",
            escape_attribute(&link.href),
            escape_attribute(&link.label)
        );
    }
    page.push_str("    </h3>\n");
    return;
}

/// Escape text placed in an attribute or element outside the `<pre>` body:
/// `&` and `"` as well as angle brackets.
fn escape_attribute(text: &str) -> String {
    return escape_html(&text.replace('&', "&amp;").replace('"', "&quot;"));
}

/// Doctype, title, inline style, and the toggle script reference.
fn write_head(page: &mut String, title: &str, script_src: &str) {
    let _ = write!(
        page,
        "\
<!DOCTYPE html>
<html>
  <head>
    <meta charset=\"utf-8\">
    <title>{title}</title>
    <style>
      body {{
        padding: 15px 40px;
        font-family: Consolas, monospace;
        font-size: 1.25em;
        font-weight: normal;
      }}
      div.comments, div.class, div.function {{
        display: inline;
      }}
    </style>
    <script src=\"{script_src}\"></script>
  </head>

  <body>
"
    );
    return;
}

/// Button bar with one toggle per region tag.
fn write_toggles(page: &mut String) {
    page.push_str("    <div class=\"toggles\">\n");
    for (tag, label) in TOGGLES {
        let _ = writeln!(
            page,
            "      <button onclick=\"toggleVisibility('{tag}');\">{label}</button>&nbsp;"
        );
    }
    page.push_str("    </div>\n");
    return;
}
