//! Dependency graph: which file points to which, with set semantics per source.

use std::collections::HashMap;
use std::fmt;

use crate::error::Error;
use crate::grammar;
use crate::types::FileIdentity;

/// Mapping from a file to the ordered, de-duplicated files it depends on.
///
/// Cycles and self-edges are valid states. Entries are only dropped by
/// `remove_entry` or `clear`, never because their sequence became empty.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Per-source target sequences. No sequence holds the same target twice.
    table: HashMap<FileIdentity, Vec<FileIdentity>>,
}

impl DependencyGraph {
    /// Insert `target` into `source`'s sequence if absent, creating the entry
    /// for `source` if needed. `target` is not required to be a key.
    pub fn add(&mut self, source: &FileIdentity, target: &FileIdentity) {
        tracing::debug!(%source, %target, "adding dependency");
        let targets = self.table.entry(source.clone()).or_default();
        if !targets.contains(target) {
            targets.push(target.clone());
        }
        return;
    }

    /// Drop every entry. Used to reset state between independent batch runs.
    pub fn clear(&mut self) {
        self.table.clear();
        return;
    }

    /// Dependencies of `source` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownDependencyKey` if `source` was never added.
    /// Guard with `has` when absence is expected.
    pub fn get(&self, source: &FileIdentity) -> Result<&[FileIdentity], Error> {
        return self
            .table
            .get(source)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                return Error::UnknownDependencyKey {
                    file: source.as_path().to_path_buf(),
                };
            });
    }

    /// Membership test for `source` as a key.
    pub fn has(&self, source: &FileIdentity) -> bool {
        return self.table.contains_key(source);
    }

    /// Pre-seed an entry for `source` with no dependencies. Existing entries are untouched.
    pub fn insert_file(&mut self, source: &FileIdentity) {
        self.table.entry(source.clone()).or_default();
        return;
    }

    /// True when no source has been added.
    pub fn is_empty(&self) -> bool {
        return self.table.is_empty();
    }

    /// All known sources. Order is arbitrary but stable within one pass.
    pub fn keys(&self) -> impl Iterator<Item = &FileIdentity> {
        return self.table.keys();
    }

    /// Number of known sources.
    pub fn len(&self) -> usize {
        return self.table.len();
    }

    /// Remove `target` from `source`'s sequence if present. The key stays even
    /// when its sequence becomes empty.
    pub fn remove(&mut self, source: &FileIdentity, target: &FileIdentity) {
        tracing::debug!(%source, %target, "removing dependency");
        if let Some(targets) = self.table.get_mut(source) {
            targets.retain(|t| return t != target);
        }
        return;
    }

    /// Drop `source` and its whole sequence.
    pub fn remove_entry(&mut self, source: &FileIdentity) {
        self.table.remove(source);
        return;
    }
}

impl fmt::Display for DependencyGraph {
    /// Keys sorted by path, each followed by its targets in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&FileIdentity> = self.table.keys().collect();
        keys.sort();
        for key in keys {
            writeln!(f, "-- {key}")?;
            for target in self.table.get(key).map(Vec::as_slice).unwrap_or_default() {
                writeln!(f, "   -> {target}")?;
            }
        }
        return Ok(());
    }
}

/// Resolve a raw dependency token against the directory of the file that contains it.
///
/// The joined path is normalized lexically. If that path does not exist and
/// carries no extension, the source language's extensions are tried in order
/// and the first existing candidate wins.
pub fn resolve_token(source: &FileIdentity, token: &str) -> FileIdentity {
    let dir = source.as_path().parent().unwrap_or_else(|| return std::path::Path::new("/"));
    let resolved = FileIdentity::from_absolute(&dir.join(token));
    if resolved.as_path().exists() || resolved.as_path().extension().is_some() {
        return resolved;
    }

    let Ok(language) = grammar::language_for_path(source.as_path()) else {
        return resolved;
    };
    for ext in language.candidate_extensions() {
        let candidate = resolved.as_path().with_extension(ext);
        if candidate.exists() {
            return FileIdentity::from_absolute(&candidate);
        }
    }
    return resolved;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use std::path::Path;

    use super::*;

    fn id(name: &str) -> FileIdentity {
        return FileIdentity::from_absolute(&Path::new("/proj").join(name));
    }

    #[test]
    fn add_twice_keeps_one_occurrence() {
        let mut graph = DependencyGraph::default();
        graph.add(&id("a.cpp"), &id("a.h"));
        graph.add(&id("a.cpp"), &id("a.h"));
        assert_eq!(graph.get(&id("a.cpp")).unwrap(), &[id("a.h")]);
    }

    #[test]
    fn remove_absent_pair_is_a_no_op() {
        let mut graph = DependencyGraph::default();
        graph.add(&id("a.cpp"), &id("a.h"));
        graph.remove(&id("a.cpp"), &id("b.h"));
        graph.remove(&id("zzz.cpp"), &id("a.h"));
        assert_eq!(graph.get(&id("a.cpp")).unwrap(), &[id("a.h")]);
        assert!(!graph.has(&id("zzz.cpp")));
    }

    #[test]
    fn removing_last_target_keeps_the_key() {
        let mut graph = DependencyGraph::default();
        graph.add(&id("a.cpp"), &id("a.h"));
        graph.remove(&id("a.cpp"), &id("a.h"));
        assert!(graph.has(&id("a.cpp")));
        assert!(graph.get(&id("a.cpp")).unwrap().is_empty());
    }

    #[test]
    fn get_unknown_key_fails() {
        let graph = DependencyGraph::default();
        let err = graph.get(&id("never.cpp")).unwrap_err();
        assert!(matches!(err, Error::UnknownDependencyKey { .. }));
    }

    #[test]
    fn cyclic_edges_round_trip() {
        let (a, b, c, d, e) = (id("A"), id("B"), id("C"), id("D"), id("E"));
        let mut graph = DependencyGraph::default();
        graph.add(&a, &b);
        graph.add(&a, &c);
        graph.add(&c, &b);
        graph.add(&d, &b);
        graph.add(&e, &a);
        graph.add(&b, &e);
        graph.add(&c, &e);
        graph.add(&e, &e);
        graph.remove(&e, &e);

        assert_eq!(graph.get(&a).unwrap(), &[b.clone(), c.clone()]);
        assert_eq!(graph.get(&b).unwrap(), &[e.clone()]);
        assert_eq!(graph.get(&c).unwrap(), &[b.clone(), e.clone()]);
        assert_eq!(graph.get(&d).unwrap(), &[b.clone()]);
        assert_eq!(graph.get(&e).unwrap(), &[a.clone()]);

        let edges: usize = graph.keys().map(|k| return graph.get(k).unwrap().len()).sum();
        assert_eq!(edges, 7);
    }

    #[test]
    fn clear_and_remove_entry_drop_keys() {
        let mut graph = DependencyGraph::default();
        graph.add(&id("a"), &id("b"));
        graph.insert_file(&id("c"));
        assert_eq!(graph.len(), 2);

        graph.remove_entry(&id("a"));
        assert!(!graph.has(&id("a")));

        graph.clear();
        assert!(graph.is_empty());
    }

    #[test]
    fn insert_file_does_not_reset_existing_targets() {
        let mut graph = DependencyGraph::default();
        graph.add(&id("a"), &id("b"));
        graph.insert_file(&id("a"));
        assert_eq!(graph.get(&id("a")).unwrap(), &[id("b")]);
    }

    #[test]
    fn display_lists_sorted_keys() {
        let mut graph = DependencyGraph::default();
        graph.add(&id("z.cpp"), &id("z.h"));
        graph.insert_file(&id("a.cpp"));
        let rendered = graph.to_string();
        assert_eq!(rendered, "-- /proj/a.cpp\n-- /proj/z.cpp\n   -> /proj/z.h\n");
    }

    #[test]
    fn tokens_resolve_relative_to_the_including_file() {
        let source = id("src/Converter.cpp");
        assert_eq!(resolve_token(&source, "../include/Table.h"), id("include/Table.h"));
        assert_eq!(resolve_token(&source, "Converter.h"), id("src/Converter.h"));
    }

    #[test]
    fn extensionless_tokens_try_language_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let root = FileIdentity::from_path(dir.path()).unwrap();
        std::fs::write(root.as_path().join("helper.ts"), "export const x = 1;\n").unwrap();
        let source = FileIdentity::from_absolute(&root.as_path().join("main.ts"));

        let resolved = resolve_token(&source, "./helper");
        assert_eq!(resolved, FileIdentity::from_absolute(&root.as_path().join("helper.ts")));
    }
}
