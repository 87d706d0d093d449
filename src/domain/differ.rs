/// API Surface Differ
///
/// Compares the surface declared by the stubs ("expected") with the surface
/// captured from the host ("actual").

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::surface::SurfaceSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Members starting with this prefix are ignored on both sides.
    /// An empty prefix disables filtering.
    pub private_prefix: String,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            private_prefix: "_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Declared by the stubs, missing from the host
    Added,
    /// Present in the host, missing from the stubs
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub module: String,
    pub name: String,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            DiffKind::Added => "++",
            DiffKind::Removed => "--",
        };
        write!(f, "{} {}.{}", marker, self.module, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceDiff {
    entries: Vec<DiffEntry>,
}

impl SurfaceDiff {
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn has_differences(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn added(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(|e| e.kind == DiffKind::Added)
    }

    pub fn removed(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(|e| e.kind == DiffKind::Removed)
    }
}

impl fmt::Display for SurfaceDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Diff two snapshots.
///
/// Modules are visited in `expected`'s order, followed by modules only
/// `actual` has. Within a module, added names come first, then removed
/// names, each alphabetically. A module missing from one side counts as
/// having no members there.
pub fn diff_surfaces(
    expected: &SurfaceSnapshot,
    actual: &SurfaceSnapshot,
    options: &DiffOptions,
) -> SurfaceDiff {
    let empty = BTreeSet::new();
    let mut entries = Vec::new();

    let modules = expected
        .modules()
        .chain(actual.modules().filter(|m| !expected.contains_module(m)));

    for module in modules {
        let stub = expected.members(module).unwrap_or(&empty);
        let live = actual.members(module).unwrap_or(&empty);
        let is_public = |name: &&String| {
            options.private_prefix.is_empty() || !name.starts_with(&options.private_prefix)
        };

        for name in stub.iter().filter(is_public).filter(|n| !live.contains(*n)) {
            entries.push(DiffEntry {
                kind: DiffKind::Added,
                module: module.to_string(),
                name: name.clone(),
            });
        }
        for name in live.iter().filter(is_public).filter(|n| !stub.contains(*n)) {
            entries.push(DiffEntry {
                kind: DiffKind::Removed,
                module: module.to_string(),
                name: name.clone(),
            });
        }
    }

    SurfaceDiff { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(module: &str, names: &[&str]) -> SurfaceSnapshot {
        let mut snap = SurfaceSnapshot::new();
        snap.insert_module(module, names.iter().copied());
        snap
    }

    #[test]
    fn test_added_member() {
        let diff = diff_surfaces(
            &snapshot("midi", &["A", "B"]),
            &snapshot("midi", &["A"]),
            &DiffOptions::default(),
        );
        assert!(diff.has_differences());
        assert_eq!(diff.to_string(), "++ midi.B\n");
        assert_eq!(diff.removed().count(), 0);
    }

    #[test]
    fn test_private_names_filtered_on_both_sides() {
        let diff = diff_surfaces(
            &snapshot("midi", &["A", "_hidden"]),
            &snapshot("midi", &["A", "__live_only"]),
            &DiffOptions::default(),
        );
        assert!(!diff.has_differences());
    }

    #[test]
    fn test_empty_prefix_disables_filter() {
        let options = DiffOptions {
            private_prefix: String::new(),
        };
        let diff = diff_surfaces(&snapshot("midi", &["A", "_hidden"]), &snapshot("midi", &["A"]), &options);
        assert_eq!(diff.entries().len(), 1);
    }

    #[test]
    fn test_ordering_is_module_then_alphabetical() {
        let mut expected = SurfaceSnapshot::new();
        expected.insert_module("ui", ["zoom", "alpha"]);
        expected.insert_module("mixer", ["x"]);
        let mut actual = SurfaceSnapshot::new();
        actual.insert_module("mixer", ["y"]);
        actual.insert_module("ui", ["beta"]);

        let lines: Vec<String> = diff_surfaces(&expected, &actual, &DiffOptions::default())
            .entries()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            lines,
            vec!["++ ui.alpha", "++ ui.zoom", "-- ui.beta", "++ mixer.x", "-- mixer.y"]
        );
    }

    #[test]
    fn test_module_missing_on_one_side() {
        let diff = diff_surfaces(
            &snapshot("ui", &["a"]),
            &snapshot("screen", &["b"]),
            &DiffOptions::default(),
        );
        let lines: Vec<String> = diff.entries().iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec!["++ ui.a", "-- screen.b"]);
    }
}
