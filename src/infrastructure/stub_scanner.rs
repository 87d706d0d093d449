//! Stub Surface Scanner
//!
//! Builds the *expected* API surface from the stub package on disk. The
//! source root holds one directory per documentation section, and each
//! section holds the module packages (or single-file modules) it documents.
//! A module's members are the names listed in its `__all__` when it has
//! one, otherwise the names its entry file binds at top level.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::surface::SurfaceSnapshot;
use crate::ports::SurfaceSource;

/// A module found in the stub tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubModule {
    pub name: String,
    /// Section directory the module lives in
    pub section: String,
    /// Package `__init__.py` or single-file module path
    pub entry_file: PathBuf,
}

pub struct StubSurfaceScanner {
    root: PathBuf,
}

impl StubSurfaceScanner {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// All modules in the stub tree, sorted by section then name.
    pub fn discover_modules(&self) -> Result<Vec<StubModule>> {
        let mut modules = Vec::new();

        for section in sorted_entries(&self.root)? {
            if !section.is_dir() || is_private_entry(&section) {
                continue;
            }
            let section_name = file_name(&section);

            for entry in sorted_entries(&section)? {
                if is_private_entry(&entry) {
                    continue;
                }
                let init = entry.join("__init__.py");
                if entry.is_dir() && init.is_file() {
                    modules.push(StubModule {
                        name: file_name(&entry),
                        section: section_name.clone(),
                        entry_file: init,
                    });
                } else if entry.extension().and_then(|e| e.to_str()) == Some("py") {
                    let name = entry
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    modules.push(StubModule {
                        name,
                        section: section_name.clone(),
                        entry_file: entry,
                    });
                }
            }
        }

        Ok(modules)
    }
}

impl SurfaceSource for StubSurfaceScanner {
    fn load(&self) -> Result<SurfaceSnapshot> {
        let mut snapshot = SurfaceSnapshot::new();
        for module in self.discover_modules()? {
            let source = fs::read_to_string(&module.entry_file)
                .with_context(|| format!("Failed to read {}", module.entry_file.display()))?;
            let members = scan_module_members(&source);
            tracing::debug!("{}: {} member(s)", module.name, members.len());
            snapshot.insert_module(module.name, members);
        }
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("stubs in {}", self.root.display())
    }
}

/// Public names of a Python module: its `__all__` entries if it declares
/// `__all__`, otherwise every name bound at the top level.
pub fn scan_module_members(source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut exported: Option<BTreeSet<String>> = None;
    let mut in_docstring: Option<&str> = None;
    let mut lines = source.lines();

    while let Some(line) = lines.next() {
        if let Some(quote) = in_docstring {
            if line.matches(quote).count() % 2 == 1 {
                in_docstring = None;
            }
            continue;
        }

        // Only unindented lines bind module-level names
        if line.starts_with(char::is_whitespace) || line.starts_with('#') || line.is_empty() {
            continue;
        }
        let trimmed = line.trim_end();

        if let Some(quote) = ["\"\"\"", "'''"].into_iter().find(|q| trimmed.starts_with(q)) {
            if trimmed.matches(quote).count() % 2 == 1 {
                in_docstring = Some(quote);
            }
            continue;
        }

        if let Some(rest) = trimmed
            .strip_prefix("def ")
            .or_else(|| trimmed.strip_prefix("async def "))
            .or_else(|| trimmed.strip_prefix("class "))
        {
            if let Some(name) = leading_ident(rest) {
                names.insert(name.to_string());
            }
            continue;
        }

        if trimmed.starts_with("from ") {
            if let Some((_, imported)) = trimmed.split_once(" import ") {
                let mut list = strip_comment(imported).to_string();
                if list.trim_start().starts_with('(') && !list.contains(')') {
                    for cont in lines.by_ref() {
                        let cont = strip_comment(cont);
                        list.push(' ');
                        list.push_str(cont);
                        if cont.contains(')') {
                            break;
                        }
                    }
                }
                names.extend(import_names(&list));
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("import ") {
            for module in rest.split(',') {
                let bound = match module.split_once(" as ") {
                    Some((_, alias)) => alias.trim(),
                    None => module.trim().split('.').next().unwrap_or(""),
                };
                if !bound.is_empty() {
                    names.insert(bound.to_string());
                }
            }
            continue;
        }

        if let Some(name) = leading_ident(trimmed) {
            let after = trimmed[name.len()..].trim_start();
            let is_assignment = (after.starts_with('=') && !after.starts_with("=="))
                || (after.starts_with(':') && after.contains('='));
            if !is_assignment {
                continue;
            }
            if name == "__all__" {
                let mut listing = after.to_string();
                let closer = if listing.contains('(') { ')' } else { ']' };
                if !listing.contains(closer) {
                    for cont in lines.by_ref() {
                        listing.push('\n');
                        listing.push_str(cont);
                        if cont.contains(closer) {
                            break;
                        }
                    }
                }
                exported
                    .get_or_insert_with(BTreeSet::new)
                    .extend(quoted_strings(&listing));
            }
            names.insert(name.to_string());
        }
    }

    exported.unwrap_or(names)
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("")
}

fn leading_ident(s: &str) -> Option<&str> {
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c == '_' || c.is_alphabetic() || (i > 0 && c.is_ascii_digit())))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}

/// Bound names of an import list: `a, b as c` or `(a, b,)`.
fn import_names(list: &str) -> Vec<String> {
    list.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .filter_map(|item| {
            let item = item.trim();
            let bound = match item.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => item,
            };
            (!bound.is_empty() && bound != "*").then(|| bound.to_string())
        })
        .collect()
}

fn quoted_strings(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\'' || c == '"' {
            let value: String = chars.by_ref().take_while(|&x| x != c).collect();
            out.push(value);
        }
    }
    out
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_private_entry(path: &Path) -> bool {
    let name = file_name(path);
    name.starts_with('_') || name.starts_with('.')
}
