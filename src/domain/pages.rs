/// Documentation Page Tree
///
/// Plans the Markdown skeleton handed to the site generator: one page per
/// stub submodule, and an `index.md` plus `.pages` navigation file per
/// package. Page bodies are `::: dotted.identifier` directives that the
/// generator fills in from the transformed stub source.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A page to write, relative to the documentation build directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    pub path: PathBuf,
    pub contents: String,
}

/// Nested package/module layout. Leaves ending in `.py` are module files;
/// everything else is a package directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleTree {
    children: BTreeMap<String, ModuleTree>,
}

impl ModuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tree from Python source paths relative to the source root.
    ///
    /// `__init__.py` stands for its package directory. Any path passing
    /// through a component listed in `skipped` is left out.
    pub fn from_sources<'a, I>(paths: I, skipped: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut tree = Self::new();
        for path in paths {
            if path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }
            let is_skipped = path
                .components()
                .any(|c| skipped.iter().any(|s| c.as_os_str() == s.as_str()));
            if is_skipped {
                continue;
            }

            if path.file_name().and_then(|n| n.to_str()) == Some("__init__.py") {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tree.add_path(parent);
                }
            } else {
                tree.add_path(path);
            }
        }
        tree
    }

    pub fn add_path(&mut self, path: &Path) {
        let mut node = self;
        for part in path.components() {
            let key = part.as_os_str().to_string_lossy().into_owned();
            node = node.children.entry(key).or_default();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ModuleTree> {
        self.children.get(name)
    }
}

/// `__script_dialog.py` -> `script dialog.md`
pub fn py_path_to_md(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('_', " ").trim().to_string())
        .unwrap_or_default();
    path.with_file_name(name).with_extension("md")
}

/// Plan every page for `tree`, placing them under `output_base`.
pub fn plan_pages(tree: &ModuleTree, output_base: &Path) -> Vec<GeneratedPage> {
    let mut pages = Vec::new();
    plan_node(tree, Path::new(""), output_base, &mut pages);
    pages
}

fn plan_node(tree: &ModuleTree, mod_path: &Path, output_base: &Path, pages: &mut Vec<GeneratedPage>) {
    let is_module_file = mod_path.extension().and_then(|e| e.to_str()) == Some("py");

    if is_module_file {
        pages.push(GeneratedPage {
            path: py_path_to_md(&output_base.join(mod_path)),
            contents: format!("::: {}\n", identifier(mod_path)),
        });
        return;
    }

    if let Some(name) = mod_path.file_name() {
        let dir = output_base.join(mod_path);
        pages.push(GeneratedPage {
            path: dir.join(".pages"),
            contents: format!(
                "nav:\n  - {}: index.md\n  - ...\n",
                capitalize(&name.to_string_lossy())
            ),
        });

        let mut index = format!("::: {}\n", identifier(mod_path));
        // Submodules get their own pages, so keep members off the index
        if !tree.is_empty() {
            index.push_str("    options:\n      members: no\n");
        }
        pages.push(GeneratedPage {
            path: dir.join("index.md"),
            contents: index,
        });
    }

    for (child, subtree) in &tree.children {
        plan_node(subtree, &mod_path.join(child), output_base, pages);
    }
}

/// `arrangement/__markers.py` -> `arrangement.__markers`
fn identifier(mod_path: &Path) -> String {
    mod_path
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_path_to_md() {
        assert_eq!(
            py_path_to_md(Path::new("flpianoroll/__script_dialog.py")),
            PathBuf::from("flpianoroll/script dialog.md")
        );
        assert_eq!(py_path_to_md(Path::new("__example.py")), PathBuf::from("example.md"));
    }

    #[test]
    fn test_tree_skips_modules_and_folds_init() {
        let paths = [
            "arrangement/__init__.py",
            "arrangement/__markers.py",
            "flpianoroll/__init__.py",
            "flpianoroll/__score.py",
            "README.md",
        ];
        let tree = ModuleTree::from_sources(
            paths.iter().map(Path::new),
            &["flpianoroll".to_string()],
        );

        assert!(tree.get("flpianoroll").is_none());
        assert!(tree.get("README.md").is_none());
        let arrangement = tree.get("arrangement").unwrap();
        assert!(arrangement.get("__markers.py").is_some());
        assert!(arrangement.get("__init__.py").is_none());
    }

    #[test]
    fn test_plan_pages_for_package() {
        let mut tree = ModuleTree::new();
        tree.add_path(Path::new("arrangement/__markers.py"));
        tree.add_path(Path::new("general"));

        let pages = plan_pages(&tree, Path::new("Docs"));
        let paths: Vec<String> = pages.iter().map(|p| p.path.display().to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "Docs/arrangement/.pages",
                "Docs/arrangement/index.md",
                "Docs/arrangement/markers.md",
                "Docs/general/.pages",
                "Docs/general/index.md",
            ]
        );
        assert_eq!(pages[0].contents, "nav:\n  - Arrangement: index.md\n  - ...\n");
        assert_eq!(
            pages[1].contents,
            "::: arrangement\n    options:\n      members: no\n"
        );
        assert_eq!(pages[2].contents, "::: arrangement.__markers\n");
        assert_eq!(pages[4].contents, "::: general\n");
    }
}
