use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory names never descended into.
const IGNORED_DIRS: &[&str] = &["__pycache__", ".git", ".mypy_cache"];

pub struct SourceTree;

impl SourceTree {
    /// List every file below `root`, as sorted paths relative to `root`.
    pub fn collect(root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            anyhow::bail!("Source directory {} does not exist", root.display());
        }
        let mut files = Vec::new();
        Self::collect_recursive(root, root, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn collect_recursive(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                let ignored = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| IGNORED_DIRS.contains(&n))
                    .unwrap_or(false);
                if !ignored {
                    Self::collect_recursive(root, &path, out)?;
                }
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
        Ok(())
    }

    /// Remove `dir` if it exists and create it empty.
    pub fn reset_dir(dir: &Path) -> Result<()> {
        if dir.exists() {
            fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
        }
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
    }

    /// Whether one of the two directories contains the other. A path that
    /// does not exist yet is resolved through its nearest existing ancestor.
    pub fn overlaps(a: &Path, b: &Path) -> Result<bool> {
        let a = Self::resolve(a)?;
        let b = Self::resolve(b)?;
        Ok(a.starts_with(&b) || b.starts_with(&a))
    }

    fn resolve(path: &Path) -> Result<PathBuf> {
        let mut existing = path;
        let mut rest = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    rest.push(name.to_os_string());
                    existing = parent;
                }
                _ => break,
            }
        }
        let base = if existing.as_os_str().is_empty() {
            Path::new(".")
        } else {
            existing
        };
        let mut resolved = base
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        resolved.extend(rest.iter().rev());
        Ok(resolved)
    }

    /// Write `contents` to `root/relative`, creating parent directories.
    pub fn write_file(root: &Path, relative: &Path, contents: &[u8]) -> Result<()> {
        let target = root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&target, contents).with_context(|| format!("Failed to write {}", target.display()))
    }

    /// Files under `src` that already exist at the same relative path in `dest`.
    pub fn find_duplicates(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        Ok(Self::collect(src)?
            .into_iter()
            .map(|relative| dest.join(relative))
            .filter(|target| target.exists())
            .collect())
    }

    /// Copy every file of `src` into `dest`, returning the number copied.
    pub fn merge_dir(src: &Path, dest: &Path) -> Result<usize> {
        let files = Self::collect(src)?;
        for relative in &files {
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::copy(src.join(relative), &target)
                .with_context(|| format!("Failed to copy into {}", target.display()))?;
        }
        Ok(files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_skips_caches() {
        let dir = tempdir().unwrap();
        SourceTree::write_file(dir.path(), Path::new("midi/__init__.py"), b"").unwrap();
        SourceTree::write_file(dir.path(), Path::new("midi/__pycache__/x.pyc"), b"").unwrap();
        SourceTree::write_file(dir.path(), Path::new("a.md"), b"").unwrap();

        let files = SourceTree::collect(dir.path()).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.md"), PathBuf::from("midi/__init__.py")]);
    }

    #[test]
    fn test_overlapping_directories() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        SourceTree::write_file(&src, Path::new("m/__init__.py"), b"").unwrap();

        assert!(SourceTree::overlaps(&src, &src).unwrap());
        assert!(SourceTree::overlaps(&src, &src.join("build")).unwrap());
        assert!(SourceTree::overlaps(&src.join("m"), &src).unwrap());
        assert!(!SourceTree::overlaps(&src, &dir.path().join("build_lib")).unwrap());
    }

    #[test]
    fn test_find_duplicates_and_merge() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        SourceTree::write_file(src.path(), Path::new("index.md"), b"human").unwrap();
        SourceTree::write_file(src.path(), Path::new("tutorials/intro.md"), b"intro").unwrap();
        SourceTree::write_file(dest.path(), Path::new("index.md"), b"generated").unwrap();

        let dups = SourceTree::find_duplicates(src.path(), dest.path()).unwrap();
        assert_eq!(dups, vec![dest.path().join("index.md")]);

        fs::remove_file(dest.path().join("index.md")).unwrap();
        assert_eq!(SourceTree::merge_dir(src.path(), dest.path()).unwrap(), 2);
        assert_eq!(fs::read_to_string(dest.path().join("tutorials/intro.md")).unwrap(), "intro");
    }
}
