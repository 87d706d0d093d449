// Use cases tying the domain to the file system.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{PagesConfig, TransformConfig};
use crate::domain::differ::{diff_surfaces, DiffOptions, SurfaceDiff};
use crate::domain::error::{BatchFailure, FileFailure};
use crate::domain::pages::{plan_pages, ModuleTree};
use crate::domain::rules::RuleTable;
use crate::domain::template::TemplateEngine;
use crate::infrastructure::SourceTree;
use crate::ports::SurfaceSource;

// ═══════════════════════════════════════════════════════════════════════════
// Tree transform
// ═══════════════════════════════════════════════════════════════════════════

/// Summary of a tree transform.
#[derive(Debug, Default)]
pub struct TransformReport {
    /// Files whose tokens were expanded
    pub transformed: usize,
    /// Files copied without expansion
    pub copied: usize,
    /// Files left out of the output because of broken tokens
    pub failures: BatchFailure,
}

impl TransformReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum FileOutcome {
    Transformed,
    Copied,
    Failed(FileFailure),
}

pub struct TransformTreeUsecase<'a> {
    pub rules: &'a RuleTable,
    pub config: &'a TransformConfig,
}

impl<'a> TransformTreeUsecase<'a> {
    /// Expand every template file of `input` into `output`.
    ///
    /// Each file is independent: a broken file is reported and skipped while
    /// the rest of the tree is still written. With `force`, an existing
    /// output directory is replaced.
    pub fn run(&self, input: &Path, output: &Path, force: bool) -> Result<TransformReport> {
        if output.exists() && !force {
            anyhow::bail!(
                "Output directory {} already exists (use --force to replace it)",
                output.display()
            );
        }
        if SourceTree::overlaps(input, output)? {
            anyhow::bail!(
                "Output directory {} overlaps input directory {}",
                output.display(),
                input.display()
            );
        }
        let files = SourceTree::collect(input)?;
        SourceTree::reset_dir(output)?;
        info!("transforming {} file(s) from {}", files.len(), input.display());

        if self.rules.is_empty() {
            warn!("no rules registered, every token will fail");
        }
        let engine = TemplateEngine::new(self.rules);
        let outcomes = files
            .par_iter()
            .map(|relative| self.process_file(&engine, input, output, relative))
            .collect::<Result<Vec<_>>>()?;

        let mut report = TransformReport::default();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Transformed => report.transformed += 1,
                FileOutcome::Copied => report.copied += 1,
                FileOutcome::Failed(failure) => failures.push(failure),
            }
        }
        report.failures = BatchFailure::new(failures);

        info!(
            "transformed {} file(s), copied {}, failed {}",
            report.transformed,
            report.copied,
            report.failures.failures.len()
        );
        Ok(report)
    }

    fn process_file(
        &self,
        engine: &TemplateEngine<'_>,
        input: &Path,
        output: &Path,
        relative: &Path,
    ) -> Result<FileOutcome> {
        let source_path = input.join(relative);
        let bytes = fs::read(&source_path)
            .with_context(|| format!("Failed to read {}", source_path.display()))?;

        if !self.config.is_template(relative) {
            SourceTree::write_file(output, relative, &bytes)?;
            return Ok(FileOutcome::Copied);
        }

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("{} is not UTF-8, copying unchanged", source_path.display());
                SourceTree::write_file(output, relative, e.as_bytes())?;
                return Ok(FileOutcome::Copied);
            }
        };

        match engine.transform(&text, &source_path.display().to_string()) {
            Ok(expanded) => {
                SourceTree::write_file(output, relative, expanded.as_bytes())?;
                debug!("transformed {}", relative.display());
                Ok(FileOutcome::Transformed)
            }
            Err(failure) => Ok(FileOutcome::Failed(failure)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Stub check
// ═══════════════════════════════════════════════════════════════════════════

pub struct CheckStubsUsecase<'a> {
    /// Surface declared by the stubs
    pub expected: &'a dyn SurfaceSource,
    /// Surface captured from the host
    pub actual: &'a dyn SurfaceSource,
    pub options: DiffOptions,
    /// Restrict the check to these modules; empty means every module both
    /// sides know about
    pub modules: Vec<String>,
}

impl<'a> CheckStubsUsecase<'a> {
    pub fn run(&self) -> Result<SurfaceDiff> {
        let expected = self
            .expected
            .load()
            .with_context(|| format!("Failed to load {}", self.expected.describe()))?;
        let actual = self
            .actual
            .load()
            .with_context(|| format!("Failed to load {}", self.actual.describe()))?;

        let modules: Vec<String> = if self.modules.is_empty() {
            for m in expected.modules().filter(|m| !actual.contains_module(m)) {
                debug!("{} not present in {}, skipping", m, self.actual.describe());
            }
            for m in actual.modules().filter(|m| !expected.contains_module(m)) {
                warn!("{} has no stubs, skipping", m);
            }
            expected
                .modules()
                .filter(|m| actual.contains_module(m))
                .map(str::to_string)
                .collect()
        } else {
            self.modules.clone()
        };

        info!("comparing {} module(s)", modules.len());
        Ok(diff_surfaces(
            &expected.restricted_to(&modules),
            &actual.restricted_to(&modules),
            &self.options,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Documentation pages
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
#[error("merging human-written docs would overwrite {} file(s)", .0.len())]
pub struct DuplicateDocsError(pub Vec<PathBuf>);

#[derive(Debug, Default)]
pub struct PagesReport {
    pub generated: usize,
    pub merged: usize,
}

pub struct GeneratePagesUsecase<'a> {
    pub config: &'a PagesConfig,
}

impl<'a> GeneratePagesUsecase<'a> {
    /// Write page stubs for the modules in `prebuild` to `output`, then merge
    /// the human-written docs from `docs` on top.
    pub fn run(&self, prebuild: &Path, docs: &Path, output: &Path) -> Result<PagesReport> {
        for source in [prebuild, docs] {
            if SourceTree::overlaps(source, output)? {
                anyhow::bail!(
                    "Output directory {} overlaps {}",
                    output.display(),
                    source.display()
                );
            }
        }
        SourceTree::reset_dir(output)?;

        let sources = SourceTree::collect(prebuild)?;
        let tree = ModuleTree::from_sources(
            sources.iter().map(PathBuf::as_path),
            &self.config.skipped_modules,
        );
        let pages = plan_pages(&tree, Path::new(&self.config.section_title));
        for page in &pages {
            SourceTree::write_file(output, &page.path, page.contents.as_bytes())?;
        }
        info!("generated {} page file(s) in {}", pages.len(), output.display());

        let mut report = PagesReport {
            generated: pages.len(),
            merged: 0,
        };

        if !docs.is_dir() {
            warn!("{} does not exist, no human-written docs merged", docs.display());
            return Ok(report);
        }

        let duplicates = SourceTree::find_duplicates(docs, output)?;
        if !duplicates.is_empty() {
            return Err(DuplicateDocsError(duplicates).into());
        }
        report.merged = SourceTree::merge_dir(docs, output)?;
        info!("merged {} human-written file(s)", report.merged);
        Ok(report)
    }
}
