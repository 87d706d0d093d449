/// Configuration for stubdoc.
///
/// Read from `stubdoc.toml` when present. Every key is optional; the
/// defaults match the layout of the stub repository.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::differ::DiffOptions;
use crate::domain::doc_rules::RulesConfig;

pub const DEFAULT_CONFIG_FILE: &str = "stubdoc.toml";

/// Environment variable that switches the rules to site-style links.
pub const SITE_ENV_VAR: &str = "STUBDOC_SITE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StubdocConfig {
    pub paths: PathsConfig,
    pub rules: RulesConfig,
    pub transform: TransformConfig,
    pub pages: PagesConfig,
    pub check: CheckConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Stub package sources, one directory per documentation section
    pub src: PathBuf,
    /// Output of `transform`
    pub build_lib: PathBuf,
    /// Transformed sources used to build the documentation
    pub prebuild_docs: PathBuf,
    /// Human-written documentation
    pub docs: PathBuf,
    /// Merged documentation handed to the site generator
    pub build_docs: PathBuf,
    /// Captured host surface
    pub snapshot: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            build_lib: PathBuf::from("build_lib"),
            prebuild_docs: PathBuf::from("prebuild_docs"),
            docs: PathBuf::from("docs"),
            build_docs: PathBuf::from("build_docs"),
            snapshot: PathBuf::from("data/fl_stubs.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Extensions of files whose contents are expanded; others are copied
    pub extensions: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["py".into(), "pyi".into(), "md".into()],
        }
    }
}

impl TransformConfig {
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Modules whose documentation is written by hand
    pub skipped_modules: Vec<String>,
    /// Directory in the documentation build that receives generated pages
    pub section_title: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            skipped_modules: vec!["enveditor".into(), "flpianoroll".into()],
            section_title: "MIDI Controller Scripting".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub private_prefix: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            private_prefix: DiffOptions::default().private_prefix,
        }
    }
}

impl CheckConfig {
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            private_prefix: self.private_prefix.clone(),
        }
    }
}

impl StubdocConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid stubdoc configuration")
    }

    /// Load `path`, or `stubdoc.toml` in the working directory if it exists,
    /// or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply the site-link environment switch.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(SITE_ENV_VAR) {
            self.rules.site_links = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}
