//! Error taxonomy for docstring template expansion.
//!
//! Errors are collected rather than raised one at a time: a single text
//! yields a [`FileFailure`] listing every broken token, and a tree run yields
//! a [`BatchFailure`] listing every failed file.

use std::fmt;

use thiserror::Error;

use crate::domain::rules::RuleError;

/// Position of a token within its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File path or other label for the text being transformed
    pub origin: String,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.origin, self.line, self.column)
    }
}

/// A single token that could not be resolved.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{location}: unknown rule `{rule}`")]
    UnknownRule {
        rule: String,
        location: SourceLocation,
    },

    #[error("{location}: rule `{rule}` failed: {source}")]
    RuleExecution {
        rule: String,
        location: SourceLocation,
        #[source]
        source: RuleError,
    },

    #[error("{location}: malformed token: {reason}")]
    MalformedToken {
        reason: String,
        location: SourceLocation,
    },
}

impl TransformError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            TransformError::UnknownRule { location, .. }
            | TransformError::RuleExecution { location, .. }
            | TransformError::MalformedToken { location, .. } => location,
        }
    }
}

/// Every error found in one text, in source order.
#[derive(Debug)]
pub struct FileFailure {
    pub origin: String,
    pub errors: Vec<TransformError>,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} error(s))", self.origin, self.errors.len())?;
        for err in &self.errors {
            writeln!(f, "  {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for FileFailure {}

/// Failures collected across a whole tree, sorted by origin.
#[derive(Debug, Default)]
pub struct BatchFailure {
    pub failures: Vec<FileFailure>,
}

impl BatchFailure {
    pub fn new(mut failures: Vec<FileFailure>) -> Self {
        failures.sort_by(|a, b| a.origin.cmp(&b.origin));
        Self { failures }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of broken tokens across all files.
    pub fn error_count(&self) -> usize {
        self.failures.iter().map(|f| f.errors.len()).sum()
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} error(s) in {} file(s)",
            self.error_count(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(origin: &str, line: usize) -> SourceLocation {
        SourceLocation {
            origin: origin.to_string(),
            line,
            column: 1,
        }
    }

    #[test]
    fn test_batch_failure_sorts_by_origin() {
        let batch = BatchFailure::new(vec![
            FileFailure {
                origin: "src/b.py".into(),
                errors: vec![TransformError::UnknownRule {
                    rule: "x".into(),
                    location: loc("src/b.py", 3),
                }],
            },
            FileFailure {
                origin: "src/a.py".into(),
                errors: vec![],
            },
        ]);
        let origins: Vec<&str> = batch.failures.iter().map(|f| f.origin.as_str()).collect();
        assert_eq!(origins, vec!["src/a.py", "src/b.py"]);
        assert_eq!(batch.error_count(), 1);
    }

    #[test]
    fn test_error_display_includes_location() {
        let err = TransformError::UnknownRule {
            rule: "nope".into(),
            location: loc("mod.py", 12),
        };
        assert_eq!(err.to_string(), "mod.py:12:1: unknown rule `nope`");
    }
}
