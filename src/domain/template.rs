//! Template Substitution Engine
//!
//! Resolves every markup token in a text through a [`RuleTable`]. Errors are
//! collected for the whole text; a text with any broken token produces no
//! output at all.

use crate::domain::error::{FileFailure, SourceLocation, TransformError};
use crate::domain::rules::RuleTable;
use crate::domain::token::{scan, ScanItem};

pub struct TemplateEngine<'a> {
    rules: &'a RuleTable,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    /// Transform `text`, labelling error locations with `origin`.
    pub fn transform(&self, text: &str, origin: &str) -> Result<String, FileFailure> {
        let items = scan(text);
        if items.is_empty() {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        let mut errors = Vec::new();
        let mut cursor = 0;

        for item in items {
            let span = item.span().clone();
            out.push_str(&text[cursor..span.start]);
            cursor = span.end;

            match item {
                ScanItem::Token(token) => {
                    let location = SourceLocation {
                        origin: origin.to_string(),
                        line: token.line,
                        column: token.column,
                    };
                    let Some(rule) = self.rules.get(&token.rule) else {
                        errors.push(TransformError::UnknownRule {
                            rule: token.rule,
                            location,
                        });
                        continue;
                    };
                    match rule(&token.args) {
                        Ok(replacement) => out.push_str(&replacement),
                        Err(source) => errors.push(TransformError::RuleExecution {
                            rule: token.rule,
                            location,
                            source,
                        }),
                    }
                }
                ScanItem::Malformed {
                    reason,
                    line,
                    column,
                    ..
                } => errors.push(TransformError::MalformedToken {
                    reason,
                    location: SourceLocation {
                        origin: origin.to_string(),
                        line,
                        column,
                    },
                }),
            }
        }

        if !errors.is_empty() {
            return Err(FileFailure {
                origin: origin.to_string(),
                errors,
            });
        }

        out.push_str(&text[cursor..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::{RuleArgs, RuleError};

    fn table() -> RuleTable {
        let mut table = RuleTable::new();
        table.register("note", |args: &RuleArgs| {
            args.expect_arity(1, 1)?;
            match args.text(0)? {
                "colors" => Ok("See the color guide.".to_string()),
                other => Err(RuleError::UnknownNote(other.to_string())),
            }
        });
        table.register("shout", |args: &RuleArgs| {
            let words = (0..args.positional.len())
                .map(|i| args.text(i))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(words.join("!"))
        });
        table
    }

    #[test]
    fn test_note_substitution() {
        let rules = table();
        let engine = TemplateEngine::new(&rules);
        let out = engine.transform("Value. {{note[colors]}}", "doc").unwrap();
        assert_eq!(out, "Value. See the color guide.");
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        let rules = table();
        let engine = TemplateEngine::new(&rules);
        let text = "def f():\n    \"\"\"Plain {braces} only.\"\"\"\n";
        assert_eq!(engine.transform(text, "doc").unwrap(), text);
    }

    #[test]
    fn test_collects_every_error() {
        let rules = table();
        let engine = TemplateEngine::new(&rules);
        let text = "{{missing[a]}} {{note[nope]}} {{shout[a, b]}} {{bad";
        let failure = engine.transform(text, "f.py").unwrap_err();

        assert_eq!(failure.origin, "f.py");
        assert_eq!(failure.errors.len(), 3);
        assert!(matches!(&failure.errors[0], TransformError::UnknownRule { rule, .. } if rule == "missing"));
        assert!(matches!(
            &failure.errors[1],
            TransformError::RuleExecution { source: RuleError::UnknownNote(n), .. } if n == "nope"
        ));
        assert!(matches!(&failure.errors[2], TransformError::MalformedToken { .. }));
    }
}
