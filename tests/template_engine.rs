/// Template engine behaviour over the public API: substitution, identity on
/// plain text, and error collection.

use stubdoc::domain::error::TransformError;
use stubdoc::domain::rules::{RuleArgs, RuleError, RuleTable};
use stubdoc::domain::template::TemplateEngine;

fn notes_table() -> RuleTable {
    let mut table = RuleTable::new();
    table.register("note", |args: &RuleArgs| {
        args.expect_arity(1, 1)?;
        match args.text(0)? {
            "colors" => Ok("See the color guide.".to_string()),
            other => Err(RuleError::UnknownNote(other.to_string())),
        }
    });
    table.register("link", |args: &RuleArgs| {
        args.expect_arity(2, 2)?;
        Ok(format!("[{}]({})", args.text(0)?, args.text(1)?))
    });
    table
}

#[test]
fn test_note_scenario() {
    let table = notes_table();
    let engine = TemplateEngine::new(&table);
    assert_eq!(
        engine.transform("Value. {{note[colors]}}", "doc.py").unwrap(),
        "Value. See the color guide."
    );
}

#[test]
fn test_plain_text_is_identity() {
    let table = notes_table();
    let engine = TemplateEngine::new(&table);
    for text in [
        "",
        "no tokens here",
        "single { brace } and }} closer only",
        "def f():\n    \"\"\"Docstring with `code`.\"\"\"\n    return {}\n",
    ] {
        assert_eq!(engine.transform(text, "doc.py").unwrap(), text);
    }
}

#[test]
fn test_all_known_tokens_are_replaced() {
    let table = notes_table();
    let engine = TemplateEngine::new(&table);
    let text = "A {{note[colors]}}\nB {{link(\"docs\", \"https://x/y\")}}\nC {{ note[colors] }}";
    let out = engine.transform(text, "doc.py").unwrap();
    assert_eq!(
        out,
        "A See the color guide.\nB [docs](https://x/y)\nC See the color guide."
    );
    assert!(!out.contains("{{"));
}

#[test]
fn test_unknown_rule_reported_once_and_scanning_continues() {
    let table = notes_table();
    let engine = TemplateEngine::new(&table);
    let text = "{{note[colors]}}\n{{missing[x]}}\n{{note[absent]}}";
    let failure = engine.transform(text, "doc.py").unwrap_err();

    let unknown: Vec<&TransformError> = failure
        .errors
        .iter()
        .filter(|e| matches!(e, TransformError::UnknownRule { .. }))
        .collect();
    assert_eq!(unknown.len(), 1);
    match unknown[0] {
        TransformError::UnknownRule { rule, location } => {
            assert_eq!(rule, "missing");
            assert_eq!(location.line, 2);
            assert_eq!(location.origin, "doc.py");
        }
        _ => unreachable!(),
    }

    // The token after the unknown rule was still evaluated
    assert_eq!(failure.errors.len(), 2);
    assert!(matches!(
        &failure.errors[1],
        TransformError::RuleExecution { rule, location, .. } if rule == "note" && location.line == 3
    ));
}

#[test]
fn test_wrong_arity_is_rule_execution_error() {
    let table = notes_table();
    let engine = TemplateEngine::new(&table);
    let failure = engine.transform("{{link[only one]}}", "doc.py").unwrap_err();
    assert!(matches!(
        &failure.errors[0],
        TransformError::RuleExecution { source: RuleError::Arity { found: 1, .. }, .. }
    ));
}

#[test]
fn test_input_is_untouched_on_failure() {
    let table = notes_table();
    let engine = TemplateEngine::new(&table);
    let text = String::from("x {{note[colors]}} {{oops");
    let before = text.clone();
    assert!(engine.transform(&text, "doc.py").is_err());
    assert_eq!(text, before);
}
