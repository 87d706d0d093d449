//! Rule Table
//!
//! Explicit registry mapping a rule name to the function that produces the
//! replacement text for a token. Rules are registered at startup; there is
//! no loading of rule code at runtime.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Failure raised by a rule function.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("expected {expected} argument(s), found {found}")]
    Arity { expected: String, found: usize },

    #[error("unexpected keyword argument `{0}`")]
    UnknownKeyword(String),

    #[error("no note named `{0}`")]
    UnknownNote(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A single argument value: a string, or a bracketed list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    List(Vec<ArgValue>),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            ArgValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(items) => Some(items),
            ArgValue::Str(_) => None,
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

/// Arguments parsed from a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleArgs {
    pub positional: Vec<ArgValue>,
    /// Keyword arguments in source order
    pub keyword: Vec<(String, ArgValue)>,
}

impl RuleArgs {
    pub fn new<I, V>(positional: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ArgValue>,
    {
        Self {
            positional: positional.into_iter().map(Into::into).collect(),
            keyword: Vec::new(),
        }
    }

    pub fn positional(&self, index: usize) -> Option<&ArgValue> {
        self.positional.get(index)
    }

    /// Positional argument `index` as a string.
    pub fn text(&self, index: usize) -> Result<&str, RuleError> {
        let value = self.positional.get(index).ok_or_else(|| RuleError::Arity {
            expected: format!("at least {}", index + 1),
            found: self.positional.len(),
        })?;
        value
            .as_str()
            .ok_or_else(|| RuleError::InvalidArgument(format!("argument {} must be a string", index + 1)))
    }

    /// Last value given for `name`, if it is a string.
    pub fn keyword(&self, name: &str) -> Option<&str> {
        self.keyword
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.as_str())
    }

    /// Check that the positional count lies within `min..=max`.
    pub fn expect_arity(&self, min: usize, max: usize) -> Result<(), RuleError> {
        let found = self.positional.len();
        if found < min || found > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{}..={}", min, max)
            };
            return Err(RuleError::Arity { expected, found });
        }
        Ok(())
    }

    pub fn reject_unknown_keywords(&self, allowed: &[&str]) -> Result<(), RuleError> {
        match self.keyword.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
            Some((k, _)) => Err(RuleError::UnknownKeyword(k.clone())),
            None => Ok(()),
        }
    }

    /// String at position `index`, falling back to keyword `name`.
    pub fn text_or_keyword(&self, index: usize, name: &str) -> Option<&str> {
        match self.positional.get(index) {
            Some(value) => value.as_str(),
            None => self.keyword(name),
        }
    }
}

pub type Rule = Box<dyn Fn(&RuleArgs) -> Result<String, RuleError> + Send + Sync>;

/// Named rule registry.
#[derive(Default)]
pub struct RuleTable {
    rules: BTreeMap<String, Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` under `name`, replacing any previous rule of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F) -> &mut Self
    where
        F: Fn(&RuleArgs) -> Result<String, RuleError> + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), Box::new(rule));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_call() {
        let mut table = RuleTable::new();
        table.register("upper", |args: &RuleArgs| {
            args.expect_arity(1, 1)?;
            Ok(args.text(0)?.to_uppercase())
        });

        assert!(table.contains("upper"));
        let rule = table.get("upper").unwrap();
        assert_eq!(rule(&RuleArgs::new(["abc"])).unwrap(), "ABC");
        assert_eq!(
            rule(&RuleArgs::default()),
            Err(RuleError::Arity { expected: "1".into(), found: 0 })
        );
    }

    #[test]
    fn test_text_rejects_lists() {
        let args = RuleArgs::new([ArgValue::List(vec!["a".into()])]);
        assert!(matches!(args.text(0), Err(RuleError::InvalidArgument(_))));
        assert!(matches!(args.text(1), Err(RuleError::Arity { found: 1, .. })));
    }

    #[test]
    fn test_keyword_lookup_prefers_last() {
        let args = RuleArgs {
            positional: vec![],
            keyword: vec![("text".into(), "a".into()), ("text".into(), "b".into())],
        };
        assert_eq!(args.keyword("text"), Some("b"));
        assert_eq!(args.reject_unknown_keywords(&["text"]), Ok(()));
        assert_eq!(
            args.reject_unknown_keywords(&["suffix"]),
            Err(RuleError::UnknownKeyword("text".into()))
        );
    }
}
