//! Token Scanner
//!
//! Finds `{{...}}` markup regions in a text and parses each into a rule name
//! and its arguments. Three call forms are accepted:
//!
//! - `{{name}}` - no arguments
//! - `{{name[raw, raw]}}` - comma-separated raw text, trimmed, never quoted
//! - `{{name("str", key="str")}}` - quoted string literals or bracketed
//!   lists of them (`[["a", "b"], ["c", "d"]]`), with optional keyword
//!   arguments, which must follow all positional ones
//!
//! A region always ends at the first `}}` after its `{{`; regions do not nest.

use std::iter::Peekable;
use std::ops::Range;
use std::str::Chars;

use crate::domain::rules::{ArgValue, RuleArgs};

pub const OPEN: &str = "{{";
pub const CLOSE: &str = "}}";

/// A successfully parsed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub rule: String,
    pub args: RuleArgs,
    /// Byte range of the whole region, delimiters included
    pub span: Range<usize>,
    pub line: usize,
    pub column: usize,
}

/// One region found by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    Token(Token),
    Malformed {
        reason: String,
        span: Range<usize>,
        line: usize,
        column: usize,
    },
}

impl ScanItem {
    pub fn span(&self) -> &Range<usize> {
        match self {
            ScanItem::Token(token) => &token.span,
            ScanItem::Malformed { span, .. } => span,
        }
    }
}

/// Scan `text` left to right for markup regions.
pub fn scan(text: &str) -> Vec<ScanItem> {
    let lines = LineIndex::new(text);
    let mut items = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find(OPEN) {
        let start = pos + rel;
        let body_start = start + OPEN.len();
        let (line, column) = lines.position(text, start);

        let Some(body_len) = text[body_start..].find(CLOSE) else {
            items.push(ScanItem::Malformed {
                reason: format!("unterminated `{}`", OPEN),
                span: start..text.len(),
                line,
                column,
            });
            break;
        };
        let end = body_start + body_len + CLOSE.len();

        match parse_body(&text[body_start..body_start + body_len]) {
            Ok((rule, args)) => items.push(ScanItem::Token(Token {
                rule,
                args,
                span: start..end,
                line,
                column,
            })),
            Err(reason) => items.push(ScanItem::Malformed {
                reason,
                span: start..end,
                line,
                column,
            }),
        }
        pos = end;
    }

    items
}

/// Parse the contents between the delimiters.
pub fn parse_body(body: &str) -> Result<(String, RuleArgs), String> {
    let body = body.trim();
    let name_len = body
        .char_indices()
        .find(|&(i, c)| !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit())))
        .map(|(i, _)| i)
        .unwrap_or(body.len());

    if name_len == 0 {
        return Err(match body.chars().next() {
            Some(c) => format!("expected rule name, found `{}`", c),
            None => "empty token".to_string(),
        });
    }

    let rule = body[..name_len].to_string();
    let rest = body[name_len..].trim();

    let args = match rest.chars().next() {
        None => RuleArgs::default(),
        Some('[') => {
            let inner = rest
                .strip_prefix('[')
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(|| "unbalanced `[`".to_string())?;
            parse_raw_list(inner)
        }
        Some('(') => {
            let inner = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .ok_or_else(|| "unbalanced `(`".to_string())?;
            ArgParser::new(inner).parse()?
        }
        Some(c) => return Err(format!("unexpected `{}` after rule name `{}`", c, rule)),
    };

    Ok((rule, args))
}

fn parse_raw_list(inner: &str) -> RuleArgs {
    if inner.trim().is_empty() {
        return RuleArgs::default();
    }
    RuleArgs::new(inner.split(',').map(|s| s.trim().to_string()))
}

// ─────────────────────────────────────────────────────────────────────
// Quoted argument lists
// ─────────────────────────────────────────────────────────────────────

struct ArgParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> ArgParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<RuleArgs, String> {
        let mut args = RuleArgs::default();

        loop {
            self.skip_ws();
            let Some(&c) = self.chars.peek() else {
                break;
            };

            if c == '_' || c.is_ascii_alphabetic() {
                let key = self.ident();
                self.skip_ws();
                if self.chars.next() != Some('=') {
                    return Err(format!("argument `{}` must be a quoted string", key));
                }
                self.skip_ws();
                let value = self.value()?;
                args.keyword.push((key, value));
            } else {
                let value = self.value()?;
                if !args.keyword.is_empty() {
                    return Err("positional argument follows keyword argument".to_string());
                }
                args.positional.push(value);
            }

            self.skip_ws();
            match self.chars.next() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(format!("expected `,` between arguments, found `{}`", c)),
            }
        }

        Ok(args)
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.next_if(|c| *c == '_' || c.is_ascii_alphanumeric()) {
            out.push(c);
        }
        out
    }

    fn value(&mut self) -> Result<ArgValue, String> {
        if self.chars.next_if_eq(&'[').is_none() {
            return self.string().map(ArgValue::Str);
        }

        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.chars.next_if_eq(&']').is_some() {
                return Ok(ArgValue::List(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.chars.next() {
                Some(',') => continue,
                Some(']') => return Ok(ArgValue::List(items)),
                Some(c) => return Err(format!("expected `,` or `]` in list, found `{}`", c)),
                None => return Err("unterminated list".to_string()),
            }
        }
    }

    fn string(&mut self) -> Result<String, String> {
        let quote = match self.chars.next() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(format!("expected string literal, found `{}`", c)),
            None => return Err("expected string literal".to_string()),
        };

        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err("unterminated string literal".to_string()),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('\\' | '"' | '\'')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err("unterminated string literal".to_string()),
                },
                Some(c) => out.push(c),
            }
        }
    }
}

/// Byte offsets of line starts, for turning offsets into line/column.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn position(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&s| s <= offset) - 1;
        let column = text[self.starts[line]..offset].chars().count() + 1;
        (line + 1, column)
    }
}
