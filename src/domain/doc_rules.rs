//! Documentation Rule Set
//!
//! The rules used to expand docstrings of the stub package: links into the
//! generated API docs, links into the host's online manual, shared notes,
//! module titles and Markdown tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::rules::{ArgValue, RuleArgs, RuleError, RuleTable};

pub const DEFAULT_BASE_URL: &str = "https://miguelguthridge.github.io/FL-Studio-API-Stubs";
pub const DEFAULT_MANUAL_URL: &str =
    "https://www.image-line.com/fl-studio-learning/fl-studio-online-manual/html";
const MANUAL_SCRIPTING_PAGE: &str = "midi_scripting.htm";
const MANUAL_LINK_TEXT: &str = "FL Studio manual";
const CALLBACKS_MODULE: &str = "callbacks";

/// Settings for the documentation rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Root URL of the published API documentation
    pub base_url: String,
    /// Root URL of the host's online manual
    pub manual_url: String,
    /// Named notes inserted by the `note` rule
    pub notes: BTreeMap<String, String>,
    /// Emit cross-references resolved by the site generator instead of
    /// absolute URLs
    pub site_links: bool,
    /// Module name to the documentation section holding it. Filled from the
    /// stub tree at startup; modules not listed link without a section.
    #[serde(skip)]
    pub module_sections: BTreeMap<String, String>,
    /// Heading overrides for `module_title`
    pub titles: BTreeMap<String, String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let mut notes = BTreeMap::new();
        notes.insert(
            "colors".to_string(),
            format!(
                "Note that colors can be split into or built from components using the\n    \
                 functions provided in the [utils]({base}/utils/) module.\n\n    \
                 * [ColorToRGB()]({base}/utils/#utils.ColorToRGB)\n\n    \
                 * [RGBToColor()]({base}/utils/#utils.RGBToColor)",
                base = DEFAULT_BASE_URL
            ),
        );
        notes.insert(
            "playlist_indexes".to_string(),
            "Note that playlist track indexes start at 1.".to_string(),
        );

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            manual_url: DEFAULT_MANUAL_URL.to_string(),
            notes,
            site_links: false,
            module_sections: BTreeMap::new(),
            titles: BTreeMap::new(),
        }
    }
}

impl RulesConfig {
    /// URL of the page documenting `module`.
    fn module_url(&self, module: &str) -> String {
        let root = module.split('.').next().unwrap_or(module);
        match self.module_sections.get(root) {
            Some(section) => format!(
                "{}/{}/{}/",
                self.base_url.trim_end_matches('/'),
                encode_path(section),
                module.replace('.', "/")
            ),
            None => format!("{}/{}/", self.base_url.trim_end_matches('/'), module.replace('.', "/")),
        }
    }

    /// Markdown link to the documentation of a dotted item.
    fn item_link(&self, item: &str, label: &str) -> Result<String, RuleError> {
        self.member_link(item, None, label)
    }

    /// Link to `item`, or to `member` nested in it (`FlMidiMsg` + `status`).
    /// The page is always that of the module holding `item`.
    fn member_link(&self, item: &str, member: Option<&str>, label: &str) -> Result<String, RuleError> {
        let (module, _) = item
            .rsplit_once('.')
            .filter(|(m, n)| !m.is_empty() && !n.is_empty())
            .ok_or_else(|| {
                RuleError::InvalidArgument(format!("`{}` is not of the form `module.name`", item))
            })?;
        let anchor = match member {
            Some(member) => format!("{}.{}", item, member),
            None => item.to_string(),
        };

        if self.site_links {
            return Ok(format!("[`{}`][{}]", label, anchor));
        }
        Ok(format!("[{}]({}#{})", label, self.module_url(module), anchor))
    }

    fn title_for(&self, module: &str) -> String {
        if let Some(title) = self.titles.get(module) {
            return title.clone();
        }
        module
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Render rows of cells as a Markdown table; the first row is the header.
fn markdown_table(rows: &[ArgValue]) -> Result<String, RuleError> {
    let rows = rows
        .iter()
        .map(|row| {
            row.as_list()
                .and_then(|cells| cells.iter().map(ArgValue::as_str).collect::<Option<Vec<_>>>())
                .ok_or_else(|| RuleError::InvalidArgument("table rows must be lists of strings".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let Some((header, body)) = rows.split_first() else {
        return Err(RuleError::InvalidArgument("table needs a header row".to_string()));
    };
    if let Some(row) = body.iter().find(|r| r.len() != header.len()) {
        return Err(RuleError::InvalidArgument(format!(
            "row has {} cell(s), header has {}",
            row.len(),
            header.len()
        )));
    }

    let mut out = format!("| {} |\n", header.join(" | "));
    out.push_str(&format!("|{}\n", "---|".repeat(header.len())));
    for row in body {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    Ok(out)
}

/// Percent-encode the characters that appear in documentation locations.
fn encode_path(location: &str) -> String {
    location.replace('%', "%25").replace(' ', "%20")
}

/// Build the rule table for stub docstrings.
pub fn doc_rule_table(config: RulesConfig) -> RuleTable {
    let config = Arc::new(config);
    let mut table = RuleTable::new();

    let c = Arc::clone(&config);
    table.register("docs_url_fn", move |args: &RuleArgs| {
        args.expect_arity(1, 1)?;
        args.reject_unknown_keywords(&["suffix"])?;
        let function = args.text(0)?;
        let suffix = args.keyword("suffix").unwrap_or("()");
        c.item_link(function, &format!("{}{}", function, suffix))
    });

    let c = Arc::clone(&config);
    table.register("docs_url_attr", move |args: &RuleArgs| {
        args.expect_arity(1, 2)?;
        args.reject_unknown_keywords(&[])?;
        let item = args.text(0)?;
        match args.positional(1) {
            Some(_) => {
                let member = args.text(1)?.trim_start_matches('.');
                if member.is_empty() {
                    return Err(RuleError::InvalidArgument("empty attribute path".to_string()));
                }
                c.member_link(item, Some(member), &format!("{}.{}", item, member))
            }
            None => c.item_link(item, item),
        }
    });

    let c = Arc::clone(&config);
    table.register("docs_url_page", move |args: &RuleArgs| {
        args.expect_arity(2, 2)?;
        args.reject_unknown_keywords(&[])?;
        Ok(format!(
            "[{}]({}/{})",
            args.text(0)?,
            c.base_url.trim_end_matches('/'),
            encode_path(args.text(1)?.trim_start_matches('/'))
        ))
    });

    let c = Arc::clone(&config);
    table.register("fl_manual_anchor", move |args: &RuleArgs| {
        args.expect_arity(1, 2)?;
        args.reject_unknown_keywords(&["text"])?;
        let text = args.text_or_keyword(1, "text").unwrap_or(MANUAL_LINK_TEXT);
        Ok(format!(
            "[{}]({}/{}#{})",
            text,
            c.manual_url.trim_end_matches('/'),
            MANUAL_SCRIPTING_PAGE,
            args.text(0)?
        ))
    });

    let c = Arc::clone(&config);
    table.register("fl_manual_page", move |args: &RuleArgs| {
        args.expect_arity(1, 2)?;
        args.reject_unknown_keywords(&["text"])?;
        let text = args.text_or_keyword(1, "text").unwrap_or(MANUAL_LINK_TEXT);
        Ok(format!(
            "[{}]({}/{})",
            text,
            c.manual_url.trim_end_matches('/'),
            encode_path(args.text(0)?)
        ))
    });

    let c = Arc::clone(&config);
    table.register("note", move |args: &RuleArgs| {
        args.expect_arity(1, 1)?;
        args.reject_unknown_keywords(&[])?;
        let name = args.text(0)?;
        c.notes
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownNote(name.to_string()))
    });

    let c = Arc::clone(&config);
    table.register("module_title", move |args: &RuleArgs| {
        args.expect_arity(1, 1)?;
        args.reject_unknown_keywords(&[])?;
        Ok(format!("# {}", c.title_for(args.text(0)?)))
    });

    let c = Arc::clone(&config);
    table.register("docs_url_mod", move |args: &RuleArgs| {
        args.expect_arity(1, 1)?;
        args.reject_unknown_keywords(&[])?;
        let module = args.text(0)?;
        if c.site_links {
            return Ok(format!("[`{}`][{}]", module, module));
        }
        Ok(format!("[{}]({})", module, c.module_url(module)))
    });

    let c = config;
    table.register("docs_url_callback", move |args: &RuleArgs| {
        args.expect_arity(1, 1)?;
        args.reject_unknown_keywords(&[])?;
        let callback = args.text(0)?;
        c.item_link(&format!("{}.{}", CALLBACKS_MODULE, callback), &format!("{}()", callback))
    });

    table.register("md_table", |args: &RuleArgs| {
        args.expect_arity(1, 1)?;
        args.reject_unknown_keywords(&[])?;
        let rows = args
            .positional(0)
            .and_then(ArgValue::as_list)
            .ok_or_else(|| RuleError::InvalidArgument("expected a list of rows".to_string()))?;
        markdown_table(rows)
    });

    table
}
