//! Turns a recommendations block (LLM prose) into ordered items.
//!
//! A numbered line opens an item; bullets and plain lines under it become
//! details. Anything before the first numbered line is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// "1. Title", "1) Title", "(1) Title", "[1] Title", "**1.** Title", "1 Title"
static LENIENT_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\**[(\[]?(\d+)[.)\]]?\**\s*(.+)").unwrap());

/// Closing punctuation required: "1.", "1)", "1:", "**1.**"
static STRICT_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\**(\d+)[.):]\*?\s*(.*)").unwrap());

/// A recommendation before priorities are assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecommendation {
    /// The number the text used; informational only
    pub ordinal: String,
    pub title: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGrammar {
    /// Closing punctuation after the ordinal is optional
    Lenient,
    /// Closing punctuation after the ordinal is required
    Strict,
}

impl LineGrammar {
    fn item_pattern(&self) -> &'static Regex {
        match self {
            LineGrammar::Lenient => &LENIENT_ITEM,
            LineGrammar::Strict => &STRICT_ITEM,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationParser {
    grammar: LineGrammar,
}

impl Default for RecommendationParser {
    fn default() -> Self {
        Self::new(LineGrammar::Lenient)
    }
}

impl RecommendationParser {
    pub fn new(grammar: LineGrammar) -> Self {
        Self { grammar }
    }

    pub fn parse(&self, block: &str) -> Vec<ParsedRecommendation> {
        let mut items = Vec::new();
        let mut current: Option<ParsedRecommendation> = None;

        for line in block.lines().filter(|l| !l.trim().is_empty()) {
            if let Some(caps) = self.grammar.item_pattern().captures(line) {
                if let Some(done) = current.take() {
                    push_item(&mut items, done);
                }
                current = Some(ParsedRecommendation {
                    ordinal: caps[1].to_string(),
                    title: clean_title(&caps[2]),
                    details: Vec::new(),
                });
            } else if let Some(open) = current.as_mut()
                && let Some(detail) = clean_detail(line)
            {
                open.details.push(detail);
            }
        }

        if let Some(done) = current.take() {
            push_item(&mut items, done);
        }
        items
    }
}

/// Parse with the lenient grammar
pub fn parse(block: &str) -> Vec<ParsedRecommendation> {
    RecommendationParser::default().parse(block)
}

/// Keep titles non-empty: a bare ordinal line takes its first detail as title
fn push_item(items: &mut Vec<ParsedRecommendation>, mut item: ParsedRecommendation) {
    if item.title.is_empty() {
        if item.details.is_empty() {
            return;
        }
        item.title = item.details.remove(0);
    }
    items.push(item);
}

fn clean_detail(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return None;
    }
    let text = strip_bold(strip_bullet(trimmed));
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Drop bold markers and any ordinal punctuation the pattern left behind
fn clean_title(raw: &str) -> String {
    strip_bold(raw.trim())
        .trim()
        .trim_start_matches(['*', '.', ')', ']', ':'])
        .trim_end_matches('*')
        .trim()
        .to_string()
}

fn strip_bullet(line: &str) -> &str {
    if line.starts_with("**") {
        return line;
    }
    match line.strip_prefix(['-', '*', '•']) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// Only the outer pair; bold runs inside the text are kept
fn strip_bold(text: &str) -> &str {
    let text = text.strip_prefix("**").unwrap_or(text);
    text.strip_suffix("**").unwrap_or(text)
}
