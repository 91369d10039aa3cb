//! Locates the recommendations block inside a free-text summary.
//!
//! Matchers are declarative (heading phrase + shared boundary set) and are
//! folded in a fixed order; the first one whose block parses wins.

use std::borrow::Cow;

use regex::Regex;

use crate::parser::{LineGrammar, ParsedRecommendation, RecommendationParser};

/// Where a captured block stops: a blank line before a heading, a horizontal
/// rule, a bold-led capitalized line, or the end of the text
const BLOCK_BOUNDARIES: &str = r"\n\n#|\n---|\n\*\*[A-Z]";

/// (name, heading pattern) in priority order
const PRIMARY_HEADINGS: &[(&str, &str)] = &[
    (
        "top_strategic_recommendations",
        r"Top \d+ (?:Actionable )?Strategic Recommendations?",
    ),
    ("recommendations", r"##?\s*Recommendations?"),
    ("strategic_actions", r"##?\s*Strategic Actions?"),
    ("key_takeaways", r"##?\s*Key Takeaways?"),
    ("action_items", r"##?\s*Action Items?"),
];

/// How many of the primary headings the secondary pass consults
const REDUCED_HEADING_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct HeadingMatcher {
    name: &'static str,
    pattern: Regex,
}

impl HeadingMatcher {
    /// Build a case-insensitive matcher capturing everything between the
    /// heading (plus its `:`/newline run) and the first boundary
    pub fn new(name: &'static str, heading: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?i){heading}[:\n]+([\s\S]*?)(?:{BLOCK_BOUNDARIES}|$)"
        ))?;
        Ok(Self { name, pattern })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// How the fold decides a winner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cascade {
    /// Keep going until a block yields at least one item
    FirstParseable,
    /// Stop at the first heading found, parseable or not
    FirstHeading,
}

/// A located block and the items parsed from it
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedBlock {
    pub heading: &'static str,
    pub text: String,
    pub items: Vec<ParsedRecommendation>,
}

#[derive(Debug, Clone)]
pub struct RecommendationExtractor {
    matchers: Vec<HeadingMatcher>,
    parser: RecommendationParser,
    cascade: Cascade,
}

impl RecommendationExtractor {
    pub fn new(
        matchers: Vec<HeadingMatcher>,
        parser: RecommendationParser,
        cascade: Cascade,
    ) -> Self {
        Self {
            matchers,
            parser,
            cascade,
        }
    }

    /// All five headings, lenient item grammar, first parseable block wins
    pub fn primary() -> Self {
        Self::new(
            build_matchers(PRIMARY_HEADINGS),
            RecommendationParser::new(LineGrammar::Lenient),
            Cascade::FirstParseable,
        )
    }

    /// Secondary pass over the raw summary: no "Action Items", strict
    /// ordinals, first heading found decides
    pub fn reduced() -> Self {
        Self::new(
            build_matchers(&PRIMARY_HEADINGS[..REDUCED_HEADING_COUNT]),
            RecommendationParser::new(LineGrammar::Strict),
            Cascade::FirstHeading,
        )
    }

    pub fn matchers(&self) -> &[HeadingMatcher] {
        &self.matchers
    }

    /// Returns `None` when no matcher produces at least one item.
    /// CRLF line endings are folded to LF before matching.
    pub fn extract(&self, text: &str) -> Option<ExtractedBlock> {
        if text.trim().is_empty() {
            return None;
        }
        let text: Cow<'_, str> = if text.contains("\r\n") {
            Cow::Owned(text.replace("\r\n", "\n"))
        } else {
            Cow::Borrowed(text)
        };
        for matcher in &self.matchers {
            let Some(block) = matcher.capture(&text) else {
                continue;
            };
            let items = self.parser.parse(block);
            if !items.is_empty() {
                tracing::debug!(
                    heading = matcher.name(),
                    items = items.len(),
                    "recommendations block located"
                );
                return Some(ExtractedBlock {
                    heading: matcher.name(),
                    text: block.to_string(),
                    items,
                });
            }
            if self.cascade == Cascade::FirstHeading {
                tracing::debug!(
                    heading = matcher.name(),
                    "heading found but block has no numbered items"
                );
                return None;
            }
        }
        tracing::debug!("no recommendations section found");
        None
    }
}

impl Default for RecommendationExtractor {
    fn default() -> Self {
        Self::primary()
    }
}

fn build_matchers(headings: &[(&'static str, &str)]) -> Vec<HeadingMatcher> {
    headings
        .iter()
        .filter_map(|&(name, heading)| match HeadingMatcher::new(name, heading) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::error!("invalid heading pattern {}: {}", name, e);
                None
            }
        })
        .collect()
}

/// Extract with the primary matcher set
pub fn extract(text: &str) -> Option<ExtractedBlock> {
    RecommendationExtractor::primary().extract(text)
}
