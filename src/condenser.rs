//! Executive-summary condensation: builds the bullet request and parses the
//! reply. Generation happens behind [`ChatBackend`]; any failure there
//! collapses to an empty bullet list.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::clients::traits::{ChatBackend, ChatMessage, ChatRequest};
use crate::config::SummarizerConfig;
use crate::schemas::SummaryBullet;

/// "1.", "1)", "(1)", "**1.**", "1:" plus any bold marker after it
static ORDINAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[*(]*\d+[.)*:]\s*\**").unwrap());
static BULLET_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-•*]\s*").unwrap());

/// Bullets of this many characters or fewer are dropped as noise
const MIN_BULLET_CHARS: usize = 5;

/// Upper bound on executive-summary bullets
pub const MAX_BULLETS: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct SummaryCondenser {
    config: SummarizerConfig,
}

impl SummaryCondenser {
    pub fn new(config: SummarizerConfig) -> Self {
        Self { config }
    }

    /// `None` when the text is too short to be worth condensing; otherwise
    /// the text cut to `max_input_chars` with "..." appended on truncation
    pub fn prepare_input(&self, text: &str) -> Option<String> {
        if text.trim().chars().count() < self.config.min_input_chars {
            tracing::warn!("Text too short for executive summary");
            return None;
        }
        Some(truncate_chars(text, self.config.max_input_chars))
    }

    pub fn build_request(&self, text: &str) -> Option<ChatRequest> {
        let report = self.prepare_input(text)?;
        let n = self.bullet_cap();
        let prompt = format!(
            "Analyze the following competitive intelligence report and generate EXACTLY {n} key takeaways.\n\n\
             Requirements:\n\
             - Each point must be 10-15 words maximum\n\
             - Focus on actionable insights and strategic implications\n\
             - Use clear, concise business language\n\
             - Start each point with a strong action verb or key finding\n\
             - Number each point 1-{n}\n\
             - NO additional commentary or explanations\n\n\
             Report:\n{report}\n\n\
             Provide ONLY the {n} numbered bullet points, nothing else."
        );
        Some(ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(self.config.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stop: None,
        })
    }

    /// Strip ordinals, bold and bullet glyphs; keep the first `max_bullets`
    /// lines longer than five characters, in order
    pub fn parse_bullets(&self, content: &str) -> Vec<SummaryBullet> {
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(clean_bullet)
            .filter(|b| b.chars().count() > MIN_BULLET_CHARS)
            .take(self.bullet_cap())
            .collect()
    }

    fn bullet_cap(&self) -> usize {
        self.config.max_bullets.min(MAX_BULLETS)
    }

    /// Best effort: never fails, an empty list means "no executive summary"
    pub async fn condense(&self, backend: &dyn ChatBackend, text: &str) -> Vec<SummaryBullet> {
        let Some(request) = self.build_request(text) else {
            return Vec::new();
        };
        tracing::debug!(model = %request.model, "requesting executive summary");
        match backend.complete(&request).await {
            Ok(completion) => {
                let bullets = self.parse_bullets(&completion.content);
                tracing::debug!(count = bullets.len(), "executive summary parsed");
                bullets
            }
            Err(e) => {
                tracing::warn!("Error generating executive summary: {}", e);
                Vec::new()
            }
        }
    }
}

fn clean_bullet(line: &str) -> String {
    let cleaned = ORDINAL_PREFIX.replace(line, "");
    let cleaned = cleaned.strip_prefix("**").unwrap_or(&cleaned);
    let cleaned = cleaned.strip_suffix("**").unwrap_or(cleaned);
    BULLET_PREFIX.replace(cleaned, "").trim().to_string()
}

/// Keep the first `max` characters, appending "..." when anything was cut
fn truncate_chars(input: &str, max: usize) -> String {
    let mut out = String::new();
    for (idx, ch) in input.chars().enumerate() {
        if idx >= max {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    out
}
