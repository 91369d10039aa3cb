//! Competitor discovery through the chat backend. Unlike the summary
//! condenser this has no fallback tier: every failure reaches the caller.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::clients::traits::{ChatBackend, ChatMessage, ChatRequest};
use crate::config::DiscoveryConfig;
use crate::error::{CrewDigestError, Result};

const SYSTEM_PROMPT: &str = "You are a business analyst. Provide only competitor company names, nothing else. No explanations, no formatting, no numbering.";

static LEADING_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());
static LEADING_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-•]\s*").unwrap());

#[derive(Debug, Clone, Default)]
pub struct CompetitorDiscovery {
    config: DiscoveryConfig,
}

impl CompetitorDiscovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn build_request(&self, focal_company: &str, category: &str) -> ChatRequest {
        let prompt = format!(
            "List exactly {} top competitors of {} in the {} industry. Return only company names separated by newlines.",
            self.config.competitor_count, focal_company, category
        );
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stop: Some(vec!["\n\n".to_string()]),
        }
    }

    /// Clean the reply into exactly `competitor_count` names
    pub fn parse_competitors(&self, content: &str) -> Result<Vec<String>> {
        let wanted = self.config.competitor_count;
        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(clean_name)
            .filter(|n| !n.is_empty())
            .collect();

        if names.len() < wanted {
            return Err(CrewDigestError::Parse {
                message: format!(
                    "Failed to parse AI response: Expected {} competitors, got {}. Response: {}",
                    wanted,
                    names.len(),
                    content
                ),
            });
        }

        let bounds = self.config.min_name_chars..=self.config.max_name_chars;
        let names: Vec<String> = names.into_iter().take(wanted).collect();
        if let Some(bad) = names.iter().find(|n| !bounds.contains(&n.chars().count())) {
            return Err(CrewDigestError::Parse {
                message: format!("Failed to parse AI response: Invalid competitor name: {}", bad),
            });
        }
        Ok(names)
    }

    pub async fn discover(
        &self,
        backend: &dyn ChatBackend,
        focal_company: &str,
        category: &str,
    ) -> Result<Vec<String>> {
        let focal_company = focal_company.trim();
        let category = category.trim();
        if focal_company.is_empty() {
            return Err(CrewDigestError::Validation {
                message: "Please enter a focal company name".to_string(),
            });
        }
        if category.is_empty() {
            return Err(CrewDigestError::Validation {
                message: "Please enter an industry or category".to_string(),
            });
        }

        let request = self.build_request(focal_company, category);
        tracing::debug!(model = %request.model, "requesting competitor suggestions");
        let completion = backend.complete(&request).await?;
        let names = self.parse_competitors(&completion.content)?;
        tracing::info!("Competitors found: {}", names.join(", "));
        Ok(names)
    }
}

fn clean_name(line: &str) -> String {
    let name = LEADING_ORDINAL.replace(line, "");
    let name = name.trim().replace('*', "");
    LEADING_GLYPH.replace(name.trim(), "").trim().to_string()
}
